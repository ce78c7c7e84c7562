//! WordFleet CLI entry point

use anyhow::{Context, Result};
use std::sync::Arc;
use wordfleet::config::{Cli, Config};
use wordfleet::orchestrator::Orchestrator;
use wordfleet::output;
use wordfleet::runtime::DockerRuntime;

fn main() -> Result<()> {
    use std::time::Instant;

    println!("WordFleet v{}", env!("CARGO_PKG_VERSION"));
    println!("Distributed word-count orchestrator");
    println!();

    // Parse CLI arguments
    let parse_start = Instant::now();
    let cli = Cli::parse_args();
    cli.validate()?;
    if cli.debug {
        eprintln!(
            "DEBUG TIMING: CLI parse: {:.3}s",
            parse_start.elapsed().as_secs_f64()
        );
    }

    // Build configuration from CLI
    let config = Config::from_cli(&cli);
    config
        .validate()
        .context("Configuration validation failed")?;

    // Display configuration
    print_configuration(&config);

    if cli.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    println!();
    println!("Starting run...");
    println!();

    let json_output = config.output.json_output.clone();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    let report = runtime.block_on(async {
        let docker =
            DockerRuntime::connect().context("Failed to connect to the Docker daemon")?;

        let orchestrator = Orchestrator::new(config, Arc::new(docker))
            .context("Failed to create orchestrator")?;

        orchestrator.run().await.map_err(anyhow::Error::from)
    })?;

    println!();
    output::text::print_report(&report);

    if let Some(ref path) = json_output {
        output::json::write_report(&report, path)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        println!();
        println!("JSON report written to {}", path.display());
    }

    if report.is_degraded() {
        eprintln!();
        eprintln!(
            "Warning: {} of {} input file(s) were skipped; counts are incomplete",
            report.failures.len(),
            report.items
        );
    }

    Ok(())
}

/// Print configuration summary
fn print_configuration(config: &Config) {
    println!("Configuration:");
    println!("  Workers:");
    println!("    Count: {}", config.workers.count);
    println!("  Provisioning:");
    println!("    Image: {}", config.provision.image);
    println!("    Base port: {}", config.provision.base_port);
    println!("    Container port: {}", config.provision.container_port);
    println!("    Ready timeout: {:?}", config.provision.ready_timeout());
    println!("  Dispatch:");
    println!("    Timeout: {:?}", config.dispatch.timeout());
    if config.runtime.fail_fast {
        println!("    Fail fast: enabled");
    }
    println!("  Inputs:");
    for input in &config.inputs {
        println!("    {}", input.display());
    }
}
