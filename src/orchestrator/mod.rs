//! Run orchestration
//!
//! The [`Orchestrator`] drives one run end to end: validate the
//! configuration, load the inputs, provision one worker per input, wait
//! for the fleet to accept connections, dispatch each file to its
//! worker and merge the counts. Teardown runs exactly once afterwards,
//! whatever the outcome, so no container outlives the run.
//!
//! A worker failure normally skips that one input and the run carries
//! on degraded; `fail_fast` turns the first failure into an abort.
//! Either way every container created so far is removed.

use crate::aggregate::CombinedResult;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::provision::{
    PortAllocator, Provisioner, TeardownReport, WorkerHandle, WorkerState,
};
use crate::runtime::ContainerRuntime;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One input file paired with the worker that will count it
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// Fleet position; item `i` goes to worker `i`
    pub index: usize,

    /// Path the text came from
    pub source: PathBuf,

    /// File contents sent to the worker
    pub content: String,
}

/// One input that could not be counted
#[derive(Debug)]
pub struct ItemFailure {
    /// Fleet position of the skipped input
    pub index: usize,

    /// Path of the skipped input
    pub source: PathBuf,

    /// What went wrong
    pub error: Error,
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunReport {
    /// Merged counts across every processed input
    pub combined: CombinedResult,

    /// Number of inputs in the run
    pub items: usize,

    /// Inputs whose counts made it into `combined`
    pub processed: usize,

    /// Inputs skipped after worker failures
    pub failures: Vec<ItemFailure>,

    /// Final state of every worker that was provisioned
    pub workers: Vec<WorkerHandle>,

    /// Outcome of the teardown pass
    pub teardown: TeardownReport,

    /// Wall time from provisioning through teardown
    pub duration: Duration,
}

impl RunReport {
    /// Whether any input had to be skipped
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// What execute() accumulated before teardown
struct Execution {
    combined: CombinedResult,
    processed: usize,
    failures: Vec<ItemFailure>,
}

/// Drives one complete word-count run
pub struct Orchestrator {
    config: Config,
    provisioner: Provisioner,
    dispatcher: Dispatcher,
}

impl Orchestrator {
    /// Build an orchestrator over the given container runtime
    pub fn new(config: Config, runtime: Arc<dyn ContainerRuntime>) -> Result<Self> {
        let provisioner = Provisioner::new(runtime, config.provision.clone());
        let dispatcher = Dispatcher::new(&config.dispatch)?;
        Ok(Self {
            config,
            provisioner,
            dispatcher,
        })
    }

    /// Build an orchestrator with a caller-supplied port allocator
    pub fn with_port_allocator(
        config: Config,
        runtime: Arc<dyn ContainerRuntime>,
        ports: Box<dyn PortAllocator>,
    ) -> Result<Self> {
        let provisioner =
            Provisioner::with_port_allocator(runtime, config.provision.clone(), ports);
        let dispatcher = Dispatcher::new(&config.dispatch)?;
        Ok(Self {
            config,
            provisioner,
            dispatcher,
        })
    }

    /// Drive one complete run
    ///
    /// Validation and input loading happen before any container is
    /// touched, so a bad configuration or an unreadable file fails the
    /// run while there is nothing to clean up. Once provisioning has
    /// begun, teardown runs no matter how the rest of the run goes and
    /// its outcome is folded into the report or, on a fatal error,
    /// printed as warnings.
    pub async fn run(mut self) -> Result<RunReport> {
        println!("Validating configuration...");
        self.config.validate()?;
        println!(
            "  ✅ {} worker(s) for {} input file(s)",
            self.config.workers.count,
            self.config.inputs.len()
        );
        println!();

        println!("Loading input files...");
        let items = load_work_items(&self.config.inputs)?;
        for item in &items {
            println!(
                "  ✅ {} ({} bytes)",
                item.source.display(),
                item.content.len()
            );
        }
        println!();

        let started = Instant::now();
        let mut handles = Vec::new();
        let outcome = self.execute(&items, &mut handles).await;

        // Containers never outlive the run, wherever it stopped.
        if !handles.is_empty() {
            println!();
            println!("Tearing down workers...");
        }
        let teardown = self.provisioner.teardown(&mut handles).await;
        if teardown.removed > 0 {
            println!("  ✅ removed {} container(s)", teardown.removed);
        }
        for failure in &teardown.failures {
            eprintln!(
                "Warning: failed to remove container {} ({}): {}",
                failure.name, failure.id, failure.error
            );
        }

        let duration = started.elapsed();
        if self.config.runtime.debug {
            eprintln!("DEBUG orchestrator: run finished in {duration:?}");
        }

        let execution = outcome?;

        Ok(RunReport {
            combined: execution.combined,
            items: items.len(),
            processed: execution.processed,
            failures: execution.failures,
            workers: handles,
            teardown,
            duration,
        })
    }

    /// Provision, wait for readiness, dispatch and merge
    ///
    /// Appends every created worker to `handles` so the caller can tear
    /// them down afterwards, on success and on error alike.
    async fn execute(
        &mut self,
        items: &[WorkItem],
        handles: &mut Vec<WorkerHandle>,
    ) -> Result<Execution> {
        println!("Ensuring image {} is available...", self.config.provision.image);
        self.provisioner.ensure_image().await?;
        println!("  ✅ image ready");
        println!();

        println!("Provisioning {} worker(s)...", items.len());
        self.provisioner.provision(items.len(), handles).await?;
        for handle in handles.iter() {
            println!("  ✅ {} on port {}", handle.name, handle.endpoint.port);
        }
        println!();

        let mut failures = Vec::new();

        println!("Waiting for workers to accept connections...");
        for handle in handles.iter_mut() {
            match self.provisioner.await_ready(handle).await {
                Ok(()) => println!("  ✅ {} ready", handle.name),
                Err(error) => {
                    eprintln!("Warning: {error}");
                    if self.config.runtime.fail_fast {
                        return Err(error.into());
                    }
                    let item = &items[handle.index];
                    failures.push(ItemFailure {
                        index: item.index,
                        source: item.source.clone(),
                        error: error.into(),
                    });
                }
            }
        }
        println!();

        println!("Dispatching {} input file(s)...", items.len());
        let mut combined = CombinedResult::new();
        let mut processed = 0;
        for handle in handles.iter() {
            // Workers that never became ready are already recorded above.
            if handle.state != WorkerState::Running {
                continue;
            }
            let item = &items[handle.index];
            match self
                .dispatcher
                .dispatch(&handle.endpoint, &item.content)
                .await
            {
                Ok(partial) => {
                    println!(
                        "  ✅ {}: {} word(s), {} unique",
                        item.source.display(),
                        partial.values().sum::<u64>(),
                        partial.len()
                    );
                    combined.merge(&partial);
                    processed += 1;
                }
                Err(error) => {
                    eprintln!("Warning: {error}");
                    if self.config.runtime.fail_fast {
                        return Err(error.into());
                    }
                    failures.push(ItemFailure {
                        index: item.index,
                        source: item.source.clone(),
                        error: error.into(),
                    });
                }
            }
        }

        Ok(Execution {
            combined,
            processed,
            failures,
        })
    }
}

/// Read every input file into memory
fn load_work_items(inputs: &[PathBuf]) -> Result<Vec<WorkItem>> {
    let mut items = Vec::with_capacity(inputs.len());
    for (index, path) in inputs.iter().enumerate() {
        let content = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.clone(),
            source,
        })?;
        items.push(WorkItem {
            index,
            source: path.clone(),
            content,
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DispatchConfig, OutputConfig, ProvisionConfig, RuntimeConfig, WorkerConfig,
    };
    use crate::error::{ConfigError, DispatchError, ProvisionError};
    use crate::runtime::MockRuntime;
    use crate::testutil::{ScriptedPorts, StubBehavior, StubWorker};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_input(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn config_for(files: &[&NamedTempFile]) -> Config {
        Config {
            inputs: files.iter().map(|f| f.path().to_path_buf()).collect(),
            workers: WorkerConfig { count: files.len() },
            provision: ProvisionConfig {
                ready_timeout_ms: 2_000,
                poll_interval_ms: 20,
                ..Default::default()
            },
            dispatch: DispatchConfig { timeout_ms: 2_000 },
            output: OutputConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }

    fn orchestrator_for(
        config: Config,
        runtime: &MockRuntime,
        ports: &[u16],
    ) -> Orchestrator {
        Orchestrator::with_port_allocator(
            config,
            Arc::new(runtime.clone()),
            ScriptedPorts::new(ports),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_run_counts_across_workers() {
        let first = StubWorker::spawn(StubBehavior::CountWords).await;
        let second = StubWorker::spawn(StubBehavior::CountWords).await;
        let file_a = write_input("a b a");
        let file_b = write_input("b c c");

        let runtime = MockRuntime::new();
        let orchestrator = orchestrator_for(
            config_for(&[&file_a, &file_b]),
            &runtime,
            &[first.port, second.port],
        );

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.combined.count("a"), 2);
        assert_eq!(report.combined.count("b"), 2);
        assert_eq!(report.combined.count("c"), 2);
        assert_eq!(report.combined.unique_words(), 3);
        assert_eq!(report.items, 2);
        assert_eq!(report.processed, 2);
        assert!(!report.is_degraded());

        // Worker i received file i.
        assert!(first.requests()[0].contains(r#""data":"a b a""#));
        assert!(second.requests()[0].contains(r#""data":"b c c""#));

        // Teardown removed the whole fleet.
        assert_eq!(report.teardown.removed, 2);
        assert!(report.teardown.is_clean());
        assert!(report.workers.iter().all(|w| w.state == WorkerState::Stopped));
        assert!(runtime.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_run_rejects_arity_mismatch_before_provisioning() {
        let file_a = write_input("a");
        let file_b = write_input("b");

        let mut config = config_for(&[&file_a, &file_b]);
        config.workers.count = 3;

        let runtime = MockRuntime::new();
        let orchestrator = orchestrator_for(config, &runtime, &[]);

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Config(ConfigError::ArityMismatch {
                workers: 3,
                files: 2
            })
        ));
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_fails_before_provisioning_when_input_is_unreadable() {
        let file_a = write_input("a");
        let mut config = config_for(&[&file_a]);
        config.inputs = vec![PathBuf::from("/nonexistent/input.txt")];

        let runtime = MockRuntime::new();
        let orchestrator = orchestrator_for(config, &runtime, &[]);

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(err, Error::FileRead { .. }));
        assert!(runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_skips_failed_input_and_continues() {
        let first = StubWorker::spawn(StubBehavior::CountWords).await;
        let second = StubWorker::spawn(StubBehavior::Status("500 Internal Server Error")).await;
        let third = StubWorker::spawn(StubBehavior::CountWords).await;
        let file_a = write_input("x");
        let file_b = write_input("y");
        let file_c = write_input("z x");

        let runtime = MockRuntime::new();
        let orchestrator = orchestrator_for(
            config_for(&[&file_a, &file_b, &file_c]),
            &runtime,
            &[first.port, second.port, third.port],
        );

        let report = orchestrator.run().await.unwrap();

        assert!(report.is_degraded());
        assert_eq!(report.processed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].source, file_b.path());

        // The skipped input contributed nothing.
        assert_eq!(report.combined.count("x"), 2);
        assert_eq!(report.combined.count("y"), 0);
        assert_eq!(report.combined.count("z"), 1);

        // All three containers still came down.
        assert_eq!(report.teardown.removed, 3);
        assert!(runtime.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_run_fail_fast_aborts_but_still_tears_down() {
        let first = StubWorker::spawn(StubBehavior::CountWords).await;
        let second = StubWorker::spawn(StubBehavior::Status("500 Internal Server Error")).await;
        let third = StubWorker::spawn(StubBehavior::CountWords).await;
        let file_a = write_input("x");
        let file_b = write_input("y");
        let file_c = write_input("z");

        let mut config = config_for(&[&file_a, &file_b, &file_c]);
        config.runtime.fail_fast = true;

        let runtime = MockRuntime::new();
        let orchestrator = orchestrator_for(
            config,
            &runtime,
            &[first.port, second.port, third.port],
        );

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Dispatch(DispatchError::Status { .. })
        ));
        // Third input was never dispatched.
        assert!(third.requests().is_empty());
        // The fleet still came down.
        assert_eq!(runtime.removed_ids().len(), 3);
        assert!(runtime.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_run_skips_worker_that_never_becomes_ready() {
        let first = StubWorker::spawn(StubBehavior::CountWords).await;
        // Bind then drop so nothing listens where the second worker should be.
        let dead_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let file_a = write_input("x");
        let file_b = write_input("y");

        let mut config = config_for(&[&file_a, &file_b]);
        config.provision.ready_timeout_ms = 200;

        let runtime = MockRuntime::new();
        let orchestrator = orchestrator_for(config, &runtime, &[first.port, dead_port]);

        let report = orchestrator.run().await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(matches!(
            report.failures[0].error,
            Error::Provision(ProvisionError::ReadyTimeout { worker: 1, .. })
        ));
        assert_eq!(report.combined.count("x"), 1);
        assert_eq!(report.combined.count("y"), 0);

        // Both containers still came down.
        assert_eq!(report.teardown.removed, 2);
        assert!(runtime.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_run_tears_down_after_provision_failure() {
        let file_a = write_input("x");
        let file_b = write_input("y");

        let runtime = MockRuntime::new();
        runtime.set_fail_after(1);
        let orchestrator =
            orchestrator_for(config_for(&[&file_a, &file_b]), &runtime, &[8000, 8001]);

        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Provision(ProvisionError::Container { .. })
        ));
        // The one container that was created still came down.
        assert_eq!(runtime.created_count(), 1);
        assert_eq!(runtime.removed_ids().len(), 1);
        assert!(runtime.active_ids().is_empty());
    }

    #[tokio::test]
    async fn test_run_reports_teardown_failures_without_failing_the_run() {
        let first = StubWorker::spawn(StubBehavior::CountWords).await;
        let file_a = write_input("x");

        let runtime = MockRuntime::new();
        runtime.set_fail_removals(true);
        let orchestrator = orchestrator_for(config_for(&[&file_a]), &runtime, &[first.port]);

        let report = orchestrator.run().await.unwrap();

        // Counting finished even though cleanup did not.
        assert_eq!(report.combined.count("x"), 1);
        assert!(!report.teardown.is_clean());
        assert_eq!(report.teardown.failures.len(), 1);
        assert_eq!(report.teardown.removed, 0);
        assert_eq!(runtime.active_ids().len(), 1);
    }

    #[test]
    fn test_load_work_items_pairs_index_with_path() {
        let file_a = write_input("alpha");
        let file_b = write_input("beta");
        let inputs = vec![file_a.path().to_path_buf(), file_b.path().to_path_buf()];

        let items = load_work_items(&inputs).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].content, "alpha");
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].content, "beta");
    }
}
