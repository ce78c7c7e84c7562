//! Human-readable text output

use crate::orchestrator::RunReport;

/// Print run results to console
///
/// Displays the merged word counts in alphabetical order, which inputs
/// were processed or skipped, and how teardown went.
pub fn print_report(report: &RunReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                   WORD COUNT RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    println!("Elapsed Time: {:.3}s", report.duration.as_secs_f64());
    println!();

    println!("Inputs:");
    println!("  Files:     {}", report.items);
    println!("  Processed: {}", report.processed);
    if report.is_degraded() {
        println!("  Skipped:   {}", report.failures.len());
    }
    println!();

    if report.combined.is_empty() {
        println!("Counts:");
        println!("  No words counted");
    } else {
        println!(
            "Counts ({} unique, {} total):",
            format_number(report.combined.unique_words() as u64),
            format_number(report.combined.total_words())
        );
        for (word, count) in report.combined.sorted() {
            println!("  {:<32} {:>12}", word, format_number(count));
        }
    }
    println!();

    if report.is_degraded() {
        println!("Skipped inputs:");
        for failure in &report.failures {
            println!(
                "  [{}] {}: {}",
                failure.index,
                failure.source.display(),
                failure.error
            );
        }
        println!();
    }

    println!("Teardown:");
    println!("  Removed: {} container(s)", report.teardown.removed);
    if !report.teardown.is_clean() {
        for failure in &report.teardown.failures {
            println!(
                "  Still up: {} ({}): {}",
                failure.name, failure.id, failure.error
            );
        }
    }

    println!("═══════════════════════════════════════════════════════════");
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }

    result.chars().rev().collect()
}
