//! Combine command implementation.

use logweld_core::{
    combine_commit_logs, CombineConfig, ConcatCompactorFactory, RunReport, RunStatus,
};

/// Runs the combine-commit-logs command.
pub fn run(config: &CombineConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = combine_commit_logs(config, &ConcatCompactorFactory)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Commit log: {:?}", report.live_dir);
    match report.status {
        RunStatus::NothingToDo => {
            println!("No commit logs eligible for combining");
            return;
        }
        RunStatus::DryRun => {
            println!("(dry run - no changes were made)");
        }
        RunStatus::Combined => {}
    }
    println!();

    println!("Selected segments: {}", report.selection.len());
    if report.selection.skipped > 0 {
        println!(
            "  Skipped:         {} (over the per-run limit)",
            report.selection.skipped
        );
    }
    let files = &report.selection.files;
    if let (Some(first), Some(last)) = (files.first(), files.last()) {
        println!("  Range:           {} .. {}", first, last);
    }

    if report.status == RunStatus::DryRun {
        return;
    }

    println!("  Bytes staged:    {}", report.bytes_staged);
    println!(
        "  Compactor:       {} combined, {} condensed in {} cycles",
        report.driver.combined, report.driver.condensed, report.driver.cycles
    );
    println!("  Written back:    {} segments", report.written.len());
    if let Some(backup) = &report.backup_dir {
        println!("  Backup:          {:?}", backup);
    }
    println!();
    println!("✓ Combine complete");
}
