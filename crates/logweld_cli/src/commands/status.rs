//! Status command implementation.

use logweld_core::{inspect, CombineConfig, LogStatus};

/// Runs the status command.
pub fn run(config: &CombineConfig, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let status = inspect(config)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => print_status(&status),
    }

    Ok(())
}

fn print_status(status: &LogStatus) {
    println!("Commit log: {:?}", status.live_dir);
    println!();
    println!("  Segments:        {}", status.segments);
    println!("  Eligible:        {}", status.eligible);
    println!(
        "  Sentinel:        {}",
        if status.sentinel_present { "present" } else { "absent" }
    );
    println!(
        "  Working folder:  {}",
        if status.working_dir_present { "present" } else { "absent" }
    );
    println!("  Backups:         {}", status.backups.len());
    for backup in &status.backups {
        println!("    {:?}", backup);
    }

    if status.needs_recovery() {
        println!();
        println!("✗ A previous run did not finish; restore from the latest backup before unlocking");
    }
}
