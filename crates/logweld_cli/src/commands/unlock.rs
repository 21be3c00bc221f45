//! Unlock command implementation.

use logweld_core::{sentinel, validate_log_dir, CombineConfig};
use tracing::info;

/// Runs the unlock command.
///
/// Removing an absent sentinel is not an error.
pub fn run(config: &CombineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let layout = config.layout();
    let live_dir = layout.live_dir();
    validate_log_dir(&live_dir, &layout.live_dir_name())?;

    if layout.working_dir().exists() {
        info!(
            path = %layout.working_dir().display(),
            "working folder still exists, remove it before the next combine run"
        );
    }

    sentinel::release(&live_dir)?;
    println!("✓ Sentinel cleared for {:?}", live_dir);
    Ok(())
}
