//! Sync command implementation.

use crate::app::App;
use habitsync_engine::RefreshOutcome;

/// Runs the sync command: one remote refresh into the local store.
pub async fn run(app: &App) -> Result<RefreshOutcome, Box<dyn std::error::Error>> {
    Ok(app.service.engine().refresh_from_remote().await?)
}

/// Prints the outcome of a refresh.
pub fn print(outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Merged { merged, skipped: 0 } => {
            println!("Synced {merged} habit(s) from the remote.");
        }
        RefreshOutcome::Merged { merged, skipped } => {
            println!("Synced {merged} habit(s) from the remote, skipped {skipped} unreadable.");
        }
        RefreshOutcome::RemoteUnavailable => {
            println!("Remote unavailable; local habits are unchanged.");
        }
    }
}
