use std::path::PathBuf;
use std::time::Duration;

use dealhound_agents::Planner;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::plan_and_remember;

/// Repeats planning cycles on a fixed interval until cancelled.
pub struct Watcher {
    planner: Planner,
    memory_path: PathBuf,
    interval: Duration,
    cancel: CancellationToken,
}

impl Watcher {
    pub fn new(planner: Planner, memory_path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            planner,
            memory_path: memory_path.into(),
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns a CancellationToken that can be used to trigger shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled. Returns the number of completed cycles.
    /// A failed cycle is logged and the next one runs on schedule.
    pub async fn run(&self) -> u64 {
        info!(interval_secs = self.interval.as_secs(), "Deal watcher starting");
        let mut cycles = 0u64;

        loop {
            // Run immediately on startup
            match plan_and_remember(&self.planner, &self.memory_path).await {
                Ok(report) => {
                    cycles += 1;
                    info!(
                        cycle = %report.cycle_id,
                        priced = report.priced,
                        alerted = report.alerted.is_some(),
                        "Watch cycle finished"
                    );
                }
                Err(e) => error!(error = %e, "Watch cycle failed"),
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Deal watcher shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(cycles, "Deal watcher stopped");
        cycles
    }
}
