pub mod tasks;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::error::{CycleError, Severity};
use crate::poller::CycleReport;

/// One unit of scheduled work
#[async_trait]
pub trait Cycle: Send {
    async fn run(&mut self) -> Result<CycleReport, CycleError>;
}

/// Fixed-interval loop around a [`Cycle`].
///
/// After a successful cycle, or an error that needs the user to act, it waits
/// `poll_interval`; after a recoverable error it waits `retry_delay`. Only
/// `shutdown` ends the loop.
pub struct Scheduler {
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves.
    ///
    /// `shutdown` is honoured both during a cycle and while sleeping.
    pub async fn run<C, F>(&self, cycle: &mut C, shutdown: F)
    where
        C: Cycle + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            info!(
                "[{}] Running scheduled check...",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );

            let outcome = tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopped by user");
                    return;
                }
                outcome = cycle.run() => outcome,
            };

            let delay = match outcome {
                Ok(_) => self.config.poll_interval,
                Err(e) => match e.severity() {
                    Severity::Recoverable => {
                        error!("Error in scheduler: {}", e);
                        self.config.retry_delay
                    }
                    Severity::Persistent => {
                        error!("{}; will check again at the next scheduled run", e);
                        self.config.poll_interval
                    }
                },
            };

            info!("Sleeping for {}...", describe(delay));
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopped by user");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// "1 hour", "10 minutes", "45 seconds"
fn describe(d: Duration) -> String {
    let secs = d.as_secs();
    let (n, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
