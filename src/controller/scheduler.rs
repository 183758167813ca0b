use super::trigger::TriggerController;
use super::types::TriggerSource;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

/// Fires timer triggers at a fixed period.
///
/// A tick that arrives while any trigger is in flight is dropped, not queued,
/// and ticks missed during a long trigger are skipped.
pub struct Scheduler {
    controller: Arc<TriggerController>,
    period: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(controller: Arc<TriggerController>, period: Duration, run_on_start: bool) -> Self {
        Self {
            controller,
            period,
            run_on_start,
        }
    }

    /// Runs until `shutdown` turns true or its sender is dropped. A trigger in
    /// progress is allowed to finish first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = if self.run_on_start {
            interval(self.period)
        } else {
            interval_at(Instant::now() + self.period, self.period)
        };
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Scheduler started: every {:?}", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.controller.try_run(TriggerSource::Timer).await.is_none() {
                        info!("Timer tick skipped: a trigger is already in flight");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("Scheduler stopped");
    }
}
