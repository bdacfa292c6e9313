//! Periodic tickers.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A repeating task that posts a message every `period`.
///
/// The first message arrives one full period after spawning. Dropping
/// the handle aborts the task, so a ticker never outlives its owner.
#[derive(Debug)]
pub struct PeriodicTask {
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn on the current runtime.
    ///
    /// The task ends by itself once the receiving side is gone.
    pub fn spawn<T, F>(period: Duration, sender: mpsc::Sender<T>, mut message: F) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;
                if sender.send(message()).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Has the task ended?
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
