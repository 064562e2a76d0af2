//! The per-round countdown.
//!
//! A [`Countdown`] owns a spawned tokio task that emits one tick per period.
//! Cancelling (or dropping) the countdown aborts the task, so a stale tick
//! from a previous round can never be observed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Tick period used by the interactive loop.
pub const TICK: Duration = Duration::from_secs(1);

/// A cancellable ticking task bound to one round.
#[derive(Debug)]
pub struct Countdown {
    round: u64,
    ticks: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Start ticking for `round`. The first tick arrives one `period` after
    /// the call.
    pub fn start(round: u64, period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });
        Self {
            round,
            ticks,
            handle,
        }
    }

    /// The round this countdown belongs to.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Wait for the next tick. Returns `None` once the countdown is cancelled.
    pub async fn tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    pub fn cancel(&mut self) {
        self.handle.abort();
        self.ticks.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
