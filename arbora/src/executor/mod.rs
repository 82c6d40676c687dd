//! Latest-wins execution: a single logical slot where each new task
//! supersedes the previous one.
//!
//! Superseding is cooperative. The previous task's [`CancellationToken`] is
//! cancelled so it can stop early, but nothing forces it to; a task that
//! ignores its token simply runs to completion and has its output
//! discarded. Whatever a superseded task produces, including an error, is
//! swallowed: only the task that is still current when it finishes gets its
//! output reported.

mod worker;

pub use worker::{OutputStream, Worker, OUTPUT_BUFFER};

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug, Default)]
struct Slot {
    /// Bumped for every new task and every explicit cancel; a finishing
    /// task reports its output only if its sequence number is still
    /// current.
    seq: u64,
    token: Option<CancellationToken>,
}

/// Single-slot latest-wins task runner.
#[derive(Debug, Default)]
pub struct MutexExecutor {
    slot: Mutex<Slot>,
}

impl MutexExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task`, superseding whatever task is currently in the slot.
    ///
    /// The closure receives a token that fires if a later task supersedes
    /// this one. Returns `Some(output)` if the task was still current when
    /// it finished, `None` if it was superseded or cancelled in the
    /// meantime.
    pub async fn run<T, F, Fut>(&self, task: F) -> Option<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let (seq, token) = self.begin();
        let output = task(token).await;
        self.finish(seq, output)
    }

    /// Cancels the current task, if any, without starting a new one.
    pub fn cancel(&self) {
        let mut slot = self.slot.lock().unwrap();
        if let Some(token) = slot.token.take() {
            token.cancel();
        }
        slot.seq = slot.seq.wrapping_add(1);
        trace!(seq = slot.seq, "slot cancelled");
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let mut slot = self.slot.lock().unwrap();
        if let Some(previous) = slot.token.take() {
            previous.cancel();
        }
        slot.seq = slot.seq.wrapping_add(1);
        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        trace!(seq = slot.seq, "task took the slot");
        (slot.seq, token)
    }

    fn finish<T>(&self, seq: u64, output: T) -> Option<T> {
        let mut slot = self.slot.lock().unwrap();
        if slot.seq == seq {
            slot.token = None;
            Some(output)
        } else {
            trace!(seq, current = slot.seq, "superseded task finished");
            None
        }
    }
}
