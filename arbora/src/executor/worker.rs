//! Sequential worker with an observable output stream.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::MutexExecutor;

/// Buffered outputs a slow subscriber may lag behind by.
pub const OUTPUT_BUFFER: usize = 64;

/// Broadcast stream of worker outputs.
///
/// Subscribers only see outputs published after they subscribe; a
/// superseded submission publishes nothing.
pub struct OutputStream<O> {
    tx: broadcast::Sender<O>,
}

impl<O: Clone> OutputStream<O> {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(OUTPUT_BUFFER);
        OutputStream { tx }
    }

    /// Starts observing future outputs.
    pub fn subscribe(&self) -> broadcast::Receiver<O> {
        self.tx.subscribe()
    }

    /// Waits for the next published output. Returns `None` if the stream
    /// closes before one arrives.
    pub async fn next_value(&self) -> Option<O> {
        let mut rx = self.subscribe();
        rx.recv().await.ok()
    }

    fn publish(&self, output: O) {
        // Delivery is best-effort; with no subscribers the send fails and
        // the output is simply not observed.
        let _ = self.tx.send(output);
    }
}

impl<O> fmt::Debug for OutputStream<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStream").finish_non_exhaustive()
    }
}

/// Runs submissions one at a time, latest-wins, and publishes the outputs
/// of the submissions that were not superseded.
pub struct Worker<I, O> {
    executor: MutexExecutor,
    run: Arc<dyn Fn(I, CancellationToken) -> BoxFuture<'static, O> + Send + Sync>,
    output: OutputStream<O>,
}

impl<I, O> Worker<I, O>
where
    O: Clone,
{
    /// Creates a worker around the unit of work `run`.
    pub fn new(
        run: impl Fn(I, CancellationToken) -> BoxFuture<'static, O> + Send + Sync + 'static,
    ) -> Self {
        Worker {
            executor: MutexExecutor::new(),
            run: Arc::new(run),
            output: OutputStream::new(),
        }
    }

    /// The stream carrying outputs of completed, non-superseded
    /// submissions.
    pub fn output(&self) -> &OutputStream<O> {
        &self.output
    }

    /// Runs the unit of work for `input`, superseding any submission still
    /// in flight.
    ///
    /// Returns the output if this submission stayed current, `None` if a
    /// later submission took over. Only returned outputs are published to
    /// the stream.
    pub async fn submit(&self, input: I) -> Option<O> {
        let run = self.run.clone();
        let output = self.executor.run(move |token| run(input, token)).await;
        if let Some(value) = &output {
            self.output.publish(value.clone());
        }
        output
    }

    /// Cancels the submission currently in flight, if any.
    pub fn cancel(&self) {
        self.executor.cancel();
    }
}

impl<I, O> fmt::Debug for Worker<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker").finish_non_exhaustive()
    }
}
