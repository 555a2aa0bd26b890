use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{Error, Result};

use super::job::Delivery;

/// The presentation-context end of a [`JobRunner`](super::JobRunner).
///
/// Finished jobs are queued here by the worker. Their callbacks only run when
/// the owner of the presenter asks for them, on the owner's thread.
pub struct Presenter {
    outbox: Receiver<Delivery>,
}

impl Presenter {
    pub(crate) fn new(outbox: Receiver<Delivery>) -> Self {
        Self { outbox }
    }

    /// Run the callbacks of every job that has already finished. Never blocks.
    ///
    /// Returns the number of callbacks run.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        loop {
            match self.outbox.try_recv() {
                Ok(delivery) => {
                    delivery.run();
                    delivered += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return delivered,
            }
        }
    }

    /// Block until the next job finishes, then run its callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the runner has shut down and
    /// nothing is left to deliver.
    pub fn wait(&self) -> Result<()> {
        let delivery = self.outbox.recv().map_err(|_| Error::WorkerUnavailable)?;
        delivery.run();
        Ok(())
    }

    /// Like [`wait`](Self::wait), but gives up after `timeout`.
    ///
    /// Returns `false` if nothing finished in time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the runner has shut down and
    /// nothing is left to deliver.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        match self.outbox.recv_timeout(timeout) {
            Ok(delivery) => {
                delivery.run();
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerUnavailable),
        }
    }
}
