use std::io;
#[cfg(test)]
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
#[cfg(test)]
use std::time::Duration;
use tracing::debug;

/// Runs blocking jobs on worker threads and hands their results back to the
/// owning (UI) thread, which drains them with [`TaskChannel::try_recv`].
#[derive(Debug)]
pub struct TaskChannel<M> {
    sender: Sender<M>,
    receiver: Receiver<M>,
}

impl<M: Send + 'static> Default for TaskChannel<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> TaskChannel<M> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        TaskChannel { sender, receiver }
    }

    /// Spawns `job` on a named thread; its return value is queued for the owner.
    pub fn spawn<F>(&self, name: &str, job: F) -> io::Result<()>
    where
        F: FnOnce() -> M + Send + 'static,
    {
        let sender = self.sender.clone();
        let thread_name = name.to_string();
        thread::Builder::new().name(thread_name).spawn(move || {
            let msg = job();
            // The owner may already be gone; nothing left to deliver to.
            let _ = sender.send(msg);
        })?;
        debug!("spawned worker {}", name);
        Ok(())
    }

    pub fn try_recv(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Blocks for at most `timeout` waiting for the next result.
    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<M> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
