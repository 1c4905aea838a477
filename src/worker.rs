//! Runs one operation on a background thread.
//!
//! The controlling thread gets the operation's progress events over a
//! channel and collects the result when the worker is done. Only one
//! operation is expected to run at a time; there is no queue and no
//! cancellation.

use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::progress::{ProgressEvent, Reporter};

/// Worker errors
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Failed to start {name} worker: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} worker panicked: {message}")]
    Panicked { name: String, message: String },
}

/// A running operation.
pub struct Operation<T> {
    name: String,
    events: Receiver<ProgressEvent>,
    handle: JoinHandle<T>,
}

/// Start `op` on a named background thread.
///
/// `op` receives a [`Reporter`] whose events are forwarded to the returned
/// [`Operation`].
pub fn spawn<T, F>(name: &str, op: F) -> Result<Operation<T>, WorkerError>
where
    F: FnOnce(Reporter) -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    let reporter = Reporter::new(Arc::new(move |event| {
        if let Ok(tx) = tx.lock() {
            // Receiver gone means nobody is watching any more
            let _ = tx.send(event);
        }
    }));

    let handle = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || op(reporter))
        .map_err(|source| WorkerError::Spawn {
            name: name.to_string(),
            source,
        })?;

    tracing::debug!("Started {} worker", name);

    Ok(Operation {
        name: name.to_string(),
        events: rx,
        handle,
    })
}

impl<T> Operation<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Blocking iterator over events. Ends once the worker has finished and
    /// dropped its reporter.
    pub fn events(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.events.iter()
    }

    /// Events that have already arrived, without blocking.
    pub fn pending_events(&self) -> impl Iterator<Item = ProgressEvent> + '_ {
        self.events.try_iter()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and return what the operation returned.
    pub fn wait(self) -> Result<T, WorkerError> {
        self.handle.join().map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            WorkerError::Panicked {
                name: self.name,
                message,
            }
        })
    }
}
