// src/agent/stop.rs

//! Cooperative stop signalling.
//!
//! A [`StopSignal`] is held by the agent loop and awaited alongside the
//! publish timer. Any number of [`StopHandle`]s can trigger it: the embedder
//! keeps one, the stdin watcher gets another. Stopping is sticky; once set it
//! stays set.

use std::io::BufRead;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::watch;

use crate::macros::{log_debug, log_warn};

/// Triggers a [`StopSignal`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Ask the agent to stop at its next wait.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether any handle has asked for a stop yet.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// The receiving side, owned by the agent loop.
#[derive(Debug)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
    tx: Arc<watch::Sender<bool>>,
}

/// Create a connected handle/signal pair.
pub fn stop_signal() -> (StopHandle, StopSignal) {
    // ---
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);

    let handle = StopHandle {
        tx: Arc::clone(&tx),
    };
    (handle, StopSignal { rx, tx })
}

impl StopSignal {
    // ---

    /// Another handle for the same signal.
    pub fn handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.tx),
        }
    }

    /// Whether a stop has been requested, without waiting for one.
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop has been requested.
    ///
    /// Returns immediately if it already has been.
    pub async fn stopped(&mut self) {
        // The signal owns a sender, so the channel cannot close underneath us.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Stop the agent when the user presses enter.
///
/// Reads one line from `input` (stdin in the binary) on a dedicated OS
/// thread: a blocking read cannot be cancelled, and parking it on the
/// runtime's blocking pool would hold up runtime shutdown. The agent drops
/// the returned handle, leaving the thread detached.
///
/// End of input is not a keypress; on EOF the watcher just exits.
pub fn spawn_keypress_watcher(
    handle: StopHandle,
    mut input: impl BufRead + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // ---
    thread::Builder::new()
        .name("keypress-watcher".to_string())
        .spawn(move || {
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    log_debug!("keypress input closed; keypress stop disabled");
                }
                Ok(_) => {
                    log_debug!("keypress received; stopping");
                    handle.stop();
                }
                Err(_err) => {
                    log_warn!("keypress input read failed: {_err}");
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stop_wakes_waiter() {
        let (handle, mut signal) = stop_signal();

        let waiter = tokio::spawn(async move {
            signal.stopped().await;
            signal.is_stopped()
        });

        handle.stop();

        let stopped = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter timed out")
            .expect("waiter panicked");
        assert!(stopped);
    }

    #[tokio::test]
    async fn stop_before_wait_returns_immediately() {
        let (handle, mut signal) = stop_signal();
        handle.stop();

        tokio::time::timeout(Duration::from_millis(10), signal.stopped())
            .await
            .expect("already-stopped signal should not block");
    }

    #[test]
    fn line_on_input_stops() {
        let (handle, signal) = stop_signal();

        let watcher = spawn_keypress_watcher(handle, b"\n".as_slice()).unwrap();
        watcher.join().expect("watcher panicked");

        assert!(signal.is_stopped());
    }

    #[test]
    fn end_of_input_does_not_stop() {
        let (handle, signal) = stop_signal();

        let watcher = spawn_keypress_watcher(handle, io::empty()).unwrap();
        watcher.join().expect("watcher panicked");

        assert!(!signal.is_stopped());
    }

    #[test]
    fn handles_share_state() {
        let (first, signal) = stop_signal();
        let second = signal.handle();

        assert!(!first.is_stopped());
        second.stop();
        assert!(first.is_stopped());
        assert!(signal.is_stopped());
    }
}
