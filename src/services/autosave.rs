//! Autosave scheduler
//!
//! Debounces edit events into a single delayed save request. The state
//! machine is Idle -> Pending -> Idle: an edit while idle arms the
//! timer, an edit while pending re-arms it (debounce, not
//! accumulation), and the timer firing emits exactly one save request.
//! Closing a note cancels the timer; the session then performs one
//! final save itself.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

enum Signal {
    Edit,
    Cancel,
}

/// Debouncing autosave timer.
///
/// The receiver returned by [`AutosaveScheduler::new`] yields one unit
/// per elapsed debounce window; the owner persists the current note on
/// each. Dropping the scheduler stops the background task.
pub struct AutosaveScheduler {
    signals: mpsc::UnboundedSender<Signal>,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (signals, mut rx) = mpsc::unbounded_channel();
        let (save_tx, save_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut deadline: Option<Instant> = None;
            loop {
                tokio::select! {
                    signal = rx.recv() => match signal {
                        Some(Signal::Edit) => deadline = Some(Instant::now() + delay),
                        Some(Signal::Cancel) => deadline = None,
                        None => break,
                    },
                    _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                        deadline = None;
                        tracing::debug!("Autosave timer fired");
                        if save_tx.send(()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        (Self { signals }, save_rx)
    }

    /// Record an edit: arms the timer, or re-arms it if already pending.
    pub fn note_edited(&self) {
        let _ = self.signals.send(Signal::Edit);
    }

    /// Cancel a pending save without firing it.
    pub fn cancel(&self) {
        let _ = self.signals.send(Signal::Cancel);
    }
}
