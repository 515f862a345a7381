use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use crossbeam_channel::{Receiver, Sender};

use crate::error::DumpError;

/// Cooperative cancellation shared between the signal handler and the capture loop.
///
/// Cancelling drops the only sender of an internal channel, so every clone of
/// [`CancelToken::done`] becomes ready at once and can sit in a `select!`
/// next to the packet channel.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Mutex::new(Some(tx))),
            done: rx,
        }
    }

    /// Requests cancellation. Safe to call any number of times from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        match self.trigger.lock() {
            Ok(mut guard) => drop(guard.take()),
            Err(poisoned) => drop(poisoned.into_inner().take()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Disconnected once cancellation has been requested.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels `token` on SIGINT, SIGTERM or SIGHUP.
///
/// SIGPIPE never reaches us: the Rust runtime ignores it, so a closed stdout
/// shows up as a `BrokenPipe` write error that the capture loop handles.
pub fn setup_ctrlc_handler(token: CancelToken) -> Result<(), DumpError> {
    ctrlc::set_handler(move || {
        token.cancel();
    })?;
    Ok(())
}
