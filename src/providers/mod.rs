//! Per-provider adapters over the vendor SDK capability traits.
//!
//! Each vendor API is callback based. An adapter bridges it into an `async`
//! operation through a one-shot settlement: several callbacks may be wired to
//! the same pending operation (success, error, a "prompt not shown" moment)
//! and only the first one to fire settles it.

pub mod apple;
pub mod facebook;
pub mod google;

use std::sync::{Arc, Mutex};

use futures::channel::oneshot;

use crate::error::SocialLoginError;
use crate::types::Provider;

/// One-shot completion signal shared between vendor callbacks.
pub(crate) struct Settlement<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Settlement<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> Settlement<T> {
    /// Applies the first settlement; every later call is ignored.
    pub(crate) fn settle(&self, value: T) {
        if let Some(tx) = self.sender.lock().unwrap().take() {
            let _ = tx.send(value);
        }
    }
}

pub(crate) fn pending_settlement<T>() -> (Settlement<T>, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Settlement {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        rx,
    )
}

/// A vendor SDK dropped its callback without ever invoking it. A vendor that
/// simply never calls back leaves the operation pending instead; there is no
/// timeout here.
pub(crate) fn callback_dropped(provider: Provider) -> SocialLoginError {
    SocialLoginError::LoginFailed {
        provider,
        message: "vendor SDK dropped its callback without responding".into(),
    }
}
