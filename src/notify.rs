//! Notification surface for deposit outcomes.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, kind: NotificationKind, message: &str) {
        (**self).notify(kind, message)
    }
}

/// Emits notifications as log events; used by the command line front end.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success => info!(target: "presale::notify", "{message}"),
            NotificationKind::Warning => warn!(target: "presale::notify", "{message}"),
            NotificationKind::Error => error!(target: "presale::notify", "{message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub kind: NotificationKind,
    pub message: String,
}

/// Bounded queue of pending toasts, drained by the GUI.
#[derive(Clone, Debug)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Toast>>>,
    capacity: usize,
}

impl ToastQueue {
    pub const DEFAULT_CAPACITY: usize = 5;

    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.inner.lock().iter().cloned().collect()
    }

    pub fn dismiss_oldest(&self) -> Option<Toast> {
        self.inner.lock().pop_front()
    }

    pub fn dismiss(&self, index: usize) -> Option<Toast> {
        self.inner.lock().remove(index)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let mut queue = self.inner.lock();
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(Toast {
            kind,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_queue_drops_oldest_beyond_capacity() {
        let queue = ToastQueue::new(2);
        queue.notify(NotificationKind::Success, "first");
        queue.notify(NotificationKind::Error, "second");
        queue.notify(NotificationKind::Warning, "third");

        let toasts = queue.snapshot();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].message, "second");
        assert_eq!(toasts[1].kind, NotificationKind::Warning);

        assert_eq!(queue.dismiss_oldest().map(|toast| toast.message), Some("second".into()));
        assert_eq!(queue.len(), 1);
        assert!(queue.dismiss(3).is_none());
        queue.clear();
        assert!(queue.is_empty());
    }
}
