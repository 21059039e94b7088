//! The notification list shared by every UI component.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::id::{IdGenerator, RandomIds};
use crate::observable::{Observable, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: String,
    message: String,
    read: bool,
}

impl Notification {
    fn unread(id: String, message: String) -> Self {
        Self { id, message, read: false }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_read(&self) -> bool {
        self.read
    }
}

/// Ordered, observable list of notifications. Newest entries go last.
///
/// Every mutation publishes a fresh `Vec`; snapshots handed out earlier stay
/// frozen. Cloning the store shares the same underlying list.
#[derive(Clone)]
pub struct NotificationStore {
    list: Observable<Vec<Notification>>,
    ids: Arc<dyn IdGenerator>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::with_ids(Box::new(RandomIds))
    }

    pub fn with_ids(ids: Box<dyn IdGenerator>) -> Self {
        Self { list: Observable::new(Vec::new()), ids: Arc::from(ids) }
    }

    /// Append an unread notification. Any string is accepted, empty included.
    pub fn add_notification(&self, message: impl Into<String>) {
        let message = message.into();
        self.list.update(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Notification::unread(self.ids.next_id(), message));
            debug!(len = next.len(), unread = count_unread(&next), "notification added");
            next
        });
    }

    pub fn mark_all_read(&self) {
        self.list.update(|current| {
            let next: Vec<Notification> = current
                .iter()
                .map(|n| Notification { read: true, ..n.clone() })
                .collect();
            debug!(len = next.len(), unread = count_unread(&next), "all notifications marked read");
            next
        });
    }

    pub fn unread_count(&self) -> usize {
        count_unread(&self.list.get())
    }

    pub fn snapshot(&self) -> Arc<Vec<Notification>> {
        self.list.get()
    }

    pub fn len(&self) -> usize {
        self.list.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.get().is_empty()
    }

    /// Listen for changes. The listener gets the current list right away.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<Vec<Notification>>) + Send + Sync + 'static,
    {
        self.list.subscribe(listener)
    }
}

fn count_unread(list: &[Notification]) -> usize {
    list.iter().filter(|n| !n.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;

    fn store() -> NotificationStore {
        NotificationStore::with_ids(Box::new(SequentialIds::new()))
    }

    #[test]
    fn empty_store_has_no_unread() {
        let s = store();
        assert_eq!(s.unread_count(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn added_notification_starts_unread() {
        let s = store();
        s.add_notification("hello");
        let list = s.snapshot();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message(), "hello");
        assert_eq!(list[0].id(), "n-1");
        assert!(!list[0].is_read());
        assert_eq!(s.unread_count(), 1);
    }

    #[test]
    fn empty_message_is_accepted() {
        let s = store();
        s.add_notification("");
        assert_eq!(s.len(), 1);
        assert_eq!(s.snapshot()[0].message(), "");
    }

    #[test]
    fn mark_all_read_keeps_ids_messages_and_order() {
        let s = store();
        s.add_notification("a");
        s.add_notification("b");
        let before = s.snapshot();
        s.mark_all_read();
        let after = s.snapshot();
        assert_eq!(after.len(), 2);
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.id(), a.id());
            assert_eq!(b.message(), a.message());
            assert!(a.is_read());
        }
        assert!(before.iter().all(|n| !n.is_read()));
        assert_eq!(s.unread_count(), 0);
    }

    #[test]
    fn mark_all_read_is_idempotent() {
        let s = store();
        s.add_notification("x");
        s.mark_all_read();
        let once = s.snapshot();
        s.mark_all_read();
        assert_eq!(*once, *s.snapshot());
    }

    #[test]
    fn mark_all_read_on_empty_list_notifies_with_empty_list() {
        let s = store();
        let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let _sub = s.subscribe(move |list| sink.lock().push(list.len()));
        s.mark_all_read();
        assert_eq!(*calls.lock(), vec![0, 0]);
    }

    #[test]
    fn clones_share_one_list() {
        let s = store();
        let other = s.clone();
        other.add_notification("shared");
        assert_eq!(s.unread_count(), 1);
    }
}
