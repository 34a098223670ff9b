use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::sync::{Mutex, Notify, RwLock};
use uuid::Uuid;

/// Identifier of one message log: an unordered user pair or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationKey {
    Direct(Uuid, Uuid),
    Group(Uuid),
}

impl ConversationKey {
    /// Direct key, normalized so (A,B) and (B,A) address the same log.
    pub fn direct(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            ConversationKey::Direct(a, b)
        } else {
            ConversationKey::Direct(b, a)
        }
    }

    pub fn group(id: Uuid) -> Self {
        ConversationKey::Group(id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Per-conversation cursor, 1-based. Clients pass the highest seq
    /// they have seen when long-polling.
    pub seq: u64,
}

struct Log {
    messages: Vec<Message>,
    notify: Arc<Notify>,
}

impl Log {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            notify: Arc::new(Notify::new()),
        }
    }
}

/// Append-only message logs. The outer lock only guards log lookup and
/// creation; each log's own mutex serializes appends to that key, which
/// is what keeps timestamps monotonic and readers on whole snapshots.
/// Logs materialize on first append only; readers and pollers of a key
/// nothing was ever sent to leave no entry behind.
#[derive(Default)]
pub struct ConversationStore {
    logs: RwLock<HashMap<ConversationKey, Arc<Mutex<Log>>>>,
    /// Signalled whenever a new log is created, so pollers parked on a
    /// not-yet-existing key can pick up its per-log notifier.
    created: Notify,
}

impl ConversationStore {
    async fn log_for_append(&self, key: ConversationKey) -> Arc<Mutex<Log>> {
        if let Some(log) = self.logs.read().await.get(&key) {
            return log.clone();
        }
        let mut logs = self.logs.write().await;
        if let Some(log) = logs.get(&key) {
            return log.clone();
        }
        let log = Arc::new(Mutex::new(Log::new()));
        logs.insert(key, log.clone());
        self.created.notify_waiters();
        log
    }

    async fn existing_log(&self, key: ConversationKey) -> Option<Arc<Mutex<Log>>> {
        self.logs.read().await.get(&key).cloned()
    }

    /// Appends a message, assigning a timestamp strictly greater than the
    /// previous message's for this key. Simultaneous sends that land on
    /// the same clock reading get bumped by a microsecond, in arrival
    /// order under the log lock.
    pub async fn append(&self, key: ConversationKey, sender_id: Uuid, content: &str) -> Message {
        let entry = self.log_for_append(key).await;
        let mut log = entry.lock().await;

        let now = OffsetDateTime::now_utc();
        let timestamp = match log.messages.last() {
            Some(prev) if now <= prev.timestamp => prev.timestamp + TimeDuration::microseconds(1),
            _ => now,
        };
        let message = Message {
            id: Uuid::new_v4(),
            sender_id,
            content: content.to_string(),
            timestamp,
            seq: log.messages.len() as u64 + 1,
        };
        log.messages.push(message.clone());
        log.notify.notify_waiters();
        message
    }

    /// Full history for the key, oldest first. A key with no log yet
    /// reads as an empty conversation.
    pub async fn list(&self, key: ConversationKey) -> Vec<Message> {
        match self.logs.read().await.get(&key) {
            Some(entry) => entry.lock().await.messages.clone(),
            None => Vec::new(),
        }
    }

    /// Messages with `seq > after_seq`, waiting up to `timeout` for one
    /// to arrive. Returns an empty batch on timeout.
    pub async fn wait_beyond(
        &self,
        key: ConversationKey,
        after_seq: u64,
        timeout: Duration,
    ) -> Vec<Message> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let Some(entry) = self.existing_log(key).await else {
                // No log yet for this key. Park on the store-level
                // notifier rather than materializing an entry; a wake
                // for an unrelated key just loops and re-checks.
                let notified = self.created.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.logs.read().await.contains_key(&key) {
                    continue;
                }
                if tokio::time::timeout_at(deadline, notified).await.is_err() {
                    return Vec::new();
                }
                continue;
            };

            let notify = {
                let log = entry.lock().await;
                if log.messages.len() as u64 > after_seq {
                    return log
                        .messages
                        .iter()
                        .filter(|m| m.seq > after_seq)
                        .cloned()
                        .collect();
                }
                log.notify.clone()
            };

            // Register interest before re-checking, so an append between
            // the check above and the await cannot be missed.
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let log = entry.lock().await;
                if log.messages.len() as u64 > after_seq {
                    return log
                        .messages
                        .iter()
                        .filter(|m| m.seq > after_seq)
                        .cloned()
                        .collect();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Vec::new();
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn log_count(&self) -> usize {
        self.logs.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_are_ordered_and_reads_are_stable() {
        let store = ConversationStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let key = ConversationKey::direct(a, b);

        for i in 0..5 {
            store.append(key, a, &format!("msg {i}")).await;
        }

        let first = store.list(key).await;
        assert_eq!(first.len(), 5);
        for pair in first.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
            assert!(pair[0].seq < pair[1].seq);
        }
        let second = store.list(key).await;
        assert_eq!(
            first.iter().map(|m| m.id).collect::<Vec<_>>(),
            second.iter().map(|m| m.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn direct_key_is_direction_agnostic() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(ConversationKey::direct(a, b), ConversationKey::direct(b, a));
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        use std::sync::Arc;
        let store = Arc::new(ConversationStore::default());
        let key = ConversationKey::group(Uuid::new_v4());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            let sender = Uuid::new_v4();
            handles.push(tokio::spawn(async move {
                store.append(key, sender, &format!("m{i}")).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let messages = store.list(key).await;
        assert_eq!(messages.len(), 32);
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert_eq!(messages.last().unwrap().seq, 32);
    }

    #[tokio::test]
    async fn wait_beyond_wakes_on_append() {
        use std::sync::Arc;
        let store = Arc::new(ConversationStore::default());
        let key = ConversationKey::group(Uuid::new_v4());
        let sender = Uuid::new_v4();

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_beyond(key, 0, Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.append(key, sender, "ping").await;

        let got = waiter.await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "ping");
    }

    #[tokio::test]
    async fn wait_beyond_times_out_empty() {
        let store = ConversationStore::default();
        let key = ConversationKey::group(Uuid::new_v4());
        let got = store.wait_beyond(key, 0, Duration::from_millis(50)).await;
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn polling_an_unused_key_leaves_no_log_behind() {
        let store = ConversationStore::default();
        let key = ConversationKey::direct(Uuid::new_v4(), Uuid::new_v4());
        for _ in 0..3 {
            let got = store.wait_beyond(key, 0, Duration::from_millis(20)).await;
            assert!(got.is_empty());
        }
        assert_eq!(store.log_count().await, 0);
        assert!(store.list(key).await.is_empty());
    }

    #[tokio::test]
    async fn wait_beyond_skips_already_seen_messages() {
        let store = ConversationStore::default();
        let key = ConversationKey::group(Uuid::new_v4());
        let sender = Uuid::new_v4();
        store.append(key, sender, "one").await;
        store.append(key, sender, "two").await;

        let got = store.wait_beyond(key, 1, Duration::from_millis(50)).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].content, "two");
    }
}
