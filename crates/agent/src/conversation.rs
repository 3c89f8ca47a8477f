//! In-process conversation memory keyed by `(tenant, conversation id)`.
//!
//! The outer map is guarded by a short `std::sync::Mutex` section. Each
//! conversation carries its own `tokio::sync::Mutex`, held by a request from
//! history read until the new exchange is appended, so two requests on the
//! same conversation never interleave while different conversations proceed
//! in parallel.
//!
//! The map is bounded: idle conversations expire after a TTL and the least
//! recently used one is evicted at capacity. A conversation that any request
//! still holds a handle to is never evicted.

use aerobrain_core::message::{ConversationId, Message};
use aerobrain_core::retrieval::TenantId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

type Key = (TenantId, ConversationId);

struct Entry {
    turns: tokio::sync::Mutex<Vec<Message>>,
    last_access: Mutex<Instant>,
}

impl Entry {
    fn new() -> Self {
        Self {
            turns: tokio::sync::Mutex::new(Vec::new()),
            last_access: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        if let Ok(mut t) = self.last_access.lock() {
            *t = Instant::now();
        }
    }

    fn last_access(&self) -> Instant {
        self.last_access
            .lock()
            .map(|t| *t)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

pub struct ConversationStore {
    entries: Mutex<HashMap<Key, Arc<Entry>>>,
    max_entries: usize,
    idle_ttl: Duration,
}

/// A reference to one conversation; keeps it from being evicted while alive.
pub struct ConversationHandle {
    id: ConversationId,
    entry: Arc<Entry>,
}

/// Exclusive access to a conversation's turns.
pub struct ConversationGuard<'a> {
    turns: tokio::sync::MutexGuard<'a, Vec<Message>>,
    entry: &'a Entry,
}

impl ConversationHandle {
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Wait for exclusive access to the conversation.
    pub async fn lock(&self) -> ConversationGuard<'_> {
        ConversationGuard {
            turns: self.entry.turns.lock().await,
            entry: &self.entry,
        }
    }
}

impl ConversationGuard<'_> {
    /// All turns, oldest first.
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Append a completed user/assistant exchange.
    pub fn append_exchange(&mut self, user: Message, assistant: Message) {
        self.turns.push(user);
        self.turns.push(assistant);
        self.entry.touch();
    }
}

impl ConversationStore {
    pub fn new(max_entries: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            idle_ttl,
        }
    }

    pub fn from_config(config: &aerobrain_config::ConversationConfig) -> Self {
        Self::new(
            config.max_entries,
            Duration::from_secs(config.idle_ttl_secs),
        )
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<Key, Arc<Entry>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up a conversation, creating it when missing. A fresh id is
    /// generated when none is supplied.
    pub fn get_or_create(
        &self,
        tenant_id: TenantId,
        conversation_id: Option<ConversationId>,
    ) -> ConversationHandle {
        let id = conversation_id.unwrap_or_default();
        let key = (tenant_id, id.clone());
        let mut map = self.map();

        if let Some(entry) = map.get(&key) {
            entry.touch();
            return ConversationHandle {
                id,
                entry: Arc::clone(entry),
            };
        }

        self.evict(&mut map);
        let entry = Arc::new(Entry::new());
        map.insert(key, Arc::clone(&entry));
        debug!(tenant = %tenant_id, conversation = %id, size = map.len(), "Conversation created");
        ConversationHandle { id, entry }
    }

    /// Drop expired conversations, then make room for one more entry.
    fn evict(&self, map: &mut HashMap<Key, Arc<Entry>>) {
        let now = Instant::now();
        let before = map.len();
        map.retain(|_, e| {
            Arc::strong_count(e) > 1 || now.duration_since(e.last_access()) < self.idle_ttl
        });
        let expired = before - map.len();
        if expired > 0 {
            debug!(expired, "Expired idle conversations");
        }

        while map.len() >= self.max_entries {
            let oldest = map
                .iter()
                .filter(|(_, e)| Arc::strong_count(e) == 1)
                .min_by_key(|(_, e)| e.last_access())
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    map.remove(&key);
                    debug!(tenant = %key.0, conversation = %key.1, "Evicted least recently used conversation");
                }
                None => {
                    warn!(
                        size = map.len(),
                        max = self.max_entries,
                        "All conversations in use; exceeding capacity"
                    );
                    break;
                }
            }
        }
    }

    /// Snapshot of a conversation's turns, if it exists.
    pub async fn history(
        &self,
        tenant_id: TenantId,
        conversation_id: &ConversationId,
    ) -> Option<Vec<Message>> {
        let entry = self
            .map()
            .get(&(tenant_id, conversation_id.clone()))
            .cloned()?;
        let turns = entry.turns.lock().await;
        Some(turns.clone())
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerobrain_core::message::Role;

    fn store() -> ConversationStore {
        ConversationStore::new(100, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn missing_id_generates_fresh_conversation() {
        let store = store();
        let a = store.get_or_create(TenantId(1), None);
        let b = store.get_or_create(TenantId(1), None);
        assert_ne!(a.id(), b.id());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn same_key_shares_turns() {
        let store = store();
        let id = ConversationId::from("c-1");
        {
            let handle = store.get_or_create(TenantId(1), Some(id.clone()));
            let mut guard = handle.lock().await;
            guard.append_exchange(Message::user("q1"), Message::assistant("a1"));
        }
        let handle = store.get_or_create(TenantId(1), Some(id.clone()));
        let guard = handle.lock().await;
        assert_eq!(guard.turns().len(), 2);
        assert_eq!(guard.turns()[0].role, Role::User);
        assert_eq!(guard.turns()[1].content, "a1");
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let store = store();
        let id = ConversationId::from("shared-id");
        {
            let handle = store.get_or_create(TenantId(1), Some(id.clone()));
            handle
                .lock()
                .await
                .append_exchange(Message::user("secret"), Message::assistant("ok"));
        }
        let other = store.get_or_create(TenantId(2), Some(id.clone()));
        assert!(other.lock().await.turns().is_empty());
        assert!(store.history(TenantId(3), &id).await.is_none());
    }

    #[tokio::test]
    async fn recent_returns_tail_in_order() {
        let store = store();
        let handle = store.get_or_create(TenantId(1), None);
        let mut guard = handle.lock().await;
        for i in 0..3 {
            guard.append_exchange(
                Message::user(format!("q{i}")),
                Message::assistant(format!("a{i}")),
            );
        }
        let tail: Vec<_> = guard.recent(3).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, ["a1", "q2", "a2"]);
        assert_eq!(guard.recent(100).len(), 6);
        assert!(guard.recent(0).is_empty());
    }

    #[tokio::test]
    async fn lru_eviction_at_capacity() {
        let store = ConversationStore::new(2, Duration::from_secs(3600));
        let first = ConversationId::from("first");
        drop(store.get_or_create(TenantId(1), Some(first.clone())));
        tokio::time::sleep(Duration::from_millis(5)).await;
        drop(store.get_or_create(TenantId(1), Some(ConversationId::from("second"))));
        tokio::time::sleep(Duration::from_millis(5)).await;
        drop(store.get_or_create(TenantId(1), Some(ConversationId::from("third"))));

        assert_eq!(store.len(), 2);
        assert!(store.history(TenantId(1), &first).await.is_none());
    }

    #[tokio::test]
    async fn held_conversations_are_not_evicted() {
        let store = ConversationStore::new(1, Duration::from_secs(3600));
        let held = store.get_or_create(TenantId(1), Some(ConversationId::from("held")));
        let _other = store.get_or_create(TenantId(1), Some(ConversationId::from("other")));
        assert_eq!(store.len(), 2);
        assert!(store.history(TenantId(1), held.id()).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_conversations_expire() {
        let store = ConversationStore::new(100, Duration::from_secs(60));
        let stale = ConversationId::from("stale");
        drop(store.get_or_create(TenantId(1), Some(stale.clone())));

        tokio::time::advance(Duration::from_secs(61)).await;
        drop(store.get_or_create(TenantId(1), None));

        assert_eq!(store.len(), 1);
        assert!(store.history(TenantId(1), &stale).await.is_none());
    }

    #[tokio::test]
    async fn same_conversation_requests_are_serialized() {
        let store = Arc::new(store());
        let id = ConversationId::from("serial");
        let handle = store.get_or_create(TenantId(1), Some(id.clone()));
        let guard = handle.lock().await;

        let store2 = Arc::clone(&store);
        let id2 = id.clone();
        let waiter = tokio::spawn(async move {
            let handle = store2.get_or_create(TenantId(1), Some(id2));
            let guard = handle.lock().await;
            guard.turns().len()
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let mut guard = guard;
        guard.append_exchange(Message::user("q"), Message::assistant("a"));
        drop(guard);

        assert_eq!(waiter.await.unwrap(), 2);
    }
}
