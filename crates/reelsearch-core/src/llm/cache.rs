//! Memo of deterministic LLM responses and query embeddings
//!
//! Repeated searches for the same query hit the same keyword, judgment and
//! embedding calls; answers are kept for a bounded time and entry count.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: usize = 4096;

/// What kind of response a key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Chat,
    Embedding,
}

impl CacheKind {
    fn prefix(self) -> &'static str {
        match self {
            CacheKind::Chat => "chat",
            CacheKind::Embedding => "embed",
        }
    }
}

/// Key for one model answering one payload
pub fn cache_key(kind: CacheKind, model: &str, payload: &str) -> String {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    payload.hash(&mut hasher);
    format!("{}:{}:{:016x}", kind.prefix(), model, hasher.finish())
}

struct Entry {
    value: String,
    stored_at: Instant,
}

/// Bounded in-memory cache shared by one client
pub struct LLMCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl LLMCache {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Store a value; a full cache first drops expired entries, then the oldest one
    pub fn set(&self, key: String, value: String) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        }
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LLMCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let cache = LLMCache::new();
        cache.set("a".to_string(), "yes".to_string());
        assert_eq!(cache.get("a").as_deref(), Some("yes"));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = LLMCache::with_limits(Duration::from_millis(20), 8);
        cache.set("a".to_string(), "yes".to_string());
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = LLMCache::with_limits(Duration::from_secs(60), 2);
        cache.set("first".to_string(), "1".to_string());
        std::thread::sleep(Duration::from_millis(2));
        cache.set("second".to_string(), "2".to_string());
        cache.set("third".to_string(), "3".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("third").as_deref(), Some("3"));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = LLMCache::with_limits(Duration::from_secs(60), 2);
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.set("a".to_string(), "3".to_string());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_keys_separate_kind_model_and_payload() {
        let base = cache_key(CacheKind::Embedding, "mxbai", "space horror");
        assert_eq!(base, cache_key(CacheKind::Embedding, "mxbai", "space horror"));
        assert_ne!(base, cache_key(CacheKind::Chat, "mxbai", "space horror"));
        assert_ne!(base, cache_key(CacheKind::Embedding, "nomic", "space horror"));
        assert_ne!(base, cache_key(CacheKind::Embedding, "mxbai", "heist"));
    }
}
