use jsonwebtoken::jwk::Jwk;
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Storage for keys fetched from a JWKS endpoint.
///
/// Implementations do not need interior locking: the owning client serializes
/// every call behind one mutex.
pub trait KeyCacher: Send {
    /// Returns the cached key for `kid`, if present and not expired.
    fn get(&mut self, kid: &str) -> Option<Jwk>;

    /// Offers freshly downloaded `keys` to the cache and returns the one matching `kid`.
    fn add(&mut self, kid: &str, keys: &[Jwk]) -> Option<Jwk>;
}

pub(crate) fn key_id(jwk: &Jwk) -> &str {
    jwk.common.key_id.as_deref().unwrap_or("")
}

#[derive(Debug, Clone)]
pub(super) struct CachedKey {
    pub(super) jwk: Jwk,
    pub(super) added_at: Instant,
}

/// In-memory [`KeyCacher`] with optional age and capacity limits.
///
/// * unbounded (`capacity == None`): every downloaded key is stored, so one
///   download primes the whole set.
/// * bounded (`capacity == Some(n)`): only the requested key is stored; when
///   full, the entry with the oldest insertion time is evicted first.
/// * disabled (`capacity == Some(0)`): nothing is stored, yet `add` still hands
///   back the matching key, so every lookup resolves through a download.
///
/// Expiry is lazy: an entry older than `max_age` is dropped when it is read.
#[derive(Debug, Clone)]
pub struct MemoryKeyCacher {
    pub(super) entries: HashMap<String, CachedKey>,
    max_age: Option<Duration>,
    capacity: Option<usize>,
}

impl MemoryKeyCacher {
    pub fn new(max_age: Option<Duration>, capacity: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            max_age,
            capacity,
        }
    }

    /// Unbounded cache whose entries never expire.
    pub fn persistent() -> Self {
        Self::new(None, None)
    }

    /// Cache that stores nothing.
    pub fn disabled() -> Self {
        Self::new(None, Some(0))
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `kid` is stored, regardless of its age.
    pub fn contains(&self, kid: &str) -> bool {
        self.entries.contains_key(kid)
    }

    fn is_expired(&self, entry: &CachedKey, now: Instant) -> bool {
        match self.max_age {
            Some(max_age) => now.saturating_duration_since(entry.added_at) > max_age,
            None => false,
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.added_at)
            .map(|(kid, _)| kid.clone());
        if let Some(kid) = oldest {
            debug!("jwks cache full; evicting kid={kid}");
            self.entries.remove(&kid);
        }
    }

    fn insert(&mut self, jwk: Jwk) {
        let kid = key_id(&jwk).to_string();
        self.entries.insert(
            kid,
            CachedKey {
                jwk,
                added_at: Instant::now(),
            },
        );
    }
}

impl Default for MemoryKeyCacher {
    fn default() -> Self {
        Self::persistent()
    }
}

impl KeyCacher for MemoryKeyCacher {
    fn get(&mut self, kid: &str) -> Option<Jwk> {
        if self.capacity == Some(0) {
            return None;
        }
        let entry = self.entries.get(kid)?;
        if self.is_expired(entry, Instant::now()) {
            debug!("jwks cache entry expired; kid={kid}");
            self.entries.remove(kid);
            return None;
        }
        Some(entry.jwk.clone())
    }

    fn add(&mut self, kid: &str, keys: &[Jwk]) -> Option<Jwk> {
        let Some(capacity) = self.capacity else {
            let mut matched = None;
            for jwk in keys {
                if key_id(jwk) == kid {
                    matched = Some(jwk.clone());
                }
                self.insert(jwk.clone());
            }
            return matched;
        };

        let matched = keys.iter().find(|jwk| key_id(jwk) == kid)?.clone();
        if capacity == 0 {
            return Some(matched);
        }
        if !self.entries.contains_key(kid) && self.entries.len() >= capacity {
            self.evict_oldest();
        }
        self.insert(matched.clone());
        Some(matched)
    }
}
