//! Bounded, expiry-aware cache of identity service tokens
//!
//! Entries are keyed by username, one per principal. Two requests from a
//! principal that is not cached yet may both run a token exchange; the later
//! insert replaces the earlier one. Both tokens are valid, so either outcome
//! is correct, but callers must not assume a single exchange per principal.

use chrono::{DateTime, Duration, Utc};
use docdav_client::Token;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Upper bound on an accepted token lifetime (one year)
const MAX_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// A token issued for a principal
#[derive(Clone, Debug)]
pub struct CachedToken {
    /// Username the token was issued to
    pub principal: String,
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Digest of the credentials that obtained the token
    fingerprint: blake3::Hash,
}

impl CachedToken {
    /// Build a cache entry from an identity service token
    pub fn from_token(
        principal: impl Into<String>,
        token: Token,
        fingerprint: blake3::Hash,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            principal: principal.into(),
            access_token: token.access_token,
            token_type: token.token_type,
            refresh_token: token.refresh_token,
            expires_at: issued_at + Duration::seconds(token.expires_in.clamp(0, MAX_LIFETIME_SECS)),
            fingerprint,
        }
    }
}

/// Result of a cache lookup
#[derive(Debug)]
pub enum Lookup {
    /// Valid token for these credentials
    Fresh(CachedToken),
    /// Token for these credentials that has expired (or is about to)
    Stale(CachedToken),
    Miss,
}

/// LRU token cache shared by all requests
pub struct TokenCache {
    entries: Mutex<LruCache<String, CachedToken>>,
    skew: Duration,
}

impl TokenCache {
    /// Create a cache holding at most `capacity` principals
    pub fn new(capacity: usize, expiry_skew: std::time::Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let skew = Duration::from_std(expiry_skew).unwrap_or_else(|_| Duration::seconds(60));
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            skew,
        }
    }

    /// Look up the token for a principal presenting the given credential fingerprint
    pub fn lookup(&self, principal: &str, fingerprint: &blake3::Hash) -> Lookup {
        self.lookup_at(principal, fingerprint, Utc::now())
    }

    fn lookup_at(&self, principal: &str, fingerprint: &blake3::Hash, now: DateTime<Utc>) -> Lookup {
        let mut entries = self.entries.lock();
        match entries.get(principal) {
            // blake3::Hash equality is constant-time
            Some(entry) if entry.fingerprint != *fingerprint => Lookup::Miss,
            Some(entry) if entry.expires_at - self.skew <= now => Lookup::Stale(entry.clone()),
            Some(entry) => Lookup::Fresh(entry.clone()),
            None => Lookup::Miss,
        }
    }

    /// Store a token, replacing any previous entry for the same principal
    pub fn insert(&self, token: CachedToken) {
        self.entries.lock().put(token.principal.clone(), token);
    }

    /// Drop the entry for a principal
    pub fn remove(&self, principal: &str) -> Option<CachedToken> {
        self.entries.lock().pop(principal)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
