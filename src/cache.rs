//! The time-bounded cache layered over expensive identity lookups
//!
//! Entries are keyed by `(operation, canonical arguments)` and carry a TTL
//! fixed per operation so the freshness trade-off stays centrally
//! auditable. An entry whose expiry has passed is treated as absent
//! regardless of whether it has been physically removed; lookups evict such
//! entries lazily. Token validity is never stored here.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, RwLock};

use aliri_clock::{Clock, DurationSecs, System, UnixTime};
use sha2::{Digest, Sha256};

use crate::records::{ClientRecord, RoleRecord, UserInfo, UserRecord};

/// Identifies a cacheable operation; TTLs and invalidation rules hang off
/// this
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum CacheOp {
    UserById,
    UserByUsername,
    UserByEmail,
    SearchUsers,
    UserRealmRoles,
    UserClientRoles,
    RealmRoles,
    RealmRole,
    Client,
    ServiceAccountId,
    PublicKey,
    WellKnown,
    Certs,
    UserInfo,
}

impl CacheOp {
    /// The fixed freshness window for this operation
    ///
    /// Short for token-derived identity facts and volatile searches, medium
    /// for user and role records, long for server-configuration facts that
    /// no write path of this adapter can change.
    pub(crate) fn ttl(self) -> DurationSecs {
        match self {
            CacheOp::UserInfo | CacheOp::SearchUsers => DurationSecs(30),
            CacheOp::UserById
            | CacheOp::UserByUsername
            | CacheOp::UserByEmail
            | CacheOp::UserRealmRoles
            | CacheOp::UserClientRoles
            | CacheOp::RealmRoles
            | CacheOp::RealmRole => DurationSecs(300),
            CacheOp::Client
            | CacheOp::ServiceAccountId
            | CacheOp::PublicKey
            | CacheOp::WellKnown
            | CacheOp::Certs => DurationSecs(3600),
        }
    }
}

/// Separates argument components within a canonical key
///
/// The unit separator cannot appear in URLs, usernames, or identifiers the
/// server hands out, so joined arguments cannot collide.
const ARG_SEPARATOR: &str = "\u{1f}";

/// A canonical cache key: operation identifier plus normalized arguments
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    op: CacheOp,
    args: String,
}

impl CacheKey {
    pub(crate) fn new(op: CacheOp, args: &[&str]) -> Self {
        Self {
            op,
            args: args.join(ARG_SEPARATOR),
        }
    }

    pub(crate) fn nullary(op: CacheOp) -> Self {
        Self::new(op, &[])
    }

    pub(crate) fn op(&self) -> CacheOp {
        self.op
    }

    /// Whether this key's first argument component equals `arg`
    fn first_arg_is(&self, arg: &str) -> bool {
        self.args.split(ARG_SEPARATOR).next() == Some(arg)
    }
}

/// A cached payload
///
/// Variants are `Arc`-shared so hits are cheap and concurrent readers can
/// never observe a partially written value.
#[derive(Clone, Debug)]
pub(crate) enum CacheValue {
    User(Arc<UserRecord>),
    Users(Arc<Vec<UserRecord>>),
    Role(Arc<RoleRecord>),
    Roles(Arc<Vec<RoleRecord>>),
    Client(Arc<ClientRecord>),
    UserInfo(Arc<UserInfo>),
    Json(Arc<serde_json::Value>),
    Text(Arc<str>),
}

impl CacheValue {
    pub(crate) fn into_user(self) -> Option<Arc<UserRecord>> {
        match self {
            CacheValue::User(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_users(self) -> Option<Arc<Vec<UserRecord>>> {
        match self {
            CacheValue::Users(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_role(self) -> Option<Arc<RoleRecord>> {
        match self {
            CacheValue::Role(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_roles(self) -> Option<Arc<Vec<RoleRecord>>> {
        match self {
            CacheValue::Roles(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_client(self) -> Option<Arc<ClientRecord>> {
        match self {
            CacheValue::Client(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_userinfo(self) -> Option<Arc<UserInfo>> {
        match self {
            CacheValue::UserInfo(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_json(self) -> Option<Arc<serde_json::Value>> {
        match self {
            CacheValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_text(self) -> Option<Arc<str>> {
        match self {
            CacheValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: CacheValue,
    expiry: UnixTime,
}

/// The TTL cache shared by a facade's operations
///
/// Safe for concurrent use from threads and tasks alike; mutation is
/// guarded so readers see either the previous or the next state of an
/// entry, never a torn one.
#[derive(Debug)]
pub(crate) struct TtlCache<C = System> {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    clock: C,
}

impl TtlCache<System> {
    pub(crate) fn new() -> Self {
        Self::with_clock(System)
    }
}

impl<C: Clock> TtlCache<C> {
    pub(crate) fn with_clock(clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Looks up a live entry, lazily evicting it if it has expired
    pub(crate) fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                Some(entry) if now < entry.expiry => {
                    tracing::trace!(op = ?key.op, "cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(|entry| now >= entry.expiry) {
            tracing::trace!(op = ?key.op, "evicting expired entry");
            entries.remove(key);
        }
        None
    }

    /// Stores a value under the operation's fixed TTL
    pub(crate) fn put(&self, key: CacheKey, value: CacheValue) {
        let expiry = self.clock.now() + key.op.ttl();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, Entry { value, expiry });
    }

    /// Removes one specific entry
    pub(crate) fn invalidate_key(&self, key: &CacheKey) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }

    /// Removes every entry belonging to any of the listed operations
    pub(crate) fn invalidate_ops(&self, ops: &[CacheOp]) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|key, _| !ops.contains(&key.op));
    }

    /// Removes everything a write to the given user's record could stale:
    /// the direct id lookup for that user, and every username, email, and
    /// search entry, since those cannot be matched back to the user by key
    pub(crate) fn invalidate_user(&self, user_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|key, _| match key.op {
            CacheOp::UserById => key.args != user_id,
            CacheOp::UserByUsername | CacheOp::UserByEmail | CacheOp::SearchUsers => false,
            _ => true,
        });
    }

    /// Removes the given user's role-list entries, realm and per-client
    pub(crate) fn invalidate_user_roles(&self, user_id: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|key, _| match key.op {
            CacheOp::UserRealmRoles => key.args != user_id,
            CacheOp::UserClientRoles => !key.first_arg_is(user_id),
            _ => true,
        });
    }

    /// Unconditionally empties the cache
    pub(crate) fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// A stable fingerprint of a token, usable as a cache key component without
/// retaining the token itself
pub(crate) fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[derive(Clone, Debug, Default)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn advance(&self, secs: u64) {
            self.0.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> UnixTime {
            UnixTime(self.0.load(Ordering::SeqCst))
        }
    }

    fn text(value: &str) -> CacheValue {
        CacheValue::Text(Arc::from(value))
    }

    #[test]
    fn expired_entries_are_absent_and_lazily_evicted() {
        let clock = ManualClock::default();
        let cache = TtlCache::with_clock(clock.clone());
        let key = CacheKey::nullary(CacheOp::PublicKey);

        cache.put(key.clone(), text("pem"));
        assert!(cache.get(&key).is_some());

        clock.advance(3600);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn entries_live_until_their_operation_ttl() {
        let clock = ManualClock::default();
        let cache = TtlCache::with_clock(clock.clone());
        let search = CacheKey::new(CacheOp::SearchUsers, &["alice", "100"]);
        let user = CacheKey::new(CacheOp::UserById, &["u-1"]);

        cache.put(search.clone(), text("s"));
        cache.put(user.clone(), text("u"));

        clock.advance(30);
        assert!(cache.get(&search).is_none(), "search TTL is 30s");
        assert!(cache.get(&user).is_some(), "user TTL is 300s");
    }

    #[test]
    fn user_invalidation_spares_unrelated_users() {
        let cache = TtlCache::new();
        cache.put(CacheKey::new(CacheOp::UserById, &["u-1"]), text("a"));
        cache.put(CacheKey::new(CacheOp::UserById, &["u-2"]), text("b"));
        cache.put(CacheKey::new(CacheOp::UserByEmail, &["a@x"]), text("a"));
        cache.put(CacheKey::new(CacheOp::SearchUsers, &["al", "10"]), text("s"));
        cache.put(CacheKey::nullary(CacheOp::RealmRoles), text("r"));

        cache.invalidate_user("u-1");

        assert!(cache.get(&CacheKey::new(CacheOp::UserById, &["u-1"])).is_none());
        assert!(cache.get(&CacheKey::new(CacheOp::UserById, &["u-2"])).is_some());
        assert!(
            cache.get(&CacheKey::new(CacheOp::UserByEmail, &["a@x"])).is_none(),
            "email lookups cannot be matched by key and are dropped wholesale"
        );
        assert!(cache
            .get(&CacheKey::new(CacheOp::SearchUsers, &["al", "10"]))
            .is_none());
        assert!(cache.get(&CacheKey::nullary(CacheOp::RealmRoles)).is_some());
    }

    #[test]
    fn role_invalidation_matches_the_user_prefix() {
        let cache = TtlCache::new();
        cache.put(CacheKey::new(CacheOp::UserRealmRoles, &["u-1"]), text("r"));
        cache.put(
            CacheKey::new(CacheOp::UserClientRoles, &["u-1", "backend"]),
            text("c"),
        );
        cache.put(CacheKey::new(CacheOp::UserRealmRoles, &["u-2"]), text("r"));

        cache.invalidate_user_roles("u-1");

        assert!(cache
            .get(&CacheKey::new(CacheOp::UserRealmRoles, &["u-1"]))
            .is_none());
        assert!(cache
            .get(&CacheKey::new(CacheOp::UserClientRoles, &["u-1", "backend"]))
            .is_none());
        assert!(cache
            .get(&CacheKey::new(CacheOp::UserRealmRoles, &["u-2"]))
            .is_some());
    }

    #[test]
    fn clear_empties_everything() {
        let cache = TtlCache::new();
        cache.put(CacheKey::nullary(CacheOp::Certs), text("c"));
        cache.put(CacheKey::new(CacheOp::UserById, &["u-1"]), text("u"));

        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn compound_keys_cannot_collide_across_argument_splits() {
        let a = CacheKey::new(CacheOp::UserClientRoles, &["u-1", "x"]);
        let b = CacheKey::new(CacheOp::UserClientRoles, &["u-1x", ""]);
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprints_are_stable_and_token_free() {
        let fp = token_fingerprint("opaque-token");
        assert_eq!(fp, token_fingerprint("opaque-token"));
        assert_eq!(fp.len(), 64);
        assert!(!fp.contains("opaque"));
    }
}
