//! Cache client facade

use crate::backend::{CacheBackend, Connector};
use crate::config::{CacheConfig, WeightedServer, parse_server_spec};
use crate::error::{CacheError, Result};
use crate::key::validate_key;
use crate::namespace;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// Client facade over a pluggable cache backend.
///
/// The surface comes in two layers:
///
/// - **strict** (`try_*`): every operation returns a
///   [`Result`], so callers can tell "key absent" from "backend down";
/// - **fail-soft** (unprefixed): backend faults are logged as warnings and
///   collapsed into a safe default (`None`, `false`, the caller's counter
///   default, or a silent no-op). Callers get availability and stay free
///   of per-call error handling.
///
/// Operations without an `_in` suffix scope to the configured default
/// namespace (global when none is configured); `_in` variants name the
/// namespace explicitly. The namespace travels as a per-call argument, so
/// the client is freely shareable across tasks.
///
/// # Example
/// ```no_run
/// # use softcache::{CacheClient, CacheConfig, MemoryConnector};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CacheConfig::new(["127.0.0.1:11211"]).with_default_ttl(300);
/// let client = CacheClient::connect(config, &MemoryConnector).await?;
///
/// client.set("user:1", "John Doe", None).await;
/// let name: Option<String> = client.get("user:1").await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheClient {
    backend: Arc<dyn CacheBackend>,
    config: Arc<CacheConfig>,
}

impl CacheClient {
    /// Establish a client over a freshly connected backend pool.
    ///
    /// Fails with [`CacheError::Configuration`] when no servers are
    /// configured, or [`CacheError::Initialization`] wrapping the driver's
    /// error when the pool cannot be established. These are the only
    /// errors this client ever propagates outside the `try_*` layer.
    pub async fn connect<C: Connector>(config: CacheConfig, connector: &C) -> Result<Self> {
        if config.servers.is_empty() {
            return Err(CacheError::Configuration(
                "no backend servers configured".to_string(),
            ));
        }
        let servers = config.weighted_servers();
        let backend = connector
            .connect(&servers, config.failure_mode)
            .await
            .map_err(|e| CacheError::Initialization(Box::new(e)))?;
        Ok(Self {
            backend,
            config: Arc::new(config),
        })
    }

    /// Wrap an already-constructed backend handle.
    pub fn with_backend(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self {
            backend,
            config: Arc::new(config),
        }
    }

    /// Release backend connections. Close failures are logged, not raised.
    pub async fn shutdown(&self) {
        if let Err(e) = self.backend.shutdown().await {
            warn!("backend shutdown failed: {}", e);
        }
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn default_namespace(&self) -> Option<&str> {
        self.config.namespace.as_deref()
    }

    /// `None` falls back to the configured default; zero keeps the classic
    /// "never expire" meaning.
    fn resolve_ttl(&self, ttl: Option<u64>) -> Option<u64> {
        match ttl.or(self.config.default_ttl) {
            Some(0) | None => None,
            secs => secs,
        }
    }

    /// Validate and resolve the physical key for `key` under `ns`.
    async fn physical_key(&self, ns: Option<&str>, key: &str) -> Result<String> {
        validate_key(key)?;
        match ns {
            Some(ns) if !ns.is_empty() => {
                validate_key(ns)?;
                namespace::scoped_key(self.backend.as_ref(), ns, key).await
            }
            _ => Ok(key.to_string()),
        }
    }

    // ---- read path ----------------------------------------------------

    /// Fetch `key` in the default namespace, or `Err` on any fault.
    pub async fn try_get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        self.get_scoped(self.default_namespace(), key).await
    }

    /// Fetch `key` inside `ns`, or `Err` on any fault.
    pub async fn try_get_in<V: DeserializeOwned>(&self, ns: &str, key: &str) -> Result<Option<V>> {
        self.get_scoped(Some(ns), key).await
    }

    /// Fetch `key` in the default namespace.
    ///
    /// Backend faults are logged and reported as `None`; use
    /// [`try_get`](Self::try_get) to tell a miss from a fault.
    pub async fn get<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        self.get_scoped(self.default_namespace(), key)
            .await
            .unwrap_or_else(|e| {
                warn!("get failed for key {}: {}", key, e);
                None
            })
    }

    /// Fetch `key` inside `ns`, collapsing faults to `None`.
    pub async fn get_in<V: DeserializeOwned>(&self, ns: &str, key: &str) -> Option<V> {
        self.get_scoped(Some(ns), key).await.unwrap_or_else(|e| {
            warn!("get failed for key {}: {}", key, e);
            None
        })
    }

    async fn get_scoped<V: DeserializeOwned>(
        &self,
        ns: Option<&str>,
        key: &str,
    ) -> Result<Option<V>> {
        let pkey = self.physical_key(ns, key).await?;
        match self.backend.get(&pkey).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whether `key` holds a value, judged on raw backend presence.
    pub async fn try_contains_key(&self, key: &str) -> Result<bool> {
        self.contains_scoped(self.default_namespace(), key).await
    }

    /// Whether `key` holds a value inside `ns`.
    pub async fn try_contains_key_in(&self, ns: &str, key: &str) -> Result<bool> {
        self.contains_scoped(Some(ns), key).await
    }

    /// Whether `key` holds a value; faults are logged and read as `false`.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.contains_scoped(self.default_namespace(), key)
            .await
            .unwrap_or_else(|e| {
                warn!("contains_key failed for key {}: {}", key, e);
                false
            })
    }

    /// Namespace-scoped [`contains_key`](Self::contains_key).
    pub async fn contains_key_in(&self, ns: &str, key: &str) -> bool {
        self.contains_scoped(Some(ns), key).await.unwrap_or_else(|e| {
            warn!("contains_key failed for key {}: {}", key, e);
            false
        })
    }

    async fn contains_scoped(&self, ns: Option<&str>, key: &str) -> Result<bool> {
        let pkey = self.physical_key(ns, key).await?;
        Ok(self.backend.get(&pkey).await?.is_some())
    }

    // ---- write path ---------------------------------------------------

    /// Store `value` under `key` only if the key is absent. Returns
    /// whether the add won.
    pub async fn try_add<V: Serialize>(&self, key: &str, value: V, ttl: Option<u64>) -> Result<bool> {
        self.add_scoped(self.default_namespace(), key, value, ttl).await
    }

    /// Namespace-scoped [`try_add`](Self::try_add).
    pub async fn try_add_in<V: Serialize>(
        &self,
        ns: &str,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.add_scoped(Some(ns), key, value, ttl).await
    }

    /// Store `value` only if `key` is absent. A refused add and any fault
    /// are logged, not returned.
    pub async fn add<V: Serialize>(&self, key: &str, value: V, ttl: Option<u64>) {
        match self.add_scoped(self.default_namespace(), key, value, ttl).await {
            Ok(true) => {}
            Ok(false) => warn!("add refused for key {}: already present", key),
            Err(e) => warn!("add failed for key {}: {}", key, e),
        }
    }

    /// Namespace-scoped [`add`](Self::add).
    pub async fn add_in<V: Serialize>(&self, ns: &str, key: &str, value: V, ttl: Option<u64>) {
        match self.add_scoped(Some(ns), key, value, ttl).await {
            Ok(true) => {}
            Ok(false) => warn!("add refused for key {}: already present", key),
            Err(e) => warn!("add failed for key {}: {}", key, e),
        }
    }

    async fn add_scoped<V: Serialize>(
        &self,
        ns: Option<&str>,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let pkey = self.physical_key(ns, key).await?;
        let raw = serde_json::to_vec(&value)?;
        self.backend.add(&pkey, raw, self.resolve_ttl(ttl)).await
    }

    /// Unconditionally store `value` under `key`.
    pub async fn try_set<V: Serialize>(&self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        self.set_scoped(self.default_namespace(), key, value, ttl).await
    }

    /// Namespace-scoped [`try_set`](Self::try_set).
    pub async fn try_set_in<V: Serialize>(
        &self,
        ns: &str,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<()> {
        self.set_scoped(Some(ns), key, value, ttl).await
    }

    /// Store `value` under `key`, creating or overwriting.
    ///
    /// `ttl` of `None` applies the configured default; zero means never
    /// expire. Faults are logged, not returned.
    pub async fn set<V: Serialize>(&self, key: &str, value: V, ttl: Option<u64>) {
        if let Err(e) = self.set_scoped(self.default_namespace(), key, value, ttl).await {
            warn!("set failed for key {}: {}", key, e);
        }
    }

    /// Namespace-scoped [`set`](Self::set).
    pub async fn set_in<V: Serialize>(&self, ns: &str, key: &str, value: V, ttl: Option<u64>) {
        if let Err(e) = self.set_scoped(Some(ns), key, value, ttl).await {
            warn!("set failed for key {}: {}", key, e);
        }
    }

    async fn set_scoped<V: Serialize>(
        &self,
        ns: Option<&str>,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<()> {
        let pkey = self.physical_key(ns, key).await?;
        let raw = serde_json::to_vec(&value)?;
        self.backend.set(&pkey, raw, self.resolve_ttl(ttl)).await
    }

    /// Store `value` only if `key` already exists. Returns whether it did.
    pub async fn try_replace<V: Serialize>(
        &self,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.replace_scoped(self.default_namespace(), key, value, ttl).await
    }

    /// Namespace-scoped [`try_replace`](Self::try_replace).
    pub async fn try_replace_in<V: Serialize>(
        &self,
        ns: &str,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<bool> {
        self.replace_scoped(Some(ns), key, value, ttl).await
    }

    /// Overwrite `key` only if it exists; a miss and any fault are logged.
    pub async fn replace<V: Serialize>(&self, key: &str, value: V, ttl: Option<u64>) {
        match self.replace_scoped(self.default_namespace(), key, value, ttl).await {
            Ok(true) => {}
            Ok(false) => warn!("replace skipped for key {}: not present", key),
            Err(e) => warn!("replace failed for key {}: {}", key, e),
        }
    }

    /// Namespace-scoped [`replace`](Self::replace).
    pub async fn replace_in<V: Serialize>(&self, ns: &str, key: &str, value: V, ttl: Option<u64>) {
        match self.replace_scoped(Some(ns), key, value, ttl).await {
            Ok(true) => {}
            Ok(false) => warn!("replace skipped for key {}: not present", key),
            Err(e) => warn!("replace failed for key {}: {}", key, e),
        }
    }

    async fn replace_scoped<V: Serialize>(
        &self,
        ns: Option<&str>,
        key: &str,
        value: V,
        ttl: Option<u64>,
    ) -> Result<bool> {
        let pkey = self.physical_key(ns, key).await?;
        let raw = serde_json::to_vec(&value)?;
        self.backend.replace(&pkey, raw, self.resolve_ttl(ttl)).await
    }

    /// Remove `key`. Returns whether a value was removed.
    pub async fn try_delete(&self, key: &str) -> Result<bool> {
        self.delete_scoped(self.default_namespace(), key).await
    }

    /// Namespace-scoped [`try_delete`](Self::try_delete).
    pub async fn try_delete_in(&self, ns: &str, key: &str) -> Result<bool> {
        self.delete_scoped(Some(ns), key).await
    }

    /// Remove `key`; a miss and any fault are logged, not returned.
    pub async fn delete(&self, key: &str) {
        match self.delete_scoped(self.default_namespace(), key).await {
            Ok(true) => {}
            Ok(false) => warn!("delete missed for key {}: not present", key),
            Err(e) => warn!("delete failed for key {}: {}", key, e),
        }
    }

    /// Namespace-scoped [`delete`](Self::delete).
    pub async fn delete_in(&self, ns: &str, key: &str) {
        match self.delete_scoped(Some(ns), key).await {
            Ok(true) => {}
            Ok(false) => warn!("delete missed for key {}: not present", key),
            Err(e) => warn!("delete failed for key {}: {}", key, e),
        }
    }

    async fn delete_scoped(&self, ns: Option<&str>, key: &str) -> Result<bool> {
        let pkey = self.physical_key(ns, key).await?;
        self.backend.delete(&pkey).await
    }

    // ---- counters -----------------------------------------------------

    /// Add `delta` to the counter under `key`, seeding an absent key with
    /// `default`.
    ///
    /// Seeding is check-then-add: two concurrent callers can both observe
    /// absence, the backend's `add` lets one seed win, and the loser still
    /// returns its own `default`, which can disagree with the stored
    /// value. Accepted weak-consistency window, kept from the underlying
    /// protocol's primitives.
    pub async fn try_incr(&self, key: &str, delta: u64, default: u64) -> Result<u64> {
        self.incr_scoped(self.default_namespace(), key, delta, default)
            .await
    }

    /// Namespace-scoped [`try_incr`](Self::try_incr).
    pub async fn try_incr_in(&self, ns: &str, key: &str, delta: u64, default: u64) -> Result<u64> {
        self.incr_scoped(Some(ns), key, delta, default).await
    }

    /// Fail-soft [`try_incr`](Self::try_incr): faults are logged and the
    /// caller's `default` is returned.
    pub async fn incr(&self, key: &str, delta: u64, default: u64) -> u64 {
        self.incr_scoped(self.default_namespace(), key, delta, default)
            .await
            .unwrap_or_else(|e| {
                warn!("incr failed for key {}: {}", key, e);
                default
            })
    }

    /// Namespace-scoped [`incr`](Self::incr).
    pub async fn incr_in(&self, ns: &str, key: &str, delta: u64, default: u64) -> u64 {
        self.incr_scoped(Some(ns), key, delta, default)
            .await
            .unwrap_or_else(|e| {
                warn!("incr failed for key {}: {}", key, e);
                default
            })
    }

    /// Increment by one, seeding an absent key with zero.
    pub async fn incr_one(&self, key: &str) -> u64 {
        self.incr(key, 1, 0).await
    }

    /// Subtract `delta` from the counter under `key`, seeding an absent
    /// key with `default`. Same seeding race as
    /// [`try_incr`](Self::try_incr); the floor on underflow is the
    /// backend's (unsigned-counter drivers stop at zero).
    pub async fn try_decr(&self, key: &str, delta: u64, default: u64) -> Result<u64> {
        self.decr_scoped(self.default_namespace(), key, delta, default)
            .await
    }

    /// Namespace-scoped [`try_decr`](Self::try_decr).
    pub async fn try_decr_in(&self, ns: &str, key: &str, delta: u64, default: u64) -> Result<u64> {
        self.decr_scoped(Some(ns), key, delta, default).await
    }

    /// Fail-soft [`try_decr`](Self::try_decr).
    pub async fn decr(&self, key: &str, delta: u64, default: u64) -> u64 {
        self.decr_scoped(self.default_namespace(), key, delta, default)
            .await
            .unwrap_or_else(|e| {
                warn!("decr failed for key {}: {}", key, e);
                default
            })
    }

    /// Namespace-scoped [`decr`](Self::decr).
    pub async fn decr_in(&self, ns: &str, key: &str, delta: u64, default: u64) -> u64 {
        self.decr_scoped(Some(ns), key, delta, default)
            .await
            .unwrap_or_else(|e| {
                warn!("decr failed for key {}: {}", key, e);
                default
            })
    }

    /// Decrement by one, seeding an absent key with zero.
    pub async fn decr_one(&self, key: &str) -> u64 {
        self.decr(key, 1, 0).await
    }

    async fn incr_scoped(
        &self,
        ns: Option<&str>,
        key: &str,
        delta: u64,
        default: u64,
    ) -> Result<u64> {
        let pkey = self.physical_key(ns, key).await?;
        if let Some(seeded) = self.seed_counter(&pkey, default).await? {
            return Ok(seeded);
        }
        self.backend.incr(&pkey, delta).await
    }

    async fn decr_scoped(
        &self,
        ns: Option<&str>,
        key: &str,
        delta: u64,
        default: u64,
    ) -> Result<u64> {
        let pkey = self.physical_key(ns, key).await?;
        if let Some(seeded) = self.seed_counter(&pkey, default).await? {
            return Ok(seeded);
        }
        self.backend.decr(&pkey, delta).await
    }

    /// Seed an absent counter with `default` and report the seeded value;
    /// `None` means the key already exists and the caller should count.
    async fn seed_counter(&self, pkey: &str, default: u64) -> Result<Option<u64>> {
        if self.backend.get(pkey).await?.is_some() {
            return Ok(None);
        }
        self.backend
            .add(pkey, default.to_string().into_bytes(), self.resolve_ttl(None))
            .await?;
        Ok(Some(default))
    }

    // ---- check-and-set ------------------------------------------------

    /// Fetch `key` together with its CAS token.
    ///
    /// CAS operations address the physical key directly and do not take
    /// part in namespace scoping.
    pub async fn try_gets<V: DeserializeOwned>(&self, key: &str) -> Result<Option<(V, u64)>> {
        validate_key(key)?;
        match self.backend.gets(key).await? {
            Some((raw, token)) => Ok(Some((serde_json::from_slice(&raw)?, token))),
            None => Ok(None),
        }
    }

    /// Fail-soft [`try_gets`](Self::try_gets): faults collapse to `None`.
    pub async fn gets<V: DeserializeOwned>(&self, key: &str) -> Option<(V, u64)> {
        self.try_gets(key).await.unwrap_or_else(|e| {
            warn!("gets failed for key {}: {}", key, e);
            None
        })
    }

    /// Swap in `value` if the entry's CAS token still equals `token`.
    ///
    /// Exactly one attempt is made; a lost race reports `false` rather
    /// than retrying.
    pub async fn try_cas<V: Serialize>(&self, key: &str, token: u64, value: V) -> Result<bool> {
        validate_key(key)?;
        let raw = serde_json::to_vec(&value)?;
        self.backend.cas(key, token, raw, self.resolve_ttl(None)).await
    }

    /// Fail-soft [`try_cas`](Self::try_cas): faults read as `false`.
    pub async fn cas<V: Serialize>(&self, key: &str, token: u64, value: V) -> bool {
        self.try_cas(key, token, value).await.unwrap_or_else(|e| {
            warn!("cas failed for key {}: {}", key, e);
            false
        })
    }

    // ---- administrative -----------------------------------------------

    /// Flush the configured namespace if one is set, otherwise every key
    /// on every server. Failures are logged, never raised.
    pub async fn flush_all(&self) {
        let outcome = match self.default_namespace() {
            Some(ns) => namespace::invalidate(self.backend.as_ref(), ns).await,
            None => self.backend.flush_all().await,
        };
        if let Err(e) = outcome {
            warn!("flush failed: {}", e);
        }
    }

    /// Flush every key held by one backend server.
    pub async fn flush_server(&self, addr: &str) {
        if let Err(e) = self.backend.flush_server(addr).await {
            warn!("flush failed for server {}: {}", addr, e);
        }
    }

    /// Flush a set of backend servers, one at a time.
    pub async fn flush_servers(&self, addrs: &[&str]) {
        for addr in addrs {
            self.flush_server(addr).await;
        }
    }

    /// Invalidate `ns` regardless of the configured default namespace.
    pub async fn flush(&self, ns: &str) {
        if let Err(e) = namespace::invalidate(self.backend.as_ref(), ns).await {
            warn!("flush failed for namespace {}: {}", ns, e);
        }
    }

    /// Grow the pool at runtime. `spec` may name several servers separated
    /// by commas; I/O failures are logged per address.
    pub async fn add_server(&self, spec: &str) {
        for addr in parse_server_spec(spec) {
            let server = WeightedServer {
                addr: addr.clone(),
                weight: 1,
            };
            if let Err(e) = self.backend.add_server(server).await {
                warn!("add server {} failed: {}", addr, e);
            }
        }
    }

    /// Shrink the pool at runtime. Comma-separated like
    /// [`add_server`](Self::add_server).
    pub async fn remove_server(&self, spec: &str) {
        for addr in parse_server_spec(spec) {
            if let Err(e) = self.backend.remove_server(&addr).await {
                warn!("remove server {} failed: {}", addr, e);
            }
        }
    }
}
