//! Backend driver seam
//!
//! The facade never talks to the wire itself. Everything below the public
//! API goes through [`CacheBackend`], so protocol framing, server
//! selection, connection pooling, and timeouts are entirely the driver's
//! concern.

use crate::config::WeightedServer;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Primitive operations a backend driver must provide.
///
/// The facade performs no retries and enforces no timeouts of its own;
/// a driver that blocks is expected to fail with
/// [`CacheError::Timeout`](crate::CacheError::Timeout) once its own
/// deadline passes.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the raw payload stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` only if `key` is absent. Returns whether the add won.
    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<bool>;

    /// Unconditionally store `value` under `key`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<()>;

    /// Store `value` only if `key` already exists. Returns whether it did.
    async fn replace(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<bool>;

    /// Remove `key`. Returns whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Atomically add `delta` to the counter stored under `key`.
    ///
    /// The stored value must be the ASCII decimal form of an unsigned
    /// integer; the call fails with
    /// [`CacheError::KeyNotFound`](crate::CacheError::KeyNotFound) when the
    /// key is absent.
    async fn incr(&self, key: &str, delta: u64) -> Result<u64>;

    /// Atomically subtract `delta` from the counter stored under `key`.
    ///
    /// Drivers for protocols with unsigned counters floor the result at
    /// zero rather than underflowing.
    async fn decr(&self, key: &str, delta: u64) -> Result<u64>;

    /// Fetch the payload together with its opaque CAS token.
    async fn gets(&self, key: &str) -> Result<Option<(Vec<u8>, u64)>>;

    /// Store `value` only if the entry's CAS token still equals `token`.
    /// Returns whether the swap happened.
    async fn cas(&self, key: &str, token: u64, value: Vec<u8>, ttl: Option<u64>) -> Result<bool>;

    /// Drop every key on every server.
    async fn flush_all(&self) -> Result<()>;

    /// Drop every key held by one server.
    async fn flush_server(&self, addr: &str) -> Result<()>;

    /// Grow the pool with an additional server at runtime.
    async fn add_server(&self, server: WeightedServer) -> Result<()>;

    /// Remove a server from the pool at runtime.
    async fn remove_server(&self, addr: &str) -> Result<()>;

    /// Release every connection held by the pool.
    async fn shutdown(&self) -> Result<()>;
}

/// Builds a backend pool from a weighted server list.
///
/// This is the construction seam used by
/// [`CacheClient::connect`](crate::CacheClient::connect); injecting an
/// already-built handle goes through
/// [`CacheClient::with_backend`](crate::CacheClient::with_backend) instead.
#[async_trait]
pub trait Connector {
    /// Establish the pool. `failure_mode` asks the driver to mark a downed
    /// server and route around it until it recovers, instead of failing
    /// every call that hashes to it.
    async fn connect(
        &self,
        servers: &[WeightedServer],
        failure_mode: bool,
    ) -> Result<Arc<dyn CacheBackend>>;
}
