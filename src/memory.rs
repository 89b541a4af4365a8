//! In-process reference backend
//!
//! [`MemoryBackend`] implements the full [`CacheBackend`] contract with
//! the conditional-write, counter, and CAS semantics of a classic cache
//! node. It backs the crate's test suite and works as an embedded cache
//! for single-process deployments.

use crate::backend::{CacheBackend, Connector};
use crate::config::WeightedServer;
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
    cas: u64,
}

impl Entry {
    fn new(data: Vec<u8>, ttl_secs: Option<u64>, cas: u64) -> Self {
        Self {
            data,
            expires_at: ttl_secs.map(|secs| Instant::now() + Duration::from_secs(secs)),
            cas,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory [`CacheBackend`].
///
/// TTLs here are literal seconds: a TTL of zero expires immediately. The
/// "zero means never" sentinel is resolved by the facade before a TTL
/// reaches any backend.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<HashMap<String, Entry>>>,
    cas_counter: Arc<AtomicU64>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    fn next_cas(&self) -> u64 {
        self.cas_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Drop expired entries eagerly instead of waiting for the next read.
    pub fn sweep_expired(&self) {
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|_, entry| !entry.is_expired());
        let removed = before - data.len();
        if removed > 0 {
            debug!("swept {} expired entries", removed);
        }
    }

    /// Spawn a background task sweeping expired entries at `interval`.
    pub fn start_ttl_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let backend = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                backend.sweep_expired();
            }
        })
    }

    fn parse_counter(raw: &[u8], key: &str) -> Result<u64> {
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| CacheError::Backend(format!("value under {key} is not a counter")))
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut data = self.data.write();
        match data.get(key) {
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<bool> {
        let cas = self.next_cas();
        let mut data = self.data.write();
        if data.get(key).is_some_and(|e| !e.is_expired()) {
            return Ok(false);
        }
        data.insert(key.to_string(), Entry::new(value, ttl, cas));
        Ok(true)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<()> {
        let cas = self.next_cas();
        self.data
            .write()
            .insert(key.to_string(), Entry::new(value, ttl, cas));
        Ok(())
    }

    async fn replace(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<bool> {
        let cas = self.next_cas();
        let mut data = self.data.write();
        if !data.get(key).is_some_and(|e| !e.is_expired()) {
            return Ok(false);
        }
        data.insert(key.to_string(), Entry::new(value, ttl, cas));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut data = self.data.write();
        match data.remove(key) {
            Some(entry) if entry.is_expired() => Ok(false),
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn incr(&self, key: &str, delta: u64) -> Result<u64> {
        let cas = self.next_cas();
        let mut data = self.data.write();
        let entry = data
            .get_mut(key)
            .filter(|e| !e.is_expired())
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))?;
        let next = Self::parse_counter(&entry.data, key)?.saturating_add(delta);
        entry.data = next.to_string().into_bytes();
        entry.cas = cas;
        Ok(next)
    }

    async fn decr(&self, key: &str, delta: u64) -> Result<u64> {
        let cas = self.next_cas();
        let mut data = self.data.write();
        let entry = data
            .get_mut(key)
            .filter(|e| !e.is_expired())
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))?;
        // Unsigned counter: floors at zero instead of underflowing
        let next = Self::parse_counter(&entry.data, key)?.saturating_sub(delta);
        entry.data = next.to_string().into_bytes();
        entry.cas = cas;
        Ok(next)
    }

    async fn gets(&self, key: &str) -> Result<Option<(Vec<u8>, u64)>> {
        let mut data = self.data.write();
        match data.get(key) {
            Some(entry) if entry.is_expired() => {
                data.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some((entry.data.clone(), entry.cas))),
            None => Ok(None),
        }
    }

    async fn cas(&self, key: &str, token: u64, value: Vec<u8>, ttl: Option<u64>) -> Result<bool> {
        let cas = self.next_cas();
        let mut data = self.data.write();
        match data.get_mut(key) {
            Some(entry) if !entry.is_expired() && entry.cas == token => {
                *entry = Entry::new(value, ttl, cas);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn flush_all(&self) -> Result<()> {
        self.data.write().clear();
        Ok(())
    }

    async fn flush_server(&self, _addr: &str) -> Result<()> {
        // Single node: flushing "one server" flushes everything
        self.data.write().clear();
        Ok(())
    }

    async fn add_server(&self, server: WeightedServer) -> Result<()> {
        debug!("ignoring add_server({}): single-node backend", server.addr);
        Ok(())
    }

    async fn remove_server(&self, addr: &str) -> Result<()> {
        debug!("ignoring remove_server({}): single-node backend", addr);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.data.write().clear();
        Ok(())
    }
}

/// Connector producing a fresh [`MemoryBackend`].
///
/// There is nothing to dial, so the server list and failure-mode flag are
/// accepted and ignored.
pub struct MemoryConnector;

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        _servers: &[WeightedServer],
        _failure_mode: bool,
    ) -> Result<Arc<dyn CacheBackend>> {
        Ok(Arc::new(MemoryBackend::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_refuses_duplicate() {
        let backend = MemoryBackend::new();
        assert!(backend.add("k", b"one".to_vec(), None).await.unwrap());
        assert!(!backend.add("k", b"two".to_vec(), None).await.unwrap());
        assert_eq!(backend.get("k").await.unwrap(), Some(b"one".to_vec()));
    }

    #[tokio::test]
    async fn test_replace_requires_existing() {
        let backend = MemoryBackend::new();
        assert!(!backend.replace("k", b"v".to_vec(), None).await.unwrap());
        assert_eq!(backend.get("k").await.unwrap(), None);

        backend.set("k", b"old".to_vec(), None).await.unwrap();
        assert!(backend.replace("k", b"new".to_vec(), None).await.unwrap());
        assert_eq!(backend.get("k").await.unwrap(), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        // At this layer TTLs are literal; the never-expire sentinel is the
        // facade's business.
        let backend = MemoryBackend::new();
        backend.set("k", b"v".to_vec(), Some(0)).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_can_be_added_over() {
        let backend = MemoryBackend::new();
        backend.set("k", b"v".to_vec(), Some(0)).await.unwrap();
        assert!(backend.add("k", b"fresh".to_vec(), None).await.unwrap());
        assert_eq!(backend.get("k").await.unwrap(), Some(b"fresh".to_vec()));
    }

    #[tokio::test]
    async fn test_counter_roundtrip_and_floor() {
        let backend = MemoryBackend::new();
        backend.set("c", b"10".to_vec(), None).await.unwrap();
        assert_eq!(backend.incr("c", 5).await.unwrap(), 15);
        assert_eq!(backend.decr("c", 20).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counter_on_missing_key() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.incr("missing", 1).await,
            Err(CacheError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_counter_on_non_numeric_value() {
        let backend = MemoryBackend::new();
        backend.set("c", b"not a number".to_vec(), None).await.unwrap();
        assert!(matches!(
            backend.incr("c", 1).await,
            Err(CacheError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_cas_token_changes_on_write() {
        let backend = MemoryBackend::new();
        backend.set("k", b"one".to_vec(), None).await.unwrap();
        let (_, first) = backend.gets("k").await.unwrap().unwrap();
        backend.set("k", b"two".to_vec(), None).await.unwrap();
        let (_, second) = backend.gets("k").await.unwrap().unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_cas_swaps_only_on_matching_token() {
        let backend = MemoryBackend::new();
        backend.set("k", b"one".to_vec(), None).await.unwrap();
        let (_, token) = backend.gets("k").await.unwrap().unwrap();

        assert!(backend.cas("k", token, b"two".to_vec(), None).await.unwrap());
        assert!(!backend.cas("k", token, b"three".to_vec(), None).await.unwrap());
        assert_eq!(backend.get("k").await.unwrap(), Some(b"two".to_vec()));
    }

    #[tokio::test]
    async fn test_sweep_removes_expired() {
        let backend = MemoryBackend::new();
        backend.set("gone", b"v".to_vec(), Some(0)).await.unwrap();
        backend.set("kept", b"v".to_vec(), None).await.unwrap();
        backend.sweep_expired();
        assert_eq!(backend.data.read().len(), 1);
    }

    #[tokio::test]
    async fn test_flush_all_clears_everything() {
        let backend = MemoryBackend::new();
        backend.set("a", b"1".to_vec(), None).await.unwrap();
        backend.set("b", b"2".to_vec(), None).await.unwrap();
        backend.flush_all().await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), None);
        assert_eq!(backend.get("b").await.unwrap(), None);
    }
}
