//! Common test utilities

use async_trait::async_trait;
use softcache::{
    CacheBackend, CacheClient, CacheConfig, CacheError, Connector, MemoryBackend, Result,
    WeightedServer,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Install a test-writer subscriber so warnings show up with --nocapture
#[allow(dead_code)] // Used by other test modules
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Client over a fresh in-memory backend, no default namespace
#[allow(dead_code)] // Used by other test modules
pub fn memory_client() -> CacheClient {
    memory_client_with(CacheConfig::new(["mem://local"]))
}

/// Client over a fresh in-memory backend with the given config
#[allow(dead_code)] // Used by other test modules
pub fn memory_client_with(config: CacheConfig) -> CacheClient {
    CacheClient::with_backend(Arc::new(MemoryBackend::new()), config)
}

/// Two clients with different configs sharing one backend
#[allow(dead_code)] // Used by namespace tests
pub fn shared_clients(a: CacheConfig, b: CacheConfig) -> (CacheClient, CacheClient) {
    let backend = Arc::new(MemoryBackend::new());
    (
        CacheClient::with_backend(backend.clone(), a),
        CacheClient::with_backend(backend, b),
    )
}

/// Backend that fails every operation with a timeout
#[allow(dead_code)] // Used by fail-soft tests
pub struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(CacheError::Timeout)
    }

    async fn add(&self, _key: &str, _value: Vec<u8>, _ttl: Option<u64>) -> Result<bool> {
        Err(CacheError::Timeout)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<u64>) -> Result<()> {
        Err(CacheError::Timeout)
    }

    async fn replace(&self, _key: &str, _value: Vec<u8>, _ttl: Option<u64>) -> Result<bool> {
        Err(CacheError::Timeout)
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(CacheError::Timeout)
    }

    async fn incr(&self, _key: &str, _delta: u64) -> Result<u64> {
        Err(CacheError::Timeout)
    }

    async fn decr(&self, _key: &str, _delta: u64) -> Result<u64> {
        Err(CacheError::Timeout)
    }

    async fn gets(&self, _key: &str) -> Result<Option<(Vec<u8>, u64)>> {
        Err(CacheError::Timeout)
    }

    async fn cas(&self, _key: &str, _token: u64, _value: Vec<u8>, _ttl: Option<u64>) -> Result<bool> {
        Err(CacheError::Timeout)
    }

    async fn flush_all(&self) -> Result<()> {
        Err(CacheError::Timeout)
    }

    async fn flush_server(&self, _addr: &str) -> Result<()> {
        Err(CacheError::Timeout)
    }

    async fn add_server(&self, _server: WeightedServer) -> Result<()> {
        Err(CacheError::Timeout)
    }

    async fn remove_server(&self, _addr: &str) -> Result<()> {
        Err(CacheError::Timeout)
    }

    async fn shutdown(&self) -> Result<()> {
        Err(CacheError::Timeout)
    }
}

/// Backend that counts how often it is reached and answers benignly
#[allow(dead_code)] // Used by fail-soft tests
#[derive(Default)]
pub struct RecordingBackend {
    calls: AtomicUsize,
}

impl RecordingBackend {
    #[allow(dead_code)] // Used by fail-soft tests
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)] // Reached through the trait impl
    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheBackend for RecordingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        self.record();
        Ok(None)
    }

    async fn add(&self, _key: &str, _value: Vec<u8>, _ttl: Option<u64>) -> Result<bool> {
        self.record();
        Ok(true)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<u64>) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn replace(&self, _key: &str, _value: Vec<u8>, _ttl: Option<u64>) -> Result<bool> {
        self.record();
        Ok(true)
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        self.record();
        Ok(true)
    }

    async fn incr(&self, _key: &str, _delta: u64) -> Result<u64> {
        self.record();
        Ok(0)
    }

    async fn decr(&self, _key: &str, _delta: u64) -> Result<u64> {
        self.record();
        Ok(0)
    }

    async fn gets(&self, _key: &str) -> Result<Option<(Vec<u8>, u64)>> {
        self.record();
        Ok(None)
    }

    async fn cas(&self, _key: &str, _token: u64, _value: Vec<u8>, _ttl: Option<u64>) -> Result<bool> {
        self.record();
        Ok(true)
    }

    async fn flush_all(&self) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn flush_server(&self, _addr: &str) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn add_server(&self, _server: WeightedServer) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn remove_server(&self, _addr: &str) -> Result<()> {
        self.record();
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        self.record();
        Ok(())
    }
}

/// Connector that cannot establish a pool
#[allow(dead_code)] // Used by fail-soft tests
pub struct FailingConnector;

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(
        &self,
        _servers: &[WeightedServer],
        _failure_mode: bool,
    ) -> Result<Arc<dyn CacheBackend>> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

/// Connector that records the weighted server list it was handed
#[allow(dead_code)] // Used by fail-soft tests
#[derive(Default)]
pub struct CapturingConnector {
    pub servers: std::sync::Mutex<Vec<WeightedServer>>,
    pub failure_mode: std::sync::Mutex<Option<bool>>,
}

#[async_trait]
impl Connector for CapturingConnector {
    async fn connect(
        &self,
        servers: &[WeightedServer],
        failure_mode: bool,
    ) -> Result<Arc<dyn CacheBackend>> {
        *self.servers.lock().unwrap() = servers.to_vec();
        *self.failure_mode.lock().unwrap() = Some(failure_mode);
        Ok(Arc::new(MemoryBackend::new()))
    }
}
