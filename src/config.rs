//! Cache client configuration

/// A backend server address with its routing weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedServer {
    /// Server address, typically `host:port`
    pub addr: String,
    /// Relative routing weight; higher receives proportionally more keys
    pub weight: u32,
}

/// Cache client configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backend server addresses, in declaration order
    pub servers: Vec<String>,
    /// Expiration in seconds applied when an operation passes no TTL.
    /// `None` (or an explicit 0) means entries never expire.
    pub default_ttl: Option<u64>,
    /// Namespace applied to operations that do not name one
    pub namespace: Option<String>,
    /// Exclude a downed server from routing instead of failing every call
    pub failure_mode: bool,
}

impl CacheConfig {
    /// Create a configuration for the given server addresses
    pub fn new(servers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            default_ttl: None,
            namespace: None,
            failure_mode: true,
        }
    }

    /// Set the default expiration in seconds
    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl = Some(ttl_secs);
        self
    }

    /// Set the default namespace for unscoped operations
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Enable or disable failure-tolerant routing
    pub fn with_failure_mode(mut self, failure_mode: bool) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    /// Weighted server list handed to the connector. Weight is the 1-based
    /// declaration position, so later-declared servers rank higher.
    pub fn weighted_servers(&self) -> Vec<WeightedServer> {
        self.servers
            .iter()
            .enumerate()
            .map(|(i, addr)| WeightedServer {
                addr: addr.clone(),
                weight: i as u32 + 1,
            })
            .collect()
    }
}

/// Split a comma-separated server spec into individual addresses.
///
/// Blank segments are dropped, so `"a:11211, b:11211,"` yields two
/// addresses.
pub fn parse_server_spec(spec: &str) -> Vec<String> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
