//! # softcache
//!
//! Fail-soft cache client facade over pluggable key-value backends.
//!
//! ## Features
//!
//! - 🧩 **Pluggable backends**: every wire concern lives behind the
//!   [`CacheBackend`] trait; the facade never touches the network itself
//! - 🛡️ **Fail-soft by default**: backend faults become logged warnings
//!   plus safe defaults, with a strict `try_*` layer when callers need
//!   the real error
//! - 🗂️ **Namespaces**: O(1) bulk invalidation through generation tokens,
//!   no key enumeration
//! - 🔢 **Counters & CAS**: seed-on-first-use increment/decrement and
//!   single-attempt check-and-set
//! - 🔄 **Async/Await**: built on Tokio like the rest of the stack
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use softcache::{CacheClient, CacheConfig, MemoryConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CacheConfig::new(["127.0.0.1:11211", "127.0.0.1:11212"])
//!         .with_default_ttl(300)
//!         .with_namespace("sessions");
//!     let client = CacheClient::connect(config, &MemoryConnector).await?;
//!
//!     client.set("user:1", "John Doe", None).await;
//!     let name: Option<String> = client.get("user:1").await;
//!     println!("Value: {:?}", name);
//!
//!     // Drop every key in the "sessions" namespace in one write
//!     client.flush_all().await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
mod namespace;

pub use backend::{CacheBackend, Connector};
pub use client::CacheClient;
pub use config::{CacheConfig, WeightedServer, parse_server_spec};
pub use error::{CacheError, Result};
pub use key::{MAX_KEY_LEN, validate_key};
pub use memory::{MemoryBackend, MemoryConnector};
