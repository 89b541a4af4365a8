//! Namespace scoping via generation tokens
//!
//! A namespace owns a reserved key holding an opaque generation token.
//! The physical key for `(ns, key)` embeds the token, so rotating the
//! token orphans every key written under the namespace in one write,
//! without enumerating them. Orphaned entries age out through their TTL.

use crate::backend::CacheBackend;
use crate::error::Result;
use uuid::Uuid;

/// Reserved-key prefix holding each namespace's generation token.
const TOKEN_KEY_PREFIX: &str = "__softcache_ns";

fn token_key(namespace: &str) -> String {
    format!("{TOKEN_KEY_PREFIX}:{namespace}")
}

fn fresh_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Resolve the physical key for `key` inside `namespace`, seeding the
/// generation token on first use.
///
/// Physical keys grow by the namespace plus a 33-byte token segment, so
/// the backend's key-length limit applies to the expanded form.
pub(crate) async fn scoped_key(
    backend: &dyn CacheBackend,
    namespace: &str,
    key: &str,
) -> Result<String> {
    let token = current_token(backend, namespace).await?;
    Ok(format!("{namespace}:{token}:{key}"))
}

async fn current_token(backend: &dyn CacheBackend, namespace: &str) -> Result<String> {
    let tkey = token_key(namespace);
    if let Some(raw) = backend.get(&tkey).await? {
        return Ok(String::from_utf8_lossy(&raw).into_owned());
    }

    // First use: seed a token. `add` lets exactly one concurrent seeder
    // win, after which everyone reads the winner's token back.
    let fresh = fresh_token();
    if backend.add(&tkey, fresh.clone().into_bytes(), None).await? {
        return Ok(fresh);
    }
    match backend.get(&tkey).await? {
        Some(raw) => Ok(String::from_utf8_lossy(&raw).into_owned()),
        None => {
            // The winning token vanished between our losing add and the
            // re-read (a concurrent global flush); claim it outright.
            backend.set(&tkey, fresh.clone().into_bytes(), None).await?;
            Ok(fresh)
        }
    }
}

/// Rotate `namespace`'s generation token, orphaning every key under it.
pub(crate) async fn invalidate(backend: &dyn CacheBackend, namespace: &str) -> Result<()> {
    backend
        .set(&token_key(namespace), fresh_token().into_bytes(), None)
        .await
}
