//! Cache layer for authenticated-user lookups.
//!
//! Strictly an optimization: every caller must behave identically when the
//! cache is disabled, empty, or unreachable (cache-aside). Redis failures
//! are logged and degrade to a miss, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AppError, DatabaseError};
use crate::Result;

#[derive(Debug, Clone)]
pub struct MemoryEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Key-value store with per-key TTL.
///
/// - `Disabled`: every lookup is a miss.
/// - `Memory`: process-local map, used in tests and single-node dev.
/// - `Redis`: shared store for multi-instance deployments.
#[derive(Clone)]
pub enum UserCache {
    Disabled,
    Memory(Arc<RwLock<HashMap<String, MemoryEntry>>>),
    Redis(ConnectionManager),
}

impl UserCache {
    pub fn disabled() -> Self {
        UserCache::Disabled
    }

    pub fn memory() -> Self {
        UserCache::Memory(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Connects to Redis. A configured-but-unreachable cache server is a
    /// startup error rather than a silent downgrade.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::Config(format!("invalid redis url: {}", e)))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Unavailable(e.to_string())))?;
        Ok(UserCache::Redis(manager))
    }

    pub fn mode(&self) -> &'static str {
        match self {
            UserCache::Disabled => "disabled",
            UserCache::Memory(_) => "memory",
            UserCache::Redis(_) => "redis",
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self {
            UserCache::Disabled => None,
            UserCache::Memory(map) => {
                {
                    let map = map.read().await;
                    match map.get(key) {
                        Some(entry) if !entry.is_expired() => {
                            return Some(entry.value.clone());
                        }
                        Some(_) => {}
                        None => return None,
                    }
                }
                // Expired entry: drop it under the write lock.
                map.write().await.remove(key);
                None
            }
            UserCache::Redis(manager) => {
                let mut conn = manager.clone();
                match conn.get::<_, Option<String>>(key).await {
                    Ok(value) => {
                        debug!(key = %key, hit = value.is_some(), "cache get");
                        value
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "cache get failed");
                        None
                    }
                }
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        match self {
            UserCache::Disabled => {}
            UserCache::Memory(map) => {
                let entry = MemoryEntry {
                    value: value.to_string(),
                    expires_at: Utc::now() + Duration::seconds(ttl_secs as i64),
                };
                map.write().await.insert(key.to_string(), entry);
            }
            UserCache::Redis(manager) => {
                let mut conn = manager.clone();
                if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl_secs).await {
                    warn!(key = %key, error = %e, "cache set failed");
                }
            }
        }
    }

    pub async fn invalidate(&self, key: &str) {
        match self {
            UserCache::Disabled => {}
            UserCache::Memory(map) => {
                map.write().await.remove(key);
            }
            UserCache::Redis(manager) => {
                let mut conn = manager.clone();
                if let Err(e) = conn.del::<_, ()>(key).await {
                    warn!(key = %key, error = %e, "cache invalidate failed");
                }
            }
        }
    }
}
