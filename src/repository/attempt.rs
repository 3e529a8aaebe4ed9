//! Attempt store port and backends
//!
//! Durable per-identifier resend history. The in-memory backend serves a
//! single instance (and tests); the Redis backend lets multiple instances
//! share admission state, with retention handled by key TTL.

use crate::domain::AttemptRecord;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::collections::HashMap;
use std::sync::Mutex;

/// Key prefixes
mod keys {
    pub const ATTEMPTS: &str = "mailgate:attempts";
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn get(&self, identifier: &str) -> Result<Option<AttemptRecord>>;
    async fn upsert(&self, record: &AttemptRecord) -> Result<()>;
    /// Administrative/test operation; the gate never deletes
    async fn delete(&self, identifier: &str) -> Result<()>;
    /// Drop records idle past retention; returns how many were removed
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Process-local attempt store
pub struct InMemoryAttemptStore {
    records: Mutex<HashMap<String, AttemptRecord>>,
    retention: Duration,
}

impl InMemoryAttemptStore {
    pub fn new(retention: std::time::Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            retention: Duration::from_std(retention).unwrap_or_else(|_| Duration::seconds(86400)),
        }
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn get(&self, identifier: &str) -> Result<Option<AttemptRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(identifier).cloned())
    }

    async fn upsert(&self, record: &AttemptRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.identifier.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        records.remove(identifier);
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - self.retention;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, record| !record.expired(cutoff));
        Ok(before - records.len())
    }
}

/// Redis-backed attempt store
///
/// Records are JSON values under `mailgate:attempts:<identifier>` with the
/// retention window as TTL; every upsert refreshes the TTL, so the sweep is
/// a no-op here.
#[derive(Clone)]
pub struct RedisAttemptStore {
    conn: ConnectionManager,
    retention_secs: u64,
}

impl RedisAttemptStore {
    pub async fn connect(url: &str, retention: std::time::Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e)))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self {
            conn,
            retention_secs: retention.as_secs().max(1),
        })
    }

    fn key(identifier: &str) -> String {
        format!("{}:{}", keys::ATTEMPTS, identifier)
    }
}

#[async_trait]
impl AttemptStore for RedisAttemptStore {
    async fn get(&self, identifier: &str) -> Result<Option<AttemptRecord>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::key(identifier)).await?;

        match value {
            Some(v) => {
                let record = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Attempt record deserialize error: {}", e))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, record: &AttemptRecord) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(record).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Attempt record serialize error: {}", e))
        })?;

        let _: () = conn
            .set_ex(Self::key(&record.identifier), serialized, self.retention_secs)
            .await?;
        Ok(())
    }

    async fn delete(&self, identifier: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(identifier)).await?;
        Ok(())
    }

    async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<usize> {
        // Key TTL handles retention
        Ok(0)
    }
}
