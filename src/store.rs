use crate::error::AppError;

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::error;

/// Phone number => call uuid of the most recent call to that number.
#[async_trait]
pub trait CallStore: Send + Sync {
    async fn set(&self, number: &str, call_uuid: &str) -> Result<(), AppError>;
    async fn get(&self, number: &str) -> Result<Option<String>, AppError>;
}

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url).map_err(|e| {
            error!(error=%e, "invalid redis url");
            AppError::Config(format!("invalid redis url: {e}"))
        })?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(error=%e, "failed to connect to redis");
                AppError::Store("redis connection")
            })
    }
}

#[async_trait]
impl CallStore for RedisStore {
    async fn set(&self, number: &str, call_uuid: &str) -> Result<(), AppError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(number, call_uuid).await.map_err(|e| {
            error!(error=%e, number=%number, "redis SET failed");
            AppError::Store("redis set")
        })?;
        Ok(())
    }

    async fn get(&self, number: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.connection().await?;
        conn.get(number).await.map_err(|e| {
            error!(error=%e, number=%number, "redis GET failed");
            AppError::Store("redis get")
        })
    }
}

/// In-process store for tests and local runs without redis.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallStore for MemoryStore {
    async fn set(&self, number: &str, call_uuid: &str) -> Result<(), AppError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Store("memory store poisoned"))?;
        inner.insert(number.to_string(), call_uuid.to_string());
        Ok(())
    }

    async fn get(&self, number: &str) -> Result<Option<String>, AppError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| AppError::Store("memory store poisoned"))?;
        Ok(inner.get(number).cloned())
    }
}
