use crate::{errors::AppError, structs::posts::TagCount};
use async_trait::async_trait;
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

pub const TAG_COUNTS_KEY: &str = "post_tag_counts";

/// tag 統計的快取介面
#[async_trait]
pub trait TagCountCache: Send + Sync {
    async fn load(&self) -> Result<Option<Vec<TagCount>>, AppError>;

    async fn store(&self, counts: &[TagCount], ttl_secs: u64) -> Result<(), AppError>;

    async fn clear(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisTagCountCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisTagCountCache {
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagCountCache for RedisTagCountCache {
    async fn load(&self) -> Result<Option<Vec<TagCount>>, AppError> {
        redis_get_json(&self.pool, TAG_COUNTS_KEY).await
    }

    async fn store(&self, counts: &[TagCount], ttl_secs: u64) -> Result<(), AppError> {
        redis_set_json(&self.pool, TAG_COUNTS_KEY, counts, ttl_secs).await
    }

    async fn clear(&self) -> Result<(), AppError> {
        redis_del(&self.pool, TAG_COUNTS_KEY).await
    }
}

/// 讀取 JSON 快取，key 不存在時回傳 None
pub async fn redis_get_json<T: DeserializeOwned>(
    pool: &Pool<RedisConnectionManager>,
    key: &str,
) -> Result<Option<T>, AppError> {
    let mut conn = pool.get().await?;

    let raw: Option<String> = conn.get(key).await?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// 設置帶有效時間的 JSON 快取
pub async fn redis_set_json<T: Serialize + ?Sized>(
    pool: &Pool<RedisConnectionManager>,
    key: &str,
    value: &T,
    ttl_secs: u64,
) -> Result<(), AppError> {
    let mut conn = pool.get().await?;

    let raw = serde_json::to_string(value)?;
    let _: () = conn.set_ex(key, raw, ttl_secs).await?;
    Ok(())
}

pub async fn redis_del(pool: &Pool<RedisConnectionManager>, key: &str) -> Result<(), AppError> {
    let mut conn = pool.get().await?;

    let _: () = conn.del(key).await?;
    Ok(())
}
