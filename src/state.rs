use crate::{
    config::AppConfig,
    errors::AppError,
    repositories::{notion::NotionClient, posts::PgPostStore, redis::RedisTagCountCache},
};
use bb8::Pool;
use bb8_redis::RedisConnectionManager;
use reqwest::Client;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    redis_pool: Pool<RedisConnectionManager>,
    http_client: Client,
    config: Arc<AppConfig>,
    sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        let pool = get_connection(&config.database_url).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| AppError::Database(err.into()))?;

        let manager = RedisConnectionManager::new(config.redis_url.as_str())?;
        let redis_pool = Pool::builder()
            .connection_timeout(Duration::from_secs(3))
            .build(manager)
            .await?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            pool,
            redis_pool,
            http_client,
            config: Arc::new(config),
            sync_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn get_sync_lock(&self) -> Arc<Mutex<()>> {
        self.sync_lock.clone()
    }

    pub fn notion_client(&self) -> NotionClient {
        NotionClient::new(self.http_client.clone(), self.config.notion.clone())
    }

    pub fn post_store(&self) -> PgPostStore {
        PgPostStore::new(self.pool.clone())
    }

    pub fn tag_cache(&self) -> RedisTagCountCache {
        RedisTagCountCache::new(self.redis_pool.clone())
    }
}

async fn get_connection(db_uri: &str) -> Result<PgPool, AppError> {
    // set up connection pool
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(db_uri)
        .await?;

    Ok(pool)
}
