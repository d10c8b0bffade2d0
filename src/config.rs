use crate::errors::AppError;
use std::env::var;

const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_SYNC_CRON: &str = "0 0 * * * *"; // 每小時執行一次
const DEFAULT_TAG_COUNTS_TTL_SECS: u64 = 3600;

/// Notion 連線設定，建立 client 時明確傳入
#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
    pub api_base: String,
    pub version: String,
}

impl NotionConfig {
    pub fn new(token: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            database_id: database_id.into(),
            api_base: DEFAULT_NOTION_API_BASE.to_string(),
            version: DEFAULT_NOTION_VERSION.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub database_url: String,
    pub redis_url: String,
    pub notion: NotionConfig,
    pub sync_cron: String,
    pub sync_enabled: bool,
    pub tag_counts_ttl_secs: u64,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(AppError::MissingEnv(key))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mut notion = NotionConfig::new(required("NOTION_TOKEN")?, required("NOTION_DATABASE_ID")?)
            .with_api_base(optional("NOTION_API_BASE", DEFAULT_NOTION_API_BASE));
        notion.version = optional("NOTION_VERSION", DEFAULT_NOTION_VERSION);

        let tag_counts_ttl_secs = lookup("TAG_COUNTS_TTL_SECS")
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TAG_COUNTS_TTL_SECS);

        let cors_origins = optional("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: optional("APP_HOST", "0.0.0.0"),
            port: optional("APP_PORT", "3000"),
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            notion,
            sync_cron: optional("NOTION_SYNC_CRON", DEFAULT_SYNC_CRON),
            sync_enabled: optional("ENABLE_NOTION_SYNC_JOB", "true") == "true",
            tag_counts_ttl_secs,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
