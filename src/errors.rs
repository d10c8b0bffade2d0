use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use redis::RedisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("找不到資料: {0}")]
    NotFound(String),
    #[error("資料衝突: {0}")]
    Conflict(String),
    #[error("同步進行中")]
    SyncInProgress,
    #[error("缺少環境變數 {0}")]
    MissingEnv(&'static str),
    #[error("Notion API 回應錯誤 ({status}): {message}")]
    NotionApi { status: u16, message: String },
    #[error("請求失敗: {0}")]
    Request(#[from] reqwest::Error),
    #[error("資料庫錯誤: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Redis 錯誤: {0}")]
    Redis(#[from] RedisError),
    #[error("Redis 連線池錯誤: {0}")]
    RedisPool(String),
    #[error("無效的 json 格式: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<bb8::RunError<RedisError>> for AppError {
    fn from(err: bb8::RunError<RedisError>) -> Self {
        match err {
            bb8::RunError::User(err) => AppError::Redis(err),
            bb8::RunError::TimedOut => AppError::RedisPool("timed out".to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::SyncInProgress => StatusCode::CONFLICT,
            AppError::NotionApi { .. } | AppError::Request(_) => StatusCode::BAD_GATEWAY,
            AppError::MissingEnv(_)
            | AppError::Database(_)
            | AppError::Redis(_)
            | AppError::RedisPool(_)
            | AppError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("{}", self);
        }

        let error_message = self.to_string();
        (status_code, error_message).into_response()
    }
}

/// 單一 block 解碼或渲染失敗，只影響該 block
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BlockError {
    #[error("block 缺少 type 欄位")]
    MissingType,
    #[error("{kind} block 缺少 `{kind}` 內容")]
    MissingPayload { kind: String },
    #[error("{kind} block 格式錯誤: {reason}")]
    Malformed { kind: String, reason: String },
}
