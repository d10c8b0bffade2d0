use crate::{
    errors::AppError,
    services::{sync::NotionSyncService, tags::invalidate_tag_counts},
    state::AppState,
    structs::jobs::AppJob,
};
use async_trait::async_trait;

#[derive(Clone)]
pub struct NotionSyncJob {
    cron: String,
    enabled: bool,
}

impl NotionSyncJob {
    pub fn new(cron: impl Into<String>, enabled: bool) -> Self {
        Self {
            cron: cron.into(),
            enabled,
        }
    }
}

#[async_trait]
impl AppJob for NotionSyncJob {
    fn name(&self) -> &str {
        "notion_sync"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn cron_expression(&self) -> &str {
        &self.cron
    }

    // 定期把 Notion 已發佈的頁面同步進資料庫
    async fn run(&self, state: AppState) {
        let service = NotionSyncService::new(
            state.notion_client(),
            state.post_store(),
            state.get_sync_lock(),
        );

        match service.sync_all().await {
            Ok(report) if report.failures.is_empty() => {
                tracing::info!("notion sync job success, synced {} posts", report.synced)
            }
            Ok(report) => {
                for (notion_id, err) in &report.failures {
                    tracing::error!("notion sync job: page {} failed: {}", notion_id, err);
                }
            }
            Err(AppError::SyncInProgress) => {
                tracing::warn!("notion sync job skipped: another sync is running");
                return;
            }
            // 中途失敗前可能已寫入部分文章，快取照樣清掉
            Err(err) => tracing::error!("notion sync job failed: {}", err),
        }

        invalidate_tag_counts(&state.tag_cache()).await;
    }
}
