mod notion_sync;

use crate::{config::AppConfig, structs::jobs::AppJob};
use std::sync::Arc;

/// 所有排程任務
pub fn all_jobs(config: &AppConfig) -> Vec<Arc<dyn AppJob>> {
    vec![Arc::new(notion_sync::NotionSyncJob::new(
        config.sync_cron.clone(),
        config.sync_enabled,
    ))]
}
