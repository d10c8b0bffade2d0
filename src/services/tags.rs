use crate::{
    errors::AppError,
    repositories::{
        posts::{published_tags, tally_tags},
        redis::TagCountCache,
    },
    state::AppState,
    structs::posts::TagCount,
};
use std::future::Future;

/// `/blog/tags` 用的統計，快取設定取自 config
pub async fn published_tag_counts(state: &AppState) -> Result<Vec<TagCount>, AppError> {
    cached_tag_counts(
        &state.tag_cache(),
        state.get_config().tag_counts_ttl_secs,
        published_tags(state.get_pool()),
    )
    .await
}

/// 先讀快取，沒有就用 `load` 重算並寫回；快取失敗不影響結果
pub async fn cached_tag_counts<C, F>(
    cache: &C,
    ttl_secs: u64,
    load: F,
) -> Result<Vec<TagCount>, AppError>
where
    C: TagCountCache + ?Sized,
    F: Future<Output = Result<Vec<Vec<String>>, AppError>>,
{
    match cache.load().await {
        Ok(Some(cached)) => return Ok(cached),
        Ok(None) => {}
        Err(err) => tracing::warn!("read tag counts cache failed: {}", err),
    }

    let counts = tally_tags(load.await?);

    if let Err(err) = cache.store(&counts, ttl_secs).await {
        tracing::warn!("write tag counts cache failed: {}", err);
    }

    Ok(counts)
}

/// 同步結束後清掉快取，下一次請求重算
pub async fn invalidate_tag_counts<C: TagCountCache + ?Sized>(cache: &C) {
    match cache.clear().await {
        Ok(()) => tracing::debug!("tag counts cache invalidated"),
        Err(err) => tracing::warn!("invalidate tag counts cache failed: {}", err),
    }
}
