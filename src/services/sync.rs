use crate::{
    errors::AppError,
    repositories::{notion::NotionSource, posts::PostStore},
    services::document::parse_blocks,
    structs::{
        notion::{plain_text, NotionPage},
        posts::UpsertPost,
    },
};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

const UNTITLED: &str = "Untitled";

/// 從 page properties 取出的扁平欄位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub notion_id: String,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub status: Option<String>,
    pub cover_image: Option<String>,
}

impl PageMetadata {
    /// 沒有 slug 的 page 回傳 None，整頁略過
    pub fn from_page(page: &NotionPage) -> Option<Self> {
        let props = &page.properties;

        let slug = props
            .slug
            .as_ref()
            .map(|p| plain_text(&p.rich_text).trim().to_string())
            .filter(|slug| !slug.is_empty())?;

        let title = props
            .title
            .as_ref()
            .map(|p| plain_text(&p.title))
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let summary = props
            .summary
            .as_ref()
            .map(|p| plain_text(&p.rich_text))
            .filter(|summary| !summary.is_empty());

        // Date 可能是 `2024-01-15` 或帶時間的 ISO 8601，只取日期
        let published_date = props
            .date
            .as_ref()
            .and_then(|p| p.date.as_ref())
            .and_then(|d| d.start.as_deref())
            .and_then(|start| start.get(..10))
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok());

        let tags = props
            .tags
            .as_ref()
            .map(|p| p.multi_select.iter().map(|t| t.name.clone()).collect())
            .unwrap_or_default();

        let status = props
            .status
            .as_ref()
            .and_then(|p| p.select.as_ref())
            .map(|s| s.name.clone());

        let cover_image = page
            .cover
            .as_ref()
            .and_then(|cover| cover.url())
            .map(str::to_string);

        Some(Self {
            notion_id: page.id.clone(),
            title,
            slug,
            summary,
            published_date,
            tags,
            status,
            cover_image,
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub skipped: usize,
    pub failures: Vec<(String, String)>,
}

pub struct NotionSyncService<S, P> {
    source: S,
    store: P,
    lock: Arc<Mutex<()>>,
}

impl<S: NotionSource, P: PostStore> NotionSyncService<S, P> {
    pub fn new(source: S, store: P, lock: Arc<Mutex<()>>) -> Self {
        Self {
            source,
            store,
            lock,
        }
    }

    /// 同步所有已發佈的 Notion 頁面到本地
    ///
    /// 遠端錯誤中止整次同步；單頁寫入失敗記在 report 裡，繼續處理下一頁。
    /// 同一時間只允許一個同步執行。
    pub async fn sync_all(&self) -> Result<SyncReport, AppError> {
        let _guard = self
            .lock
            .try_lock()
            .map_err(|_| AppError::SyncInProgress)?;

        tracing::info!("Starting Notion sync...");
        let pages = self.source.fetch_all_published_pages().await?;

        let mut report = SyncReport::default();
        for page in &pages {
            let Some(metadata) = PageMetadata::from_page(page) else {
                tracing::warn!("skip page {} without slug", page.id);
                report.skipped += 1;
                continue;
            };

            match self.sync_page(metadata).await {
                Ok(()) => report.synced += 1,
                Err(err @ (AppError::Request(_) | AppError::NotionApi { .. })) => return Err(err),
                Err(err) => {
                    tracing::error!("sync page {} failed: {}", page.id, err);
                    report.failures.push((page.id.clone(), err.to_string()));
                }
            }
        }

        tracing::info!(
            "Notion sync complete. synced: {}, skipped: {}, failed: {}",
            report.synced,
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }

    async fn sync_page(&self, metadata: PageMetadata) -> Result<(), AppError> {
        let blocks = self.source.fetch_page_content(&metadata.notion_id).await?;
        let document = parse_blocks(&blocks);

        let post = UpsertPost {
            notion_id: metadata.notion_id,
            title: metadata.title,
            slug: metadata.slug,
            summary: metadata.summary,
            content: document.html,
            toc: document.toc,
            published_date: metadata.published_date,
            tags: metadata.tags,
            cover_image: metadata.cover_image,
            status: metadata.status,
        };
        self.store.upsert_post(&post).await?;

        if let Some(url) = post.cover_image.as_deref() {
            self.store_cover(&post.notion_id, url).await;
        }

        Ok(())
    }

    /// 封面下載失敗只記錄，不影響文字欄位
    async fn store_cover(&self, notion_id: &str, url: &str) {
        match self.store.has_cover_blob(notion_id).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!("check cover of {} failed: {}", notion_id, err);
                return;
            }
        }

        let result = match self.source.download_image(url).await {
            Ok(cover) => self.store.attach_cover(notion_id, &cover).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            tracing::warn!("store cover of {} failed: {}", notion_id, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{
        notion::NotionBlock,
        posts::CoverImage,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex as StdMutex,
        },
    };

    #[derive(Default)]
    struct FakeSource {
        pages: Vec<NotionPage>,
        blocks: HashMap<String, Vec<NotionBlock>>,
        broken_images: bool,
        fail_blocks_for: Option<String>,
        downloads: AtomicUsize,
    }

    #[async_trait]
    impl NotionSource for FakeSource {
        async fn fetch_all_published_pages(&self) -> Result<Vec<NotionPage>, AppError> {
            Ok(self.pages.clone())
        }

        async fn fetch_page_content(&self, page_id: &str) -> Result<Vec<NotionBlock>, AppError> {
            if self.fail_blocks_for.as_deref() == Some(page_id) {
                return Err(AppError::NotionApi {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(self.blocks.get(page_id).cloned().unwrap_or_default())
        }

        async fn download_image(&self, url: &str) -> Result<CoverImage, AppError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if self.broken_images {
                return Err(AppError::NotionApi {
                    status: 404,
                    message: url.to_string(),
                });
            }
            Ok(CoverImage {
                bytes: url.as_bytes().to_vec(),
                content_type: "image/png".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        posts: StdMutex<HashMap<String, UpsertPost>>,
        covers: StdMutex<HashMap<String, Vec<u8>>>,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl PostStore for MemoryStore {
        async fn upsert_post(&self, post: &UpsertPost) -> Result<(), AppError> {
            let mut posts = self.posts.lock().unwrap();
            let taken = posts
                .values()
                .any(|p| p.slug == post.slug && p.notion_id != post.notion_id);
            if taken {
                return Err(AppError::Conflict(format!("slug `{}`", post.slug)));
            }

            if posts.get(&post.notion_id) != Some(post) {
                self.writes.fetch_add(1, Ordering::SeqCst);
                posts.insert(post.notion_id.clone(), post.clone());
            }
            Ok(())
        }

        async fn has_cover_blob(&self, notion_id: &str) -> Result<bool, AppError> {
            Ok(self.covers.lock().unwrap().contains_key(notion_id))
        }

        async fn attach_cover(&self, notion_id: &str, cover: &CoverImage) -> Result<(), AppError> {
            self.covers
                .lock()
                .unwrap()
                .insert(notion_id.to_string(), cover.bytes.clone());
            Ok(())
        }
    }

    fn rich(text: &str) -> Value {
        json!([{ "plain_text": text }])
    }

    fn page(id: &str, slug: Option<&str>) -> NotionPage {
        let mut properties = json!({
            "Title": { "title": rich(&format!("Post {id}")) },
            "Summary": { "rich_text": rich("summary") },
            "Date": { "date": { "start": "2024-03-01" } },
            "Tags": { "multi_select": [{ "name": "rust" }] },
            "Status": { "select": { "name": "Published" } }
        });
        if let Some(slug) = slug {
            properties["Slug"] = json!({ "rich_text": rich(slug) });
        }

        serde_json::from_value(json!({
            "id": id,
            "properties": properties,
            "cover": { "type": "external", "external": { "url": format!("https://img.test/{id}.png") } }
        }))
        .unwrap()
    }

    fn source(pages: Vec<NotionPage>) -> FakeSource {
        let blocks = pages
            .iter()
            .map(|p| {
                (
                    p.id.clone(),
                    vec![
                        NotionBlock::new("heading_2", json!({ "rich_text": rich("Getting Started") })),
                        NotionBlock::new("paragraph", json!({ "rich_text": rich("body") })),
                    ],
                )
            })
            .collect();

        FakeSource {
            pages,
            blocks,
            ..Default::default()
        }
    }

    fn service(source: FakeSource) -> NotionSyncService<FakeSource, MemoryStore> {
        NotionSyncService::new(source, MemoryStore::default(), Arc::new(Mutex::new(())))
    }

    #[test]
    fn metadata_defaults_for_missing_fields() {
        let page: NotionPage = serde_json::from_value(json!({
            "id": "p1",
            "properties": { "Slug": { "rich_text": rich("hello") } }
        }))
        .unwrap();

        let metadata = PageMetadata::from_page(&page).unwrap();
        assert_eq!(metadata.title, "Untitled");
        assert_eq!(metadata.slug, "hello");
        assert_eq!(metadata.summary, None);
        assert_eq!(metadata.published_date, None);
        assert!(metadata.tags.is_empty());
        assert_eq!(metadata.cover_image, None);
    }

    #[test]
    fn metadata_parses_datetime_start() {
        let page: NotionPage = serde_json::from_value(json!({
            "id": "p1",
            "properties": {
                "Slug": { "rich_text": rich("hello") },
                "Date": { "date": { "start": "2024-01-15T10:00:00.000+09:00" } }
            }
        }))
        .unwrap();

        let metadata = PageMetadata::from_page(&page).unwrap();
        assert_eq!(
            metadata.published_date,
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn blank_slug_is_treated_as_missing() {
        assert_eq!(PageMetadata::from_page(&page("p1", Some("   "))), None);
        assert_eq!(PageMetadata::from_page(&page("p1", None)), None);
    }

    #[tokio::test]
    async fn sync_creates_posts_with_rendered_content() {
        let sync = service(source(vec![page("a", Some("first-post"))]));

        let report = sync.sync_all().await.unwrap();
        assert_eq!(report.synced, 1);

        let posts = sync.store.posts.lock().unwrap();
        let post = posts.get("a").unwrap();
        assert_eq!(post.title, "Post a");
        assert_eq!(post.slug, "first-post");
        assert_eq!(post.status.as_deref(), Some("Published"));
        assert_eq!(post.tags, vec!["rust"]);
        assert_eq!(
            post.content,
            "<h2 id=\"getting-started\">Getting Started</h2><p>body</p>"
        );
        assert_eq!(post.toc[0].id, "getting-started");
        assert_eq!(post.cover_image.as_deref(), Some("https://img.test/a.png"));

        let covers = sync.store.covers.lock().unwrap();
        assert_eq!(covers.get("a").unwrap(), b"https://img.test/a.png");
    }

    #[tokio::test]
    async fn page_without_slug_is_never_persisted() {
        let sync = service(source(vec![page("a", None), page("b", Some("b"))]));

        let report = sync.sync_all().await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.synced, 1);
        let posts = sync.store.posts.lock().unwrap();
        assert!(!posts.contains_key("a"));
        assert!(posts.contains_key("b"));
    }

    #[tokio::test]
    async fn second_sync_changes_nothing() {
        let sync = service(source(vec![page("a", Some("a")), page("b", Some("b"))]));

        sync.sync_all().await.unwrap();
        let snapshot = sync.store.posts.lock().unwrap().clone();
        let writes = sync.store.writes.load(Ordering::SeqCst);

        sync.sync_all().await.unwrap();

        assert_eq!(*sync.store.posts.lock().unwrap(), snapshot);
        assert_eq!(sync.store.writes.load(Ordering::SeqCst), writes);
        // 已有封面就不再下載
        assert_eq!(sync.source.downloads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cover_download_failure_keeps_text_fields() {
        let mut fake = source(vec![page("a", Some("a"))]);
        fake.broken_images = true;
        let sync = service(fake);

        let report = sync.sync_all().await.unwrap();

        assert_eq!(report.synced, 1);
        assert!(report.failures.is_empty());
        assert!(sync.store.posts.lock().unwrap().contains_key("a"));
        assert!(sync.store.covers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_is_reported_and_batch_continues() {
        let sync = service(source(vec![
            page("a", Some("same")),
            page("b", Some("same")),
            page("c", Some("c")),
        ]));

        let report = sync.sync_all().await.unwrap();

        assert_eq!(report.synced, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "b");
        assert!(sync.store.posts.lock().unwrap().contains_key("c"));
    }

    #[tokio::test]
    async fn remote_failure_aborts_the_run() {
        let mut fake = source(vec![page("a", Some("a")), page("b", Some("b"))]);
        fake.fail_blocks_for = Some("a".to_string());
        let sync = service(fake);

        let err = sync.sync_all().await.unwrap_err();

        assert!(matches!(err, AppError::NotionApi { status: 502, .. }));
        assert!(sync.store.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_sync_is_rejected() {
        let lock = Arc::new(Mutex::new(()));
        let sync = NotionSyncService::new(
            source(vec![page("a", Some("a"))]),
            MemoryStore::default(),
            lock.clone(),
        );

        let _running = lock.lock().await;
        let err = sync.sync_all().await.unwrap_err();
        assert!(matches!(err, AppError::SyncInProgress));
    }
}
