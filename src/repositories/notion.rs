use crate::{
    config::NotionConfig,
    errors::AppError,
    structs::{
        notion::{DatabaseQuery, NotionBlock, NotionPage, PaginatedList},
        posts::{CoverImage, PUBLISHED},
    },
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

const PAGE_SIZE: u32 = 100;

/// 同步流程依賴的遠端來源
#[async_trait]
pub trait NotionSource: Send + Sync {
    async fn fetch_all_published_pages(&self) -> Result<Vec<NotionPage>, AppError>;

    async fn fetch_page_content(&self, page_id: &str) -> Result<Vec<NotionBlock>, AppError>;

    async fn download_image(&self, url: &str) -> Result<CoverImage, AppError>;
}

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(http: Client, config: NotionConfig) -> Self {
        Self { http, config }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.config.token)
            .header("Notion-Version", &self.config.version)
    }

    /// 查詢一頁已發佈文章，依 Date 由新到舊
    async fn query_published(
        &self,
        tag: Option<&str>,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<NotionPage>, AppError> {
        let url = format!(
            "{}/databases/{}/query",
            self.config.api_base, self.config.database_id
        );
        let body = DatabaseQuery {
            filter: published_filter(tag),
            sorts: json!([{ "property": "Date", "direction": "descending" }]),
            start_cursor,
            page_size: PAGE_SIZE,
        };

        let response = self
            .authorized(self.http.post(url))
            .json(&body)
            .send()
            .await?;

        parse_response(response).await
    }

    /// 取所有已發佈頁面，可依 tag 過濾，依 next_cursor 翻頁到最後
    pub async fn fetch_published_pages(
        &self,
        tag: Option<&str>,
    ) -> Result<Vec<NotionPage>, AppError> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let list = self.query_published(tag, cursor.as_deref()).await?;
            pages.extend(list.results);

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!("fetched {} published pages (tag: {:?})", pages.len(), tag);
        Ok(pages)
    }

    async fn fetch_children_page(
        &self,
        page_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<NotionBlock>, AppError> {
        let url = format!("{}/blocks/{}/children", self.config.api_base, page_id);
        let mut query = vec![("page_size", PAGE_SIZE.to_string())];
        if let Some(cursor) = start_cursor {
            query.push(("start_cursor", cursor.to_string()));
        }

        let response = self
            .authorized(self.http.get(url))
            .query(&query)
            .send()
            .await?;

        parse_response(response).await
    }
}

#[async_trait]
impl NotionSource for NotionClient {
    async fn fetch_all_published_pages(&self) -> Result<Vec<NotionPage>, AppError> {
        self.fetch_published_pages(None).await
    }

    async fn fetch_page_content(&self, page_id: &str) -> Result<Vec<NotionBlock>, AppError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let list = self.fetch_children_page(page_id, cursor.as_deref()).await?;
            blocks.extend(list.results);

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blocks)
    }

    async fn download_image(&self, url: &str) -> Result<CoverImage, AppError> {
        let response = self.http.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(CoverImage {
            bytes,
            content_type,
        })
    }
}

fn published_filter(tag: Option<&str>) -> Value {
    let mut conditions = vec![json!({
        "property": "Status",
        "select": { "equals": PUBLISHED }
    })];

    if let Some(tag) = tag {
        conditions.push(json!({
            "property": "Tags",
            "multi_select": { "contains": tag }
        }));
    }

    json!({ "and": conditions })
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AppError::NotionApi {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json::<T>().await?)
}
