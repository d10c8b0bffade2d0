use crate::{
    errors::AppError,
    structs::posts::{CoverImage, PostDetail, PostSummary, TagCount, UpsertPost, PUBLISHED},
};
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::collections::HashMap;

/// 同步流程寫入本地文章的介面
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn upsert_post(&self, post: &UpsertPost) -> Result<(), AppError>;

    async fn has_cover_blob(&self, notion_id: &str) -> Result<bool, AppError>;

    async fn attach_cover(&self, notion_id: &str, cover: &CoverImage) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    /// insert or update，內容沒變就不動 updated_at
    async fn upsert_post(&self, post: &UpsertPost) -> Result<(), AppError> {
        let query = r#"
            INSERT INTO posts (
                notion_id, title, slug, summary, content, toc,
                published_date, tags, cover_image, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (notion_id)
            DO UPDATE SET
                title = EXCLUDED.title,
                slug = EXCLUDED.slug,
                summary = EXCLUDED.summary,
                content = EXCLUDED.content,
                toc = EXCLUDED.toc,
                published_date = EXCLUDED.published_date,
                tags = EXCLUDED.tags,
                cover_image = EXCLUDED.cover_image,
                status = EXCLUDED.status,
                updated_at = NOW()
            WHERE (
                posts.title, posts.slug, posts.summary, posts.content, posts.toc,
                posts.published_date, posts.tags, posts.status
            ) IS DISTINCT FROM (
                EXCLUDED.title, EXCLUDED.slug, EXCLUDED.summary, EXCLUDED.content, EXCLUDED.toc,
                EXCLUDED.published_date, EXCLUDED.tags, EXCLUDED.status
            )
            -- Notion 託管的封面網址每次都會重新簽名，已存下圖檔後就不再比較
            OR (
                posts.cover_blob IS NULL
                AND posts.cover_image IS DISTINCT FROM EXCLUDED.cover_image
            );
        "#;

        sqlx::query(query)
            .bind(&post.notion_id) // $1
            .bind(&post.title) // $2
            .bind(&post.slug) // $3
            .bind(&post.summary) // $4
            .bind(&post.content) // $5
            .bind(Json(&post.toc)) // $6
            .bind(post.published_date) // $7
            .bind(&post.tags) // $8
            .bind(&post.cover_image) // $9
            .bind(&post.status) // $10
            .execute(&self.pool)
            .await
            .map_err(|err| match err {
                sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                    format!("slug `{}` 已被其他頁面使用 ({})", post.slug, db.message()),
                ),
                other => AppError::from(other),
            })?;

        Ok(())
    }

    async fn has_cover_blob(&self, notion_id: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
                SELECT EXISTS (
                    SELECT 1 FROM posts WHERE notion_id = $1 AND cover_blob IS NOT NULL
                )
            "#,
        )
        .bind(notion_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn attach_cover(&self, notion_id: &str, cover: &CoverImage) -> Result<(), AppError> {
        sqlx::query(
            r#"
                UPDATE posts
                SET cover_blob = $2, cover_content_type = $3, updated_at = NOW()
                WHERE notion_id = $1
            "#,
        )
        .bind(notion_id)
        .bind(&cover.bytes)
        .bind(&cover.content_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// 取已發佈文章，可依 tag 過濾，新的在前
pub async fn list_published(
    pool: &PgPool,
    tag: Option<&str>,
) -> Result<Vec<PostSummary>, AppError> {
    let posts = sqlx::query_as::<_, PostSummary>(
        r#"
            SELECT
                title,
                slug,
                summary,
                published_date,
                tags,
                CASE WHEN cover_blob IS NOT NULL THEN '/blog/' || slug || '/cover'
                     ELSE cover_image END AS cover_url
            FROM posts
            WHERE status = $1 AND ($2::TEXT IS NULL OR $2 = ANY(tags))
            ORDER BY published_date DESC NULLS LAST, id DESC
        "#,
    )
    .bind(PUBLISHED)
    .bind(tag)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// 依 slug 取單篇文章，找不到回傳 NotFound
pub async fn find_published_by_slug(pool: &PgPool, slug: &str) -> Result<PostDetail, AppError> {
    sqlx::query_as::<_, PostDetail>(
        r#"
            SELECT
                title,
                slug,
                summary,
                content,
                toc,
                published_date,
                tags,
                CASE WHEN cover_blob IS NOT NULL THEN '/blog/' || slug || '/cover'
                     ELSE cover_image END AS cover_url,
                created_at,
                updated_at
            FROM posts
            WHERE slug = $1 AND status = $2
        "#,
    )
    .bind(slug)
    .bind(PUBLISHED)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("post `{}`", slug)))
}

pub async fn find_cover(pool: &PgPool, slug: &str) -> Result<CoverImage, AppError> {
    let row: Option<(Vec<u8>, Option<String>)> = sqlx::query_as(
        r#"
            SELECT cover_blob, cover_content_type
            FROM posts
            WHERE slug = $1 AND status = $2 AND cover_blob IS NOT NULL
        "#,
    )
    .bind(slug)
    .bind(PUBLISHED)
    .fetch_optional(pool)
    .await?;

    let (bytes, content_type) =
        row.ok_or_else(|| AppError::NotFound(format!("cover of `{}`", slug)))?;

    Ok(CoverImage {
        bytes,
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
    })
}

/// 所有已發佈文章的 tags，順序同列表
pub async fn published_tags(pool: &PgPool) -> Result<Vec<Vec<String>>, AppError> {
    let tags: Vec<Vec<String>> = sqlx::query_scalar(
        r#"
            SELECT tags
            FROM posts
            WHERE status = $1
            ORDER BY published_date DESC NULLS LAST, id DESC
        "#,
    )
    .bind(PUBLISHED)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

/// 統計 tag 次數，次數多的在前，同次數維持第一次出現的順序
pub fn tally_tags<I>(tag_lists: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut counts: Vec<TagCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for name in tag_lists.into_iter().flatten() {
        match index.get(&name) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(name.clone(), counts.len());
                counts.push(TagCount { name, count: 1 });
            }
        }
    }

    // sort_by 是穩定排序
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
