use crate::structs::blocks::TocEntry;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};

pub const PUBLISHED: &str = "Published";

/// 同步時寫入的文章欄位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPost {
    pub notion_id: String,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub toc: Vec<TocEntry>,
    pub published_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CoverImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// 列表用，不含內文
#[derive(Debug, Serialize, FromRow)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PostDetail {
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub toc: Json<Vec<TocEntry>>,
    pub published_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub tag: Option<String>,
}
