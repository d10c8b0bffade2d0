use crate::{
    errors::AppError,
    repositories::posts,
    services::tags,
    state::AppState,
    structs::posts::{FeedQuery, PostDetail, PostSummary, TagCount},
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

pub fn new() -> Router<AppState> {
    Router::new()
        .route("/feed", get(feed))
        .route("/tags", get(get_tags))
        .route("/{slug}", get(show))
        .route("/{slug}/cover", get(cover))
}

/// 已發佈文章清單，可用 `?tag=` 過濾
async fn feed(
    Query(query): Query<FeedQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<PostSummary>>, AppError> {
    let tag = query.tag.as_deref().filter(|tag| !tag.is_empty());
    let posts = posts::list_published(state.get_pool(), tag).await?;

    Ok(Json(posts))
}

async fn get_tags(State(state): State<AppState>) -> Result<Json<Vec<TagCount>>, AppError> {
    let counts = tags::published_tag_counts(&state).await?;
    Ok(Json(counts))
}

/// 文章內容，找不到時回 404
async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetail>, AppError> {
    let post = posts::find_published_by_slug(state.get_pool(), &slug).await?;

    Ok(Json(post))
}

async fn cover(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cover = posts::find_cover(state.get_pool(), &slug).await?;

    Ok((
        [
            (header::CONTENT_TYPE, cover.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        cover.bytes,
    ))
}
