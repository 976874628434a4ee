//! Catalog listing with search, tag filters and pagination.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use clipdex_core::{
    CatalogEntry, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MediaLink, ViewState, render_page,
    view::{RenderedRow, TagCount},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, api::ApiError};

/// Query parameters for GET /api/videos
///
/// Numbers arrive as strings so malformed values produce a JSON error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideosQuery {
    #[serde(default)]
    pub search: String,
    /// Comma-separated tag selection.
    #[serde(default)]
    pub tags: String,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl VideosQuery {
    fn view_state(&self) -> Result<(ViewState, usize), ApiError> {
        let page = parse_number("page", self.page.as_deref())?.unwrap_or(1);
        let page_size = parse_number("pageSize", self.page_size.as_deref())?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let state = ViewState {
            query: self.search.clone(),
            selected_tags: split_tags(&self.tags),
            page,
        };
        Ok((state, page_size))
    }
}

fn parse_number(name: &str, value: Option<&str>) -> Result<Option<usize>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| {
            ApiError::BadRequest(format!("{name} must be a non-negative integer"))
        }),
    }
}

/// "a, b,,c" -> ["a", "b", "c"]
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub summary: String,
    pub tags: Vec<String>,
    /// Empty unless the row is a playable video with a signed URL.
    pub signed_url: String,
    pub video_uri: String,
    pub file_name: String,
    pub warning: Option<String>,
}

impl From<RenderedRow> for VideoItem {
    fn from(row: RenderedRow) -> Self {
        let file_name = row.media.name().to_string();
        let (signed_url, warning) = match row.media {
            MediaLink::Video { url, .. } => (url, None),
            MediaLink::File { .. } => (String::new(), None),
            MediaLink::Unavailable { warning, .. } => (String::new(), Some(warning)),
        };
        Self {
            id: row.entry.source_json_path,
            summary: row.entry.summary,
            tags: row.entry.tags,
            signed_url,
            video_uri: row.entry.video_uri,
            file_name,
            warning,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideosResponse {
    pub items: Vec<VideoItem>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub available_tags: Vec<String>,
    /// Count for every tag in the catalog, keyed by tag.
    pub tag_counts: BTreeMap<String, usize>,
    pub top_tags: Vec<TagCount>,
}

/// Occurrences of each tag across the whole catalog.
pub fn count_tags(entries: &[CatalogEntry]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in entries.iter().flat_map(|entry| &entry.tags) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// GET /api/videos?search=&tags=a,b&page=1&pageSize=20
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideosQuery>,
) -> Result<Json<VideosResponse>, ApiError> {
    let (view_state, page_size) = query.view_state()?;
    let entries = state.catalog.load().await?;

    let view = render_page(&entries, &view_state, page_size, &state.resolver).await;
    let tag_counts = count_tags(&entries);

    Ok(Json(VideosResponse {
        total: view.total,
        page: view.pagination.page,
        page_size: view.pagination.page_size,
        total_pages: view.pagination.total_pages,
        items: view.rows.into_iter().map(VideoItem::from).collect(),
        available_tags: view.available_tags,
        tag_counts,
        top_tags: view.top_tags,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub entries: usize,
}

/// POST /api/catalog/reload
///
/// Drops the cached catalog and fetches it again, picking up a new build.
pub async fn reload_catalog(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let entries = state.catalog.reload().await?;
    info!("Catalog reloaded with {} entries", entries.len());
    Ok(Json(ReloadResponse {
        entries: entries.len(),
    }))
}
