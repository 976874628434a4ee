//! Search, tag filtering and pagination over a loaded catalog.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use serde::Serialize;
use tracing::warn;

use crate::{
    cache::{Expiry, ReadThroughCache},
    storage::ObjectStore,
    types::CatalogEntry,
};

/// Rows per page unless the caller asks otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Upper bound for caller-supplied page sizes.
pub const MAX_PAGE_SIZE: usize = 100;

/// Entries in the tag histogram.
pub const TOP_TAGS: usize = 10;

/// Lifetime of playback URLs.
pub const SIGNED_URL_VALIDITY: Duration = Duration::from_secs(60 * 60);

const VIDEO_EXTENSIONS: [&str; 2] = [".mp4", ".mov"];

/// What the user asked to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub query: String,
    pub selected_tags: Vec<String>,
    /// Requested page (1-indexed); clamped when rendering.
    pub page: usize,
}

impl ViewState {
    /// Keep rows matching the text query (summary or any tag) and the tag
    /// selection (any of). Surrounding whitespace in the query is ignored.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.matches_query(entry) && self.matches_tags(entry)
    }

    fn matches_query(&self, entry: &CatalogEntry) -> bool {
        let query = self.query.trim();
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        entry.summary.to_lowercase().contains(&needle)
            || entry.tags.iter().any(|tag| tag.contains(&needle))
    }

    fn matches_tags(&self, entry: &CatalogEntry) -> bool {
        self.selected_tags.is_empty()
            || entry
                .tags
                .iter()
                .any(|tag| self.selected_tags.contains(tag))
    }
}

/// Rows passing the state's filters, in load order.
pub fn filter_entries<'a>(
    entries: &'a [CatalogEntry],
    state: &ViewState,
) -> Vec<&'a CatalogEntry> {
    entries.iter().filter(|entry| state.matches(entry)).collect()
}

/// Pagination metadata calculated from total results and requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages, at least 1
    pub total_pages: usize,
    /// Index of the first row on the page
    pub offset: usize,
    pub page_size: usize,
}

impl Pagination {
    /// Bounds of this page within a result set of `total` rows.
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(total);
        let end = (self.offset + self.page_size).min(total);
        start..end
    }
}

/// Ensures page is within valid bounds [1, total_pages]; an empty result set
/// still has one page.
///
/// ```
/// use clipdex_core::view::calculate_pagination;
///
/// let p = calculate_pagination(45, 3, 20);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 40);
///
/// let p = calculate_pagination(45, 4, 20);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(
    total_results: usize,
    requested_page: usize,
    page_size: usize,
) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size).max(1);
    let page = requested_page.clamp(1, total_pages);

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * page_size,
        page_size,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Tag frequencies over `entries`, most frequent first, ties in first-seen order.
pub fn tag_histogram(entries: &[CatalogEntry], limit: usize) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tag in entries.iter().flat_map(|entry| &entry.tags) {
        match index.get(tag.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(tag.as_str(), counts.len());
                counts.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Every distinct tag, sorted.
pub fn available_tags(entries: &[CatalogEntry]) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Object name for a stored media reference such as `/bucket/videos/a.mp4`.
pub fn object_name_for(media_ref: &str, container: &str) -> String {
    let gs_prefix = format!("gs://{container}/");
    let without_scheme = media_ref.strip_prefix(&gs_prefix).unwrap_or(media_ref);
    without_scheme
        .replace(&format!("/{container}/"), "")
        .trim_start_matches('/')
        .to_string()
}

pub fn is_video(name: &str) -> bool {
    let lower = name.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// How one row's media is presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaLink {
    Video { name: String, url: String },
    File { name: String },
    Unavailable { name: String, warning: String },
}

impl MediaLink {
    pub fn name(&self) -> &str {
        match self {
            MediaLink::Video { name, .. }
            | MediaLink::File { name }
            | MediaLink::Unavailable { name, .. } => name,
        }
    }
}

/// Turns stored media references into playback links.
///
/// Signed URLs are cached per object for half their validity, so a URL handed
/// out is always valid for at least another 30 minutes.
pub struct MediaResolver {
    store: Arc<dyn ObjectStore>,
    validity: Duration,
    urls: ReadThroughCache<String, String>,
}

impl MediaResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_validity(store, SIGNED_URL_VALIDITY)
    }

    pub fn with_validity(store: Arc<dyn ObjectStore>, validity: Duration) -> Self {
        Self {
            store,
            validity,
            urls: ReadThroughCache::new(Expiry::AfterWrite(validity / 2)),
        }
    }

    /// A signing failure only affects this row.
    pub async fn resolve(&self, media_ref: &str) -> MediaLink {
        let name = object_name_for(media_ref, self.store.container());
        if !is_video(&name) {
            return MediaLink::File { name };
        }

        let signed = self
            .urls
            .get_or_try_load(&name, || self.store.signed_url(&name, self.validity))
            .await;
        match signed {
            Ok(url) => MediaLink::Video { name, url },
            Err(e) => {
                warn!("Could not sign URL for {}: {}", name, e);
                MediaLink::Unavailable {
                    warning: format!("Could not load video: {e}"),
                    name,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedRow {
    pub entry: CatalogEntry,
    pub media: MediaLink,
}

/// One fully rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// Rows matching the filters, across all pages.
    pub total: usize,
    pub pagination: Pagination,
    pub rows: Vec<RenderedRow>,
    /// Computed over the whole catalog, not the filtered rows.
    pub top_tags: Vec<TagCount>,
    pub available_tags: Vec<String>,
}

/// Filter, paginate and resolve media for one page of `entries`.
pub async fn render_page(
    entries: &[CatalogEntry],
    state: &ViewState,
    page_size: usize,
    resolver: &MediaResolver,
) -> PageView {
    let filtered = filter_entries(entries, state);
    let pagination = calculate_pagination(filtered.len(), state.page, page_size);

    let mut rows = Vec::with_capacity(pagination.page_size);
    for entry in &filtered[pagination.range(filtered.len())] {
        rows.push(RenderedRow {
            media: resolver.resolve(&entry.video_uri).await,
            entry: (*entry).clone(),
        });
    }

    PageView {
        total: filtered.len(),
        pagination,
        rows,
        top_tags: tag_histogram(entries, TOP_TAGS),
        available_tags: available_tags(entries),
    }
}
