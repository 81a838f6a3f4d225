// src/videos/query.rs
//! In-memory search and pagination over a loaded video list, as used by the
//! manage-videos view. The whole gallery is held client-side; filtering and
//! slicing are pure functions of the query.

use super::models::Video;

/// Page sizes offered by the per-page selector
pub const VIDEOS_PER_PAGE_OPTIONS: [usize; 3] = [20, 50, 100];

#[derive(Debug, Clone)]
pub struct VideoQuery {
    /// Case-insensitive substring match against titles; empty matches all
    pub search: String,
    pub per_page: usize,
    /// 1-based
    pub page: usize,
}

impl Default for VideoQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            per_page: VIDEOS_PER_PAGE_OPTIONS[0],
            page: 1,
        }
    }
}

impl VideoQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changing the search term resets to the first page
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self.page = 1;
        self
    }

    /// Changing the page size resets to the first page
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self.page = 1;
        self
    }

    pub fn at_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    fn matches(&self, video: &Video) -> bool {
        self.search.is_empty()
            || video
                .title
                .to_lowercase()
                .contains(&self.search.to_lowercase())
    }

    /// Filter and slice; the requested page is clamped into range
    pub fn apply(&self, videos: &[Video]) -> VideoPage {
        let filtered: Vec<Video> = videos
            .iter()
            .filter(|v| self.matches(v))
            .cloned()
            .collect();

        let total = filtered.len();
        // The builders clamp, but the fields are public.
        let per_page = self.per_page.max(1);
        let total_pages = total.div_ceil(per_page);
        let page = self.page.clamp(1, total_pages.max(1));
        let start = (page - 1) * per_page;
        let end = (start + per_page).min(total);

        VideoPage {
            videos: filtered[start..end].to_vec(),
            total,
            page,
            total_pages,
            start,
            end,
        }
    }
}

/// One page of results plus the figures the view renders
/// ("Showing x-y of n videos", "Page p of t")
#[derive(Debug, Clone)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    /// 0-based start index into the filtered list
    pub start: usize,
    /// Exclusive end index into the filtered list
    pub end: usize,
}

impl VideoPage {
    /// 1-based display range, `None` when there is nothing to show
    pub fn display_range(&self) -> Option<(usize, usize)> {
        if self.total == 0 {
            None
        } else {
            Some((self.start + 1, self.end))
        }
    }
}
