use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::{compare_for_listing, Announcement};

/// Page size of the admin list.
pub const ADMIN_PAGE_SIZE: usize = 15;
/// Page size of the dashboard "latest" widget.
pub const LATEST_PAGE_SIZE: usize = 6;

/// Filter parameters as they appear in the page URL. Values stay raw so
/// two filters compare equal exactly when the URL parameters do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementFilter {
    pub keyword: Option<String>,
    /// `YYYY-MM-DD`, inclusive from 00:00:00.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive through 23:59:59.999.
    pub end_date: Option<String>,
    /// Only the literals `"true"` and `"false"` filter.
    pub pinned: Option<String>,
}

struct Criteria {
    keyword: Option<String>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    pinned: Option<bool>,
}

impl AnnouncementFilter {
    /// Parses `keyword=exam&pinned=true` (a leading `?` is allowed).
    pub fn from_query(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
    }

    fn criteria(&self) -> Criteria {
        Criteria {
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_lowercase),
            from: self
                .start_date
                .as_deref()
                .and_then(parse_day)
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            until: self
                .end_date
                .as_deref()
                .and_then(parse_day)
                .and_then(|day| day.and_hms_milli_opt(23, 59, 59, 999))
                .map(|dt| dt.and_utc()),
            pinned: match self.pinned.as_deref() {
                Some("true") => Some(true),
                Some("false") => Some(false),
                _ => None,
            },
        }
    }

    pub fn matches(&self, announcement: &Announcement) -> bool {
        self.criteria().accepts(announcement)
    }

    /// Every announcement satisfying all active predicates, in listing order.
    pub fn apply(&self, announcements: &[Announcement]) -> Vec<Announcement> {
        let criteria = self.criteria();
        let mut matched: Vec<Announcement> = announcements
            .iter()
            .filter(|a| criteria.accepts(a))
            .cloned()
            .collect();
        sort_for_listing(&mut matched);
        matched
    }
}

impl Criteria {
    fn accepts(&self, a: &Announcement) -> bool {
        if let Some(keyword) = &self.keyword {
            let hit = a.title.to_lowercase().contains(keyword.as_str())
                || a.content.to_lowercase().contains(keyword.as_str());
            if !hit {
                return false;
            }
        }
        if self.from.is_some_and(|from| a.created_at < from) {
            return false;
        }
        if self.until.is_some_and(|until| a.created_at > until) {
            return false;
        }
        if self.pinned.is_some_and(|pinned| a.pinned != pinned) {
            return false;
        }
        true
    }
}

fn parse_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Stable sort: pinned first, then newest first.
pub fn sort_for_listing(announcements: &mut [Announcement]) {
    announcements.sort_by(compare_for_listing);
}

/// One page of a derived list.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub current_page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub page_size: usize,
    /// Slice bounds into the filtered list, `[start_index, end_index)`.
    pub start_index: usize,
    pub end_index: usize,
}

/// Tracks the current page and resets it to 1 when the filter or the
/// underlying collection changes.
#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    current_page: usize,
    seen: Option<(AnnouncementFilter, u64)>,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            seen: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Resets to page 1 when `filter` or `generation` differs from the last call.
    pub fn observe(&mut self, filter: &AnnouncementFilter, generation: u64) {
        let changed = match &self.seen {
            Some((seen_filter, seen_generation)) => {
                seen_filter != filter || *seen_generation != generation
            }
            None => true,
        };
        if changed {
            self.current_page = 1;
            self.seen = Some((filter.clone(), generation));
        }
    }

    /// Cuts the current page out of `items`, clamping past-the-end pages to the last one.
    pub fn paginate<T: Clone>(&mut self, items: &[T]) -> PageView<T> {
        let total = items.len();
        let total_pages = total.div_ceil(self.page_size);
        self.current_page = self.current_page.clamp(1, total_pages.max(1));

        let start_index = ((self.current_page - 1) * self.page_size).min(total);
        let end_index = (start_index + self.page_size).min(total);

        PageView {
            items: items[start_index..end_index].to_vec(),
            current_page: self.current_page,
            total_pages,
            total,
            page_size: self.page_size,
            start_index,
            end_index,
        }
    }
}
