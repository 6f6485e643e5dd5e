use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::domain::{Announcement, CreateAnnouncementRequest, UpdateAnnouncementRequest};

use super::{
    filter::{AnnouncementFilter, PageView, Pager, ADMIN_PAGE_SIZE},
    AnnouncementApi, ApiResult, SlideParams,
};

/// Which server list the board mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// `GET /` with every record.
    All,
    /// `GET /slide` with the given page.
    Slides(SlideParams),
}

/// A write against the store. The board re-fetches after a successful one.
#[derive(Debug, Clone)]
pub enum Mutation {
    Create(CreateAnnouncementRequest),
    Update(i64, UpdateAnnouncementRequest),
    SetPinned(i64, bool),
    Delete(i64),
}

/// Read side of a board's loading flag, shareable with whatever renders
/// the board while `load` is awaiting.
#[derive(Debug, Clone, Default)]
pub struct LoadingHandle(Arc<AtomicBool>);

impl LoadingHandle {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Raises the flag for its lifetime; dropping it (completion, error, or the
/// load future being dropped mid-request) lowers it.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag.clone())
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns one page's copy of the announcement collection.
///
/// `load` pulls the collection, `list` derives a filtered page from memory
/// without touching the network, and `mutate` performs a write and then
/// reloads. Boards never share data; a write through one board is not
/// visible in another until that board loads again.
pub struct AnnouncementBoard<A> {
    api: A,
    mode: ListMode,
    items: Vec<Announcement>,
    loading: LoadingHandle,
    error: Option<String>,
    generation: u64,
    pager: Pager,
}

impl<A: AnnouncementApi> AnnouncementBoard<A> {
    pub fn new(api: A, mode: ListMode, page_size: usize) -> Self {
        Self {
            api,
            mode,
            items: Vec::new(),
            loading: LoadingHandle::default(),
            error: None,
            generation: 0,
            pager: Pager::new(page_size),
        }
    }

    /// The admin list: every record, 15 per page.
    pub fn admin(api: A) -> Self {
        Self::new(api, ListMode::All, ADMIN_PAGE_SIZE)
    }

    pub fn items(&self) -> &[Announcement] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// A handle that observes the loading flag while `load` holds the board.
    pub fn loading_handle(&self) -> LoadingHandle {
        self.loading.clone()
    }

    /// Last list-level failure, cleared by the next successful load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetches the collection for the current mode. On failure the previous
    /// collection is kept and the error recorded; calling `load` again retries.
    pub async fn load(&mut self) -> bool {
        let result = {
            let _loading = LoadingGuard::raise(&self.loading.0);
            match self.mode {
                ListMode::All => self.api.get_all().await,
                ListMode::Slides(params) => self.api.get_slides(Some(params)).await,
            }
        };

        match result.into_result() {
            Ok(items) => {
                self.items = items.unwrap_or_default();
                self.error = None;
                self.generation += 1;
                tracing::debug!(count = self.items.len(), "Announcement board loaded");
                true
            }
            Err(error) => {
                tracing::warn!("Loading announcements failed: {}", error);
                self.error = Some(error);
                false
            }
        }
    }

    /// Switches list mode and re-fetches; setting the current mode is a no-op.
    pub async fn set_mode(&mut self, mode: ListMode) -> bool {
        if self.mode == mode {
            return true;
        }
        self.mode = mode;
        self.load().await
    }

    /// The current page of the filtered, sorted collection.
    pub fn list(&mut self, filter: &AnnouncementFilter) -> PageView<Announcement> {
        self.pager.observe(filter, self.generation);
        let filtered = filter.apply(&self.items);
        self.pager.paginate(&filtered)
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pager.set_page(page);
    }

    /// Performs the write and, when it succeeds, reloads the collection.
    /// The write's own result is returned; a failed reload only shows up
    /// in [`error`](Self::error).
    pub async fn mutate(&mut self, op: Mutation) -> ApiResult<Announcement> {
        let result = match op {
            Mutation::Create(payload) => self.api.create(&payload).await,
            Mutation::Update(id, payload) => self.api.update(id, &payload).await,
            Mutation::SetPinned(id, pinned) => self.api.toggle_pin(id, pinned).await,
            Mutation::Delete(id) => {
                let deleted = self.api.delete_one(id).await;
                ApiResult { data: None, error: deleted.error }
            }
        };

        if result.is_ok() {
            self.load().await;
        }
        result
    }
}
