use crate::domain::Announcement;

use super::{filter::LATEST_PAGE_SIZE, AnnouncementApi, ApiResult, SlideParams};

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState<T> {
    Loading,
    Empty,
    Failed(String),
    Ready(T),
}

fn list_state<T>(result: ApiResult<Vec<T>>) -> WidgetState<Vec<T>> {
    match result.into_result() {
        Err(error) => WidgetState::Failed(error),
        Ok(Some(items)) if !items.is_empty() => WidgetState::Ready(items),
        Ok(_) => WidgetState::Empty,
    }
}

/// Fetch on first refresh ("mount") and whenever the caller bumps the key.
/// A key is only remembered once its fetch has not failed, so refreshing
/// with the same key after a failure retries.
#[derive(Debug, Default)]
struct RefreshGate {
    last_key: Option<u64>,
}

impl RefreshGate {
    fn should_fetch(&self, key: u64) -> bool {
        self.last_key != Some(key)
    }

    fn settle<T>(&mut self, key: u64, state: &WidgetState<T>) {
        self.last_key = match state {
            WidgetState::Failed(_) => None,
            _ => Some(key),
        };
    }
}

/// Carousel over pinned announcements.
pub struct PinnedSlider<A> {
    api: A,
    state: WidgetState<Vec<Announcement>>,
    index: usize,
    gate: RefreshGate,
}

impl<A: AnnouncementApi> PinnedSlider<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: WidgetState::Loading,
            index: 0,
            gate: RefreshGate::default(),
        }
    }

    /// Returns whether a fetch happened.
    pub async fn refresh(&mut self, refresh_key: u64) -> bool {
        if !self.gate.should_fetch(refresh_key) {
            return false;
        }
        self.state = WidgetState::Loading;
        self.state = list_state(self.api.get_pinned().await);
        self.index = 0;
        self.gate.settle(refresh_key, &self.state);
        true
    }

    pub fn state(&self) -> &WidgetState<Vec<Announcement>> {
        &self.state
    }

    pub fn current(&self) -> Option<&Announcement> {
        match &self.state {
            WidgetState::Ready(items) => items.get(self.index),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match &self.state {
            WidgetState::Ready(items) => items.len(),
            _ => 0,
        }
    }

    /// Advances one slide, wrapping to the first. Also what the auto-play tick calls.
    pub fn next(&mut self) {
        let len = self.len();
        if len > 0 {
            self.index = (self.index + 1) % len;
        }
    }

    pub fn prev(&mut self) {
        let len = self.len();
        if len > 0 {
            self.index = (self.index + len - 1) % len;
        }
    }
}

/// Dashboard preview of the first few visible announcements.
pub struct LatestWidget<A> {
    api: A,
    state: WidgetState<Vec<Announcement>>,
    gate: RefreshGate,
}

impl<A: AnnouncementApi> LatestWidget<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: WidgetState::Loading,
            gate: RefreshGate::default(),
        }
    }

    pub async fn refresh(&mut self, refresh_key: u64) -> bool {
        if !self.gate.should_fetch(refresh_key) {
            return false;
        }
        self.state = WidgetState::Loading;
        let params = SlideParams { page: 1, limit: LATEST_PAGE_SIZE as u32 };
        self.state = list_state(self.api.get_slides(Some(params)).await);
        self.gate.settle(refresh_key, &self.state);
        true
    }

    pub fn state(&self) -> &WidgetState<Vec<Announcement>> {
        &self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: i64,
    pub pinned: i64,
    pub weekly: i64,
}

/// The three counters shown on the admin dashboard.
pub struct StatsWidget<A> {
    api: A,
    state: WidgetState<StatsSnapshot>,
    gate: RefreshGate,
}

impl<A: AnnouncementApi> StatsWidget<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: WidgetState::Loading,
            gate: RefreshGate::default(),
        }
    }

    pub async fn refresh(&mut self, refresh_key: u64) -> bool {
        if !self.gate.should_fetch(refresh_key) {
            return false;
        }
        self.state = WidgetState::Loading;

        let (total, pinned, weekly) = tokio::join!(
            self.api.get_all_count(),
            self.api.get_pinned_count(),
            self.api.get_weekly_count(),
        );

        self.state = match (total.into_result(), pinned.into_result(), weekly.into_result()) {
            (Ok(total), Ok(pinned), Ok(weekly)) => WidgetState::Ready(StatsSnapshot {
                total: total.unwrap_or(0),
                pinned: pinned.unwrap_or(0),
                weekly: weekly.unwrap_or(0),
            }),
            (Err(error), _, _) | (_, Err(error), _) | (_, _, Err(error)) => WidgetState::Failed(error),
        };
        self.gate.settle(refresh_key, &self.state);
        true
    }

    pub fn state(&self) -> &WidgetState<StatsSnapshot> {
        &self.state
    }
}
