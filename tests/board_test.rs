use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use thesis_hub::{
    client::{
        board::{AnnouncementBoard, ListMode, Mutation},
        filter::AnnouncementFilter,
        form::AnnouncementForm,
        widgets::{LatestWidget, PinnedSlider, StatsSnapshot, StatsWidget, WidgetState},
        AnnouncementApi, ApiResult, SlideParams,
    },
    domain::{Announcement, Audience, CreateAnnouncementRequest, UpdateAnnouncementRequest},
};

#[derive(Default)]
struct FakeState {
    items: Vec<Announcement>,
    next_id: i64,
    fail_reads: Option<String>,
    fail_writes: Option<String>,
    list_calls: usize,
    write_calls: usize,
    last_slide_params: Option<SlideParams>,
    stall: Option<Arc<Notify>>,
}

/// In-memory stand-in for the HTTP client.
#[derive(Clone, Default)]
struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    fn with_items(items: Vec<Announcement>) -> Self {
        let next_id = items.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.items = items;
            state.next_id = next_id;
        }
        api
    }

    fn fail_reads(&self, message: Option<&str>) {
        self.state.lock().unwrap().fail_reads = message.map(str::to_string);
    }

    fn fail_writes(&self, message: Option<&str>) {
        self.state.lock().unwrap().fail_writes = message.map(str::to_string);
    }

    /// Makes `get_all` wait until the returned gate is notified.
    fn stall(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().stall = Some(gate.clone());
        gate
    }

    fn unstall(&self) {
        self.state.lock().unwrap().stall = None;
    }

    fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }

    fn read(&self, select: impl Fn(&Announcement) -> bool) -> ApiResult<Vec<Announcement>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if let Some(error) = &state.fail_reads {
            return ApiResult::failure(error.clone());
        }
        ApiResult::success(state.items.iter().filter(|&a| select(a)).cloned().collect())
    }

    fn write(
        &self,
        apply: impl FnOnce(&mut FakeState) -> Option<Announcement>,
    ) -> ApiResult<Announcement> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if let Some(error) = &state.fail_writes {
            return ApiResult::failure(error.clone());
        }
        match apply(&mut *state) {
            Some(announcement) => ApiResult::success(announcement),
            None => ApiResult::failure("Not found"),
        }
    }
}

#[async_trait]
impl AnnouncementApi for FakeApi {
    async fn get_all(&self) -> ApiResult<Vec<Announcement>> {
        let stall = self.state.lock().unwrap().stall.clone();
        if let Some(gate) = stall {
            gate.notified().await;
        }
        self.read(|_| true)
    }

    async fn get_slides(&self, params: Option<SlideParams>) -> ApiResult<Vec<Announcement>> {
        self.state.lock().unwrap().last_slide_params = params;
        let limit = params.map_or(10, |p| p.limit as usize);
        self.read(|_| true).map(|items| items.into_iter().take(limit).collect())
    }

    async fn get_pinned(&self) -> ApiResult<Vec<Announcement>> {
        self.read(|a| a.pinned)
    }

    async fn get_public_slides(&self) -> ApiResult<Vec<Announcement>> {
        self.read(|a| a.audience == Audience::Public)
    }

    async fn get_by_id(&self, id: i64) -> ApiResult<Announcement> {
        let state = self.state.lock().unwrap();
        match state.items.iter().find(|a| a.id == id) {
            Some(a) => ApiResult::success(a.clone()),
            None => ApiResult::failure("Not found"),
        }
    }

    async fn create(&self, payload: &CreateAnnouncementRequest) -> ApiResult<Announcement> {
        let payload = payload.clone();
        self.write(move |state| {
            let now = Utc::now();
            let announcement = Announcement {
                id: state.next_id,
                title: payload.title,
                content: payload.content,
                audience: payload.audience,
                pinned: payload.pinned,
                published_at: payload.published_at.unwrap_or(now),
                visible_until: payload.visible_until,
                author_id: 1,
                created_at: now,
                updated_at: now,
            };
            state.next_id += 1;
            state.items.push(announcement.clone());
            Some(announcement)
        })
    }

    async fn update(&self, id: i64, payload: &UpdateAnnouncementRequest) -> ApiResult<Announcement> {
        let payload = payload.clone();
        self.write(move |state| {
            let existing = state.items.iter_mut().find(|a| a.id == id)?;
            payload.apply_to(existing);
            Some(existing.clone())
        })
    }

    async fn toggle_pin(&self, id: i64, pinned: bool) -> ApiResult<Announcement> {
        self.write(move |state| {
            let existing = state.items.iter_mut().find(|a| a.id == id)?;
            existing.pinned = pinned;
            Some(existing.clone())
        })
    }

    async fn delete_one(&self, id: i64) -> ApiResult<()> {
        let result = self.write(move |state| {
            let index = state.items.iter().position(|a| a.id == id)?;
            Some(state.items.remove(index))
        });
        ApiResult { data: None, error: result.error }
    }

    async fn get_all_count(&self) -> ApiResult<i64> {
        self.read(|_| true).map(|items| items.len() as i64)
    }

    async fn get_pinned_count(&self) -> ApiResult<i64> {
        self.read(|a| a.pinned).map(|items| items.len() as i64)
    }

    async fn get_weekly_count(&self) -> ApiResult<i64> {
        let since = Utc::now() - Duration::days(7);
        self.read(move |a| a.created_at >= since).map(|items| items.len() as i64)
    }
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

fn announcement(id: i64, title: &str, pinned: bool, created_at: DateTime<Utc>) -> Announcement {
    Announcement {
        id,
        title: title.to_string(),
        content: format!("{} details for all thesis candidates.", title),
        audience: Audience::All,
        pinned,
        published_at: created_at,
        visible_until: None,
        author_id: 1,
        created_at,
        updated_at: created_at,
    }
}

fn ids(items: &[Announcement]) -> Vec<i64> {
    items.iter().map(|a| a.id).collect()
}

fn sample_items(count: i64) -> Vec<Announcement> {
    (1..=count)
        .map(|id| announcement(id, &format!("Notice {}", id), false, at(id as u32)))
        .collect()
}

#[tokio::test]
async fn test_load_then_list_filters_without_network() -> anyhow::Result<()> {
    let api = FakeApi::with_items(vec![
        announcement(1, "Exam timetable", false, at(1)),
        announcement(2, "Lab closure", true, at(2)),
        announcement(3, "Final exam rooms", false, at(3)),
    ]);
    let mut board = AnnouncementBoard::admin(api.clone());

    assert!(board.load().await);
    assert!(!board.is_loading());
    assert_eq!(api.list_calls(), 1);

    let page = board.list(&AnnouncementFilter::default());
    assert_eq!(ids(&page.items), vec![2, 3, 1]);

    let exams = board.list(&AnnouncementFilter::from_query("?keyword=EXAM")?);
    assert_eq!(ids(&exams.items), vec![3, 1]);

    let pinned = board.list(&AnnouncementFilter::from_query("pinned=true")?);
    assert_eq!(ids(&pinned.items), vec![2]);

    let window = board.list(&AnnouncementFilter::from_query("startDate=2024-03-02&endDate=2024-03-02")?);
    assert_eq!(ids(&window.items), vec![2]);

    // Filtering never refetches
    assert_eq!(api.list_calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_pages_reset_when_filter_or_data_changes() -> anyhow::Result<()> {
    let api = FakeApi::with_items(sample_items(20));
    let mut board = AnnouncementBoard::admin(api.clone());
    board.load().await;

    let filter = AnnouncementFilter::default();
    let first = board.list(&filter);
    assert_eq!(first.total, 20);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items.len(), 15);

    board.go_to_page(2);
    let second = board.list(&filter);
    assert_eq!(second.current_page, 2);
    assert_eq!(second.items.len(), 5);
    assert_eq!((second.start_index, second.end_index), (15, 20));

    // A new filter starts over at page 1
    let narrowed = AnnouncementFilter::from_query("keyword=notice")?;
    assert_eq!(board.list(&narrowed).current_page, 1);

    board.go_to_page(2);
    assert_eq!(board.list(&narrowed).current_page, 2);

    // So does a reload
    board.load().await;
    assert_eq!(board.list(&narrowed).current_page, 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_load_keeps_previous_items() -> anyhow::Result<()> {
    let api = FakeApi::with_items(sample_items(3));
    let mut board = AnnouncementBoard::admin(api.clone());
    assert!(board.load().await);

    api.fail_reads(Some("Network error"));
    assert!(!board.load().await);
    assert_eq!(board.error(), Some("Network error"));
    assert_eq!(board.items().len(), 3);
    assert!(!board.is_loading());

    // Retrying is just another load
    api.fail_reads(None);
    assert!(board.load().await);
    assert_eq!(board.error(), None);

    Ok(())
}

#[tokio::test]
async fn test_mutate_refetches_only_on_success() -> anyhow::Result<()> {
    let api = FakeApi::with_items(sample_items(2));
    let mut board = AnnouncementBoard::admin(api.clone());
    board.load().await;
    assert_eq!(api.list_calls(), 1);

    let pinned = board.mutate(Mutation::SetPinned(1, true)).await;
    assert!(pinned.is_ok());
    assert_eq!(pinned.data.map(|a| a.pinned), Some(true));
    assert_eq!(api.list_calls(), 2);
    assert_eq!(ids(&board.list(&AnnouncementFilter::default()).items), vec![1, 2]);

    let deleted = board.mutate(Mutation::Delete(2)).await;
    assert!(deleted.is_ok());
    assert_eq!(deleted.data, None);
    assert_eq!(api.list_calls(), 3);
    assert_eq!(ids(board.items()), vec![1]);

    api.fail_writes(Some("Forbidden"));
    let refused = board.mutate(Mutation::Delete(1)).await;
    assert_eq!(refused.error.as_deref(), Some("Forbidden"));
    assert_eq!(api.list_calls(), 3);
    assert_eq!(ids(board.items()), vec![1]);

    Ok(())
}

#[tokio::test]
async fn test_switching_mode_reloads() -> anyhow::Result<()> {
    let api = FakeApi::with_items(sample_items(8));
    let mut board = AnnouncementBoard::admin(api.clone());
    board.load().await;
    assert_eq!(board.items().len(), 8);

    let slides = ListMode::Slides(SlideParams { page: 1, limit: 3 });
    assert!(board.set_mode(slides).await);
    assert_eq!(board.mode(), slides);
    assert_eq!(board.items().len(), 3);
    assert_eq!(api.list_calls(), 2);
    assert_eq!(
        api.state.lock().unwrap().last_slide_params,
        Some(SlideParams { page: 1, limit: 3 })
    );

    // Same mode again is a no-op
    assert!(board.set_mode(slides).await);
    assert_eq!(api.list_calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_form_submit_creates_and_edits() -> anyhow::Result<()> {
    let api = FakeApi::with_items(Vec::new());
    let mut board = AnnouncementBoard::admin(api.clone());
    board.load().await;

    let invalid = AnnouncementForm {
        title: String::new(),
        content: "tiny".to_string(),
        ..Default::default()
    };
    let errors = invalid.submit(&mut board, None).await.unwrap_err();
    assert!(errors.contains_key("title"));
    assert!(errors.contains_key("content"));
    assert_eq!(api.write_calls(), 0);

    let form = AnnouncementForm {
        title: "  Proposal deadline  ".to_string(),
        content: "Thesis proposals are due by the end of March.".to_string(),
        audience: Audience::Students,
        pinned: false,
        published_at: String::new(),
        visible_until: "2999-01-01T00:00".to_string(),
    };
    let created = form.submit(&mut board, None).await.expect("form is valid");
    let created = created.data.expect("created announcement");
    assert_eq!(created.title, "Proposal deadline");
    assert!(created.visible_until.is_some());
    assert_eq!(ids(board.items()), vec![created.id]);

    // Clearing the expiry on edit clears it on the record
    let mut edit = AnnouncementForm::from_announcement(&created);
    edit.visible_until.clear();
    edit.pinned = true;
    let updated = edit.submit(&mut board, Some(created.id)).await.expect("form is valid");
    let updated = updated.data.expect("updated announcement");
    assert_eq!(updated.visible_until, None);
    assert!(updated.pinned);
    assert_eq!(board.items().first().map(|a| a.pinned), Some(true));

    Ok(())
}

#[tokio::test]
async fn test_widgets_refresh_only_when_key_changes() -> anyhow::Result<()> {
    let api = FakeApi::with_items(vec![
        announcement(1, "First pinned", true, at(1)),
        announcement(2, "Second pinned", true, at(2)),
        announcement(3, "Regular", false, at(3)),
    ]);

    let mut slider = PinnedSlider::new(api.clone());
    assert_eq!(slider.state(), &WidgetState::Loading);
    assert!(slider.refresh(0).await);
    assert!(!slider.refresh(0).await);
    assert_eq!(api.list_calls(), 1);

    assert_eq!(slider.current().map(|a| a.id), Some(1));
    slider.next();
    assert_eq!(slider.current().map(|a| a.id), Some(2));
    slider.next();
    assert_eq!(slider.current().map(|a| a.id), Some(1));
    slider.prev();
    assert_eq!(slider.current().map(|a| a.id), Some(2));

    // A new key refetches and starts from the first slide
    assert!(slider.refresh(1).await);
    assert_eq!(api.list_calls(), 2);
    assert_eq!(slider.current().map(|a| a.id), Some(1));

    let mut latest = LatestWidget::new(api.clone());
    latest.refresh(0).await;
    assert!(matches!(latest.state(), WidgetState::Ready(items) if items.len() == 3));
    assert_eq!(
        api.state.lock().unwrap().last_slide_params,
        Some(SlideParams { page: 1, limit: 6 })
    );

    Ok(())
}

#[tokio::test]
async fn test_widgets_report_empty_and_failed() -> anyhow::Result<()> {
    let api = FakeApi::with_items(vec![announcement(1, "Regular", false, Utc::now())]);

    let mut slider = PinnedSlider::new(api.clone());
    slider.refresh(0).await;
    assert_eq!(slider.state(), &WidgetState::Empty);
    assert!(slider.current().is_none());
    slider.next();

    let mut stats = StatsWidget::new(api.clone());
    stats.refresh(0).await;
    assert_eq!(
        stats.state(),
        &WidgetState::Ready(StatsSnapshot { total: 1, pinned: 0, weekly: 1 })
    );

    api.fail_reads(Some("Unauthorized"));
    stats.refresh(1).await;
    assert_eq!(stats.state(), &WidgetState::Failed("Unauthorized".to_string()));

    let mut latest = LatestWidget::new(api);
    latest.refresh(0).await;
    assert_eq!(latest.state(), &WidgetState::Failed("Unauthorized".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_loading_flag_is_visible_while_loading() -> anyhow::Result<()> {
    let api = FakeApi::with_items(sample_items(2));
    let gate = api.stall();
    let mut board = AnnouncementBoard::admin(api.clone());
    let handle = board.loading_handle();
    assert!(!handle.is_loading());

    let (loaded, seen_loading) = tokio::join!(board.load(), async {
        tokio::task::yield_now().await;
        let seen = handle.is_loading();
        gate.notify_one();
        seen
    });

    assert!(loaded);
    assert!(seen_loading);
    assert!(!handle.is_loading());
    assert_eq!(board.items().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_abandoned_load_clears_loading_flag() -> anyhow::Result<()> {
    let api = FakeApi::with_items(sample_items(2));
    let _gate = api.stall();
    let mut board = AnnouncementBoard::admin(api.clone());

    let abandoned =
        tokio::time::timeout(std::time::Duration::from_millis(20), board.load()).await;
    assert!(abandoned.is_err());
    assert!(!board.is_loading());
    assert!(board.items().is_empty());

    api.unstall();
    assert!(board.load().await);
    assert_eq!(board.items().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_widgets_retry_same_key_after_failure() -> anyhow::Result<()> {
    let api = FakeApi::with_items(vec![announcement(1, "Pinned notice", true, Utc::now())]);
    api.fail_reads(Some("Network error"));

    let mut slider = PinnedSlider::new(api.clone());
    let mut stats = StatsWidget::new(api.clone());
    assert!(slider.refresh(0).await);
    assert!(stats.refresh(0).await);
    assert_eq!(slider.state(), &WidgetState::Failed("Network error".to_string()));
    assert_eq!(stats.state(), &WidgetState::Failed("Network error".to_string()));

    api.fail_reads(None);
    assert!(slider.refresh(0).await);
    assert!(stats.refresh(0).await);
    assert_eq!(slider.current().map(|a| a.id), Some(1));
    assert_eq!(
        stats.state(),
        &WidgetState::Ready(StatsSnapshot { total: 1, pinned: 1, weekly: 1 })
    );

    // Once it succeeded the key is settled again
    assert!(!slider.refresh(0).await);
    assert!(!stats.refresh(0).await);

    Ok(())
}
