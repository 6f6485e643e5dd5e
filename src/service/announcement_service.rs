use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use validator::Validate;

use crate::{
    domain::{
        validate_visibility_window, Announcement, Audience, CreateAnnouncementRequest,
        NewAnnouncement, Pagination, UpdateAnnouncementRequest, Viewer,
    },
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

pub const DEFAULT_SLIDE_LIMIT: i64 = 10;
pub const MAX_SLIDE_LIMIT: i64 = 100;

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepository>,
}

impl AnnouncementService {
    pub fn new(repo: Arc<dyn AnnouncementRepository>) -> Self {
        Self { repo }
    }

    /// Every announcement, including scheduled and expired ones.
    pub async fn list_all(&self) -> Result<Vec<Announcement>> {
        self.repo.list().await
    }

    /// Visible-now announcements for `viewer`, one page at a time.
    pub async fn slides(
        &self,
        viewer: &Viewer,
        page: Option<i64>,
        limit: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Announcement>, Pagination)> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_SLIDE_LIMIT).clamp(1, MAX_SLIDE_LIMIT);

        let visible: Vec<Announcement> = self.repo.list().await?
            .into_iter()
            .filter(|a| a.is_visible_to(viewer, now))
            .collect();

        let pagination = Pagination::new(page, limit, visible.len() as i64);
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let items = visible
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok((items, pagination))
    }

    pub async fn pinned(&self, viewer: &Viewer, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        Ok(self.repo.list_pinned().await?
            .into_iter()
            .filter(|a| a.is_visible_to(viewer, now))
            .collect())
    }

    /// Visible-now announcements addressed to the public audience.
    pub async fn public(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
        Ok(self.repo.list().await?
            .into_iter()
            .filter(|a| a.audience == Audience::Public && a.is_visible_to(&Viewer::Anonymous, now))
            .collect())
    }

    /// Publishers see every record; everyone else only what is visible to them now.
    pub async fn get(&self, id: i64, viewer: &Viewer, now: DateTime<Utc>) -> Result<Announcement> {
        let announcement = self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        if !viewer.is_publisher() && !announcement.is_visible_to(viewer, now) {
            return Err(AppError::NotFound("Announcement not found".to_string()));
        }

        Ok(announcement)
    }

    pub async fn create(
        &self,
        request: CreateAnnouncementRequest,
        author_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Announcement> {
        request.validate()?;
        ensure_title_present(&request.title)?;

        let published_at = request.published_at.unwrap_or(now);
        validate_visibility_window(published_at, request.visible_until)
            .map_err(AppError::Validation)?;

        let announcement = self.repo.create(NewAnnouncement {
            title: request.title,
            content: request.content,
            audience: request.audience,
            pinned: request.pinned,
            published_at,
            visible_until: request.visible_until,
            author_id,
        }).await?;

        tracing::info!(id = announcement.id, author_id, "Announcement created");
        Ok(announcement)
    }

    /// Applies a partial update and re-checks the visibility window
    /// against the merged record.
    pub async fn update(&self, id: i64, request: UpdateAnnouncementRequest) -> Result<Announcement> {
        request.validate()?;
        if let Some(ref title) = request.title {
            ensure_title_present(title)?;
        }

        let mut announcement = self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        request.apply_to(&mut announcement);
        validate_visibility_window(announcement.published_at, announcement.visible_until)
            .map_err(AppError::Validation)?;

        let updated = self.repo.update(&announcement).await?;
        tracing::info!(id, "Announcement updated");
        Ok(updated)
    }

    pub async fn set_pinned(&self, id: i64, pinned: bool) -> Result<Announcement> {
        let announcement = self.repo
            .set_pinned(id, pinned)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        tracing::info!(id, pinned, "Announcement pin changed");
        Ok(announcement)
    }

    /// Hard delete; there is no undo.
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Announcement not found".to_string()));
        }

        tracing::info!(id, "Announcement deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    pub async fn count_pinned(&self) -> Result<i64> {
        self.repo.count_pinned().await
    }

    /// Announcements created during the last seven days.
    pub async fn count_weekly(&self, now: DateTime<Utc>) -> Result<i64> {
        self.repo.count_created_since(now - Duration::days(7)).await
    }
}

fn ensure_title_present(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(())
}
