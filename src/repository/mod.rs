use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::*;
use crate::error::Result;

pub mod announcement_repository;

pub use announcement_repository::SqliteAnnouncementRepository;

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>>;
    /// Every record, pinned first then newest first.
    async fn list(&self) -> Result<Vec<Announcement>>;
    async fn list_pinned(&self) -> Result<Vec<Announcement>>;
    async fn update(&self, announcement: &Announcement) -> Result<Announcement>;
    async fn set_pinned(&self, id: i64, pinned: bool) -> Result<Option<Announcement>>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count(&self) -> Result<i64>;
    async fn count_pinned(&self) -> Result<i64>;
    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64>;
}
