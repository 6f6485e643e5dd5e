//! Wire shapes shared by the HTTP handlers and the client library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Announcement, Audience, Pagination};

/// Envelope wrapping every response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(data)
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }
    }
}

/// An announcement as it travels over the wire. The author is exposed as
/// `publishedByUserId`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub audience: Audience,
    #[serde(default)]
    pub pinned: bool,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub visible_until: Option<DateTime<Utc>>,
    pub published_by_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Announcement> for AnnouncementDto {
    fn from(a: Announcement) -> Self {
        Self {
            id: a.id,
            title: a.title,
            content: a.content,
            audience: a.audience,
            pinned: a.pinned,
            published_at: a.published_at,
            visible_until: a.visible_until,
            published_by_user_id: a.author_id,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// DTO to domain: `publishedByUserId` becomes `author_id`, everything else
/// is copied as is.
pub fn map_announcement(dto: AnnouncementDto) -> Announcement {
    Announcement {
        id: dto.id,
        title: dto.title,
        content: dto.content,
        audience: dto.audience,
        pinned: dto.pinned,
        published_at: dto.published_at,
        visible_until: dto.visible_until,
        author_id: dto.published_by_user_id,
        created_at: dto.created_at,
        updated_at: dto.updated_at,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadedFile {
    pub path: String,
}
