use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::Viewer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub audience: Audience,
    pub pinned: bool,
    pub published_at: DateTime<Utc>,
    pub visible_until: Option<DateTime<Utc>>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Intended readership of an announcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    All,
    Students,
    Teachers,
    Public,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Students => "students",
            Audience::Teachers => "teachers",
            Audience::Public => "public",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Audience::All),
            "students" => Ok(Audience::Students),
            "teachers" => Ok(Audience::Teachers),
            "public" => Ok(Audience::Public),
            _ => Err(format!("Invalid audience: {}", s)),
        }
    }
}

impl Announcement {
    /// Published and not yet expired at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.published_at <= now && self.visible_until.map_or(true, |until| now < until)
    }

    /// The single "visible now" predicate shared by the server endpoints
    /// and the client views.
    pub fn is_visible_to(&self, viewer: &Viewer, now: DateTime<Utc>) -> bool {
        self.is_active_at(now) && viewer.can_read(self.audience)
    }
}

/// Listing order: pinned first, then newest `created_at` first.
pub fn compare_for_listing(a: &Announcement, b: &Announcement) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// `visible_until` must be absent or not earlier than `published_at`.
pub fn validate_visibility_window(
    published_at: DateTime<Utc>,
    visible_until: Option<DateTime<Utc>>,
) -> Result<(), String> {
    match visible_until {
        Some(until) if until < published_at => {
            Err("visibleUntil must not be earlier than publishedAt".to_string())
        }
        _ => Ok(()),
    }
}

/// Fields resolved by the service and handed to the store on insert.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub audience: Audience,
    pub pinned: bool,
    pub published_at: DateTime<Utc>,
    pub visible_until: Option<DateTime<Utc>>,
    pub author_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 20000, message = "Content must be 10-20000 characters"))]
    pub content: String,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default)]
    pub pinned: bool,
    /// Defaults to the time of creation when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visible_until: Option<DateTime<Utc>>,
}

/// Partial update. Absent fields are left unchanged. For `visible_until`
/// an explicit `null` clears the field while an absent key keeps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 10, max = 20000, message = "Content must be 10-20000 characters"))]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub visible_until: Option<Option<DateTime<Utc>>>,
}

impl UpdateAnnouncementRequest {
    /// Merges the present fields into `announcement`.
    pub fn apply_to(self, announcement: &mut Announcement) {
        if let Some(title) = self.title {
            announcement.title = title;
        }
        if let Some(content) = self.content {
            announcement.content = content;
        }
        if let Some(audience) = self.audience {
            announcement.audience = audience;
        }
        if let Some(pinned) = self.pinned {
            announcement.pinned = pinned;
        }
        if let Some(published_at) = self.published_at {
            announcement.published_at = published_at;
        }
        if let Some(visible_until) = self.visible_until {
            announcement.visible_until = visible_until;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PinRequest {
    pub pinned: bool,
}

// A present key (even `null`) becomes `Some`; serde's default covers the absent key.
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
