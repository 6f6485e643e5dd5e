use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use validator::Validate;

use crate::domain::{
    validate_visibility_window, Announcement, Audience, CreateAnnouncementRequest,
    UpdateAnnouncementRequest,
};

use super::{
    board::{AnnouncementBoard, Mutation},
    AnnouncementApi, ApiResult,
};

/// Inline errors keyed by field name (`title`, `content`, `published_at`, `visible_until`).
pub type FieldErrors = BTreeMap<String, String>;

/// Raw create/edit form input. Date fields hold what the user typed:
/// empty, RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct AnnouncementForm {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 20000, message = "Content must be 10-20000 characters"))]
    pub content: String,
    pub audience: Audience,
    pub pinned: bool,
    pub published_at: String,
    pub visible_until: String,
}

/// Form input that passed validation, dates parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub title: String,
    pub content: String,
    pub audience: Audience,
    pub pinned: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub visible_until: Option<DateTime<Utc>>,
}

impl AnnouncementForm {
    /// Prefills the edit form from a stored announcement.
    pub fn from_announcement(announcement: &Announcement) -> Self {
        Self {
            title: announcement.title.clone(),
            content: announcement.content.clone(),
            audience: announcement.audience,
            pinned: announcement.pinned,
            published_at: format_input(announcement.published_at),
            visible_until: announcement
                .visible_until
                .map(format_input)
                .unwrap_or_default(),
        }
    }

    pub fn validate_fields(&self) -> Result<ValidatedForm, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Err(validation) = self.validate() {
            for (field, errs) in validation.field_errors() {
                if let Some(e) = errs.first() {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    errors.insert(field.to_string(), message);
                }
            }
        }
        if self.title.trim().is_empty() {
            errors.insert("title".to_string(), "Title is required".to_string());
        }

        let published_at = parse_input(&self.published_at).unwrap_or_else(|message| {
            errors.insert("published_at".to_string(), message);
            None
        });
        let visible_until = parse_input(&self.visible_until).unwrap_or_else(|message| {
            errors.insert("visible_until".to_string(), message);
            None
        });

        if let Some(until) = visible_until {
            // An empty publish date means "now" on the server.
            let effective_publish = published_at.unwrap_or_else(Utc::now);
            if let Err(message) = validate_visibility_window(effective_publish, Some(until)) {
                errors.insert("visible_until".to_string(), message);
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedForm {
            title: self.title.trim().to_string(),
            content: self.content.clone(),
            audience: self.audience,
            pinned: self.pinned,
            published_at,
            visible_until,
        })
    }

    /// Create payload. An empty `visible_until` is sent as an explicit `null`;
    /// an empty `published_at` is omitted so the server stamps it.
    pub fn to_create_request(&self) -> Result<CreateAnnouncementRequest, FieldErrors> {
        let form = self.validate_fields()?;
        Ok(CreateAnnouncementRequest {
            title: form.title,
            content: form.content,
            audience: form.audience,
            pinned: form.pinned,
            published_at: form.published_at,
            visible_until: form.visible_until,
        })
    }

    /// Edit payload. Every field the form shows is sent; a cleared
    /// `visible_until` becomes `null` so the server clears it.
    pub fn to_update_request(&self) -> Result<UpdateAnnouncementRequest, FieldErrors> {
        let form = self.validate_fields()?;
        Ok(UpdateAnnouncementRequest {
            title: Some(form.title),
            content: Some(form.content),
            audience: Some(form.audience),
            pinned: Some(form.pinned),
            published_at: form.published_at,
            visible_until: Some(form.visible_until),
        })
    }

    /// Validates locally, then creates (`editing == None`) or updates through
    /// the board. Field errors come back before any request is made.
    pub async fn submit<A: AnnouncementApi>(
        &self,
        board: &mut AnnouncementBoard<A>,
        editing: Option<i64>,
    ) -> Result<ApiResult<Announcement>, FieldErrors> {
        let mutation = match editing {
            Some(id) => Mutation::Update(id, self.to_update_request()?),
            None => Mutation::Create(self.to_create_request()?),
        };
        Ok(board.mutate(mutation).await)
    }
}

fn parse_input(value: &str) -> Result<Option<DateTime<Utc>>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| format!("Invalid date: {}", value))
}

fn format_input(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
