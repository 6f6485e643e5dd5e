use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{Announcement, Audience, NewAnnouncement},
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, content, audience, pinned, published_at, visible_until,
           author_id, created_at, updated_at
    FROM announcements
"#;

#[derive(FromRow)]
struct AnnouncementRow {
    id: i64,
    title: String,
    content: String,
    audience: String,
    pinned: i32,
    published_at: NaiveDateTime,
    visible_until: Option<NaiveDateTime>,
    author_id: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: row.id,
            title: row.title,
            content: row.content,
            audience: row.audience.parse::<Audience>().map_err(AppError::Database)?,
            pinned: row.pinned != 0,
            published_at: DateTime::from_naive_utc_and_offset(row.published_at, Utc),
            visible_until: row.visible_until.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            author_id: row.author_id,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn fetch_where(&self, clause: &str) -> Result<Vec<Announcement>> {
        let sql = format!("{} {} ORDER BY pinned DESC, created_at DESC, id DESC", SELECT_COLUMNS, clause);
        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_announcement)
            .collect()
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement> {
        let pinned_int = if announcement.pinned { 1i32 } else { 0i32 };
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO announcements (
                title, content, audience, pinned, published_at, visible_until,
                author_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.audience.as_str())
        .bind(pinned_int)
        .bind(announcement.published_at.naive_utc())
        .bind(announcement.visible_until.map(|dt| dt.naive_utc()))
        .bind(announcement.author_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_announcement(r)?)),
            None => Ok(None)
        }
    }

    async fn list(&self) -> Result<Vec<Announcement>> {
        self.fetch_where("").await
    }

    async fn list_pinned(&self) -> Result<Vec<Announcement>> {
        self.fetch_where("WHERE pinned = 1").await
    }

    async fn update(&self, announcement: &Announcement) -> Result<Announcement> {
        let pinned_int = if announcement.pinned { 1i32 } else { 0i32 };
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, content = ?, audience = ?, pinned = ?,
                published_at = ?, visible_until = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.audience.as_str())
        .bind(pinned_int)
        .bind(announcement.published_at.naive_utc())
        .bind(announcement.visible_until.map(|dt| dt.naive_utc()))
        .bind(now)
        .bind(announcement.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(announcement.id).await?.ok_or_else(|| {
            AppError::NotFound("Announcement not found".to_string())
        })
    }

    async fn set_pinned(&self, id: i64, pinned: bool) -> Result<Option<Announcement>> {
        let pinned_int = if pinned { 1i32 } else { 0i32 };

        let result = sqlx::query("UPDATE announcements SET pinned = ?, updated_at = ? WHERE id = ?")
            .bind(pinned_int)
            .bind(Utc::now().naive_utc())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM announcements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_pinned(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM announcements WHERE pinned = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM announcements WHERE created_at >= ?"
        )
        .bind(since.naive_utc())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
