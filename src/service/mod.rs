pub mod announcement_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::auth::TokenVerifier;
use crate::repository::*;

pub use announcement_service::AnnouncementService;

pub struct ServiceContext {
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub announcement_service: Arc<AnnouncementService>,
    pub token_verifier: Arc<TokenVerifier>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        announcement_repo: Arc<dyn AnnouncementRepository>,
        token_verifier: Arc<TokenVerifier>,
        db_pool: SqlitePool,
    ) -> Self {
        let announcement_service = Arc::new(AnnouncementService::new(announcement_repo.clone()));

        Self {
            announcement_repo,
            announcement_service,
            token_verifier,
            db_pool,
        }
    }
}
