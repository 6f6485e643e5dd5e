#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

use thesis_hub::{
    auth::TokenVerifier,
    config::Settings,
    create_app,
    domain::Role,
    repository::SqliteAnnouncementRepository,
    service::ServiceContext,
};

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub verifier: Arc<TokenVerifier>,
}

/// A single-connection in-memory database with migrations applied.
pub async fn memory_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        let pool = memory_pool().await?;

        let mut settings = Settings::default();
        settings.uploads.dir = "target/test-uploads".to_string();

        let verifier = Arc::new(TokenVerifier::new(&settings.auth));
        let repo = Arc::new(SqliteAnnouncementRepository::new(pool.clone()));
        let context = Arc::new(ServiceContext::new(repo, verifier.clone(), pool.clone()));

        Ok(Self {
            router: create_app(context, Arc::new(settings)),
            pool,
            verifier,
        })
    }

    pub fn token(&self, uid: i64, role: Role) -> String {
        self.verifier
            .issue(uid, role, Duration::hours(1))
            .expect("token signing")
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
