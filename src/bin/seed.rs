use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::lorem::en::{Paragraph, Sentence},
    Fake,
};
use sqlx::sqlite::SqlitePoolOptions;
use thesis_hub::{
    auth::TokenVerifier,
    config::Settings,
    domain::{Audience, CreateAnnouncementRequest, Role},
    repository::SqliteAnnouncementRepository,
    service::AnnouncementService,
};

/// Fill the database with sample announcements.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Database URL (defaults to the configured one)
    #[arg(long)]
    database_url: Option<String>,

    /// Number of announcements to create
    #[arg(long, default_value_t = 24)]
    count: usize,

    /// User id recorded as the author
    #[arg(long, default_value_t = 1)]
    author_id: i64,

    /// Print an admin bearer token for local testing
    #[arg(long)]
    print_token: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let settings = Settings::new()?;

    println!("🌱 Starting database seeding...");

    let database_url = args.database_url.unwrap_or_else(|| settings.database.url.clone());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    // Run migrations first
    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let repo = Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));
    let service = AnnouncementService::new(repo);

    println!("📢 Creating announcements...");
    let audiences = [Audience::All, Audience::Students, Audience::Teachers, Audience::Public];
    let now = Utc::now();

    for i in 0..args.count {
        let title: String = Sentence(3..8).fake();
        let content: String = Paragraph(2..5).fake();
        // Every seventh one is scheduled for later
        let published_at = if i % 7 == 6 {
            now + Duration::days(3)
        } else {
            now - Duration::days((i % 10) as i64)
        };
        // Every fifth one has already expired
        let visible_until = (i % 5 == 4).then(|| published_at + Duration::hours(1));

        service.create(CreateAnnouncementRequest {
            title: title.trim_end_matches('.').to_string(),
            content,
            audience: audiences[i % audiences.len()],
            pinned: i % 6 == 0,
            published_at: Some(published_at),
            visible_until,
        }, args.author_id, now).await?;
    }

    println!("  ✅ Created {} announcements", args.count);

    if args.print_token {
        let verifier = TokenVerifier::new(&settings.auth);
        let token = verifier.issue(args.author_id, Role::Admin, Duration::days(30))?;
        println!("🔑 Admin token: {}", token);
    }

    println!("🎉 Seeding complete!");
    Ok(())
}
