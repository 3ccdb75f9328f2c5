pub mod authentication;
pub mod cache;
pub mod config;
pub mod csrf;
mod data_formats;
pub mod db_helpers;
pub mod errors;
mod handlers;
pub mod media;
pub mod models;
pub mod pagination;

use anyhow::Context;
pub use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::*, Extension, Router};
pub use data_formats::*;
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{net::TcpListener, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::{MokaPageCache, PageCache};
use config::Config;
use media::MediaStorage;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Everything a handler can reach, shared behind an `Arc` extension.
pub struct AppState {
    pub pool: SqlitePool,
    pub cache: Arc<dyn PageCache>,
    pub media: MediaStorage,
    pub config: Config,
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feedline=info,tower_http=info"));
    // a second init (tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub async fn run_app(config: Config) -> Result<()> {
    let address = config.bind_address;
    let state = build_state(config).await?;
    let listener = TcpListener::bind(address)
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!(%address, "server started");
    serve(listener, make_router(state)).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn build_state(config: Config) -> Result<Arc<AppState>> {
    let pool = init_db(&config.database_url).await?;
    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("Failed to create {}", config.media_root.display()))?;
    Ok(Arc::new(AppState {
        pool,
        cache: Arc::new(MokaPageCache::default()),
        media: MediaStorage::new(config.media_root.clone()),
        config,
    }))
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {db_url}"))?;
    } else {
        tracing::debug!(db_url, "database already exists");
    }
    let pool = SqlitePool::connect(db_url).await?;
    tracing::info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(pool)
}

pub fn make_router(state: Arc<AppState>) -> Router {
    let media = ServeDir::new(state.media.root());
    Router::new()
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route("/profile/:username/follow/", get(profile_follow))
        .route("/profile/:username/unfollow/", get(profile_unfollow))
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(post_edit_form).post(post_edit))
        .route(
            "/posts/:post_id/comment/",
            get(comment_redirect).post(add_comment),
        )
        .route("/create/", get(post_create_form).post(post_create))
        .route("/follow/", get(follow_index))
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", get(logout))
        .route("/about/author/", get(about_author))
        .route("/about/tech/", get(about_tech))
        .route("/check_health", get(alive))
        .nest_service("/media", media)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
