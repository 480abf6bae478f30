//!
//! bloglist HTTP server
//! --------------------
//! This module defines the Axum-based HTTP API for bloglist.
//!
//! Responsibilities:
//! - Login endpoint issuing signed session tokens via the `identity` module.
//! - Public blog listing and like endpoints, token-protected create/delete.
//! - Bearer-token extraction and the uniform JSON error payload.
//! - The test-support surface (`/api/testing/*`), mounted only when the
//!   execution mode is development or test — the routes simply do not exist
//!   in a production router.
//! - Startup wiring: database root creation, store open, first-run demo
//!   feeding, listener bind.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{routing::{delete, get, post}, Router, extract::{Path, State}, Json};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::config::{Config, Mode};
use crate::error::AppError;
use crate::identity::{Authenticator, LoginRequest, TokenSigner};
use crate::seed;
use crate::storage::{Blog, BlogView, SharedStore};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth: Arc<Authenticator>,
    pub mode: Mode,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({"status": "error", "code": self.code_str(), "message": self.message()})))
            .into_response()
    }
}

fn log_startup_folders(db_root: &str) {
    let cwd = std::env::current_dir().ok();
    let db_env = std::env::var("BLOGLIST_DB_FOLDER").ok();
    let db_exists = std::path::Path::new(db_root).exists();
    info!(
        target: "startup",
        "bloglist starting. Folder configuration: cwd={:?}, db_root='{}', BLOGLIST_DB_FOLDER_env={:?}, db_root_exists={}",
        cwd, db_root, db_env, db_exists
    );
}

/// Start the bloglist HTTP server with configuration taken from the
/// environment. Fatal when the signing secret is absent or the database root
/// cannot be prepared.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(Config::from_env()?).await
}

pub async fn run_with_config(cfg: Config) -> anyhow::Result<()> {
    log_startup_folders(&cfg.db_root);

    std::fs::create_dir_all(&cfg.db_root)
        .with_context(|| format!("Failed to create or access database root: {}", cfg.db_root))?;
    let store = SharedStore::new(&cfg.db_root)
        .with_context(|| format!("While opening store under db_root: {}", cfg.db_root))?;

    // First run in production/development feeds the demo fixtures.
    seed::feed_if_empty(&store, cfg.mode).context("While feeding demo data")?;

    let signer = TokenSigner::new(&cfg.token_secret, cfg.token_ttl);
    let auth = Arc::new(Authenticator::new(store.clone(), signer));
    let state = AppState { store, auth, mode: cfg.mode };
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {} ({})", addr, cfg.mode.as_str());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Mount all routes. The testing router exists only for development/test
/// modes; the decision is made here, once, not per request.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(|| async { "bloglist ok" }))
        .route("/health", get(|| async { "ok" }))
        .route("/auth/login", post(login))
        .route("/api/blogs", get(list_blogs).post(create_blog))
        .route("/api/blogs/{id}", delete(delete_blog))
        .route("/api/blogs/{id}/like", post(like_blog));
    if matches!(state.mode, Mode::Development | Mode::Test) {
        app = app
            .route("/api/testing/reset-database", get(reset_database))
            .route("/api/testing/create-user", post(create_user_fixture))
            .route("/api/testing/create-blog", post(create_blog_fixture));
    }
    app.with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let s = value.to_str().ok()?;
    s.strip_prefix("Bearer ")
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let resp = state.auth.login(&payload)?;
    info!(target: "bloglist::auth", "login user={}", resp.username);
    Ok(Json(json!({
        "token": resp.token,
        "username": resp.username,
        "name": resp.name,
        "userId": resp.user_id,
    })))
}

async fn list_blogs(State(state): State<AppState>) -> Json<Vec<BlogView>> {
    Json(state.store.0.lock().list_blogs())
}

#[derive(Debug, Deserialize)]
struct NewBlogPayload {
    title: Option<String>,
    author: Option<String>,
    url: Option<String>,
}

async fn create_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<NewBlogPayload>,
) -> Result<(StatusCode, Json<BlogView>), AppError> {
    let principal = state.auth.authenticate(bearer_token(&headers))?;
    let view = state.store.0.lock().create_blog(
        &principal,
        payload.title.as_deref().unwrap_or(""),
        payload.author.as_deref().unwrap_or(""),
        payload.url.as_deref().unwrap_or(""),
    )?;
    info!(target: "bloglist::api", "blog created id={} by={}", view.id, principal.username);
    Ok((StatusCode::CREATED, Json(view)))
}

// Likes are universally mutable: no token is read here at all. Deletion is
// the ownership-scoped operation, not this.
async fn like_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogView>, AppError> {
    let view = state.store.0.lock().like_blog(id)?;
    Ok(Json(view))
}

async fn delete_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let principal = state.auth.authenticate(bearer_token(&headers))?;
    state.store.0.lock().delete_blog(principal.user_id, id)?;
    info!(target: "bloglist::api", "blog deleted id={} by={}", id, principal.username);
    Ok(StatusCode::NO_CONTENT)
}

// --- test-support surface (never mounted in production) ---

async fn reset_database(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.store.0.lock().reset()?;
    info!(target: "bloglist::testing", "database reset");
    Ok(Json(json!({"status": "ok"})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserFixture {
    username: String,
    name: Option<String>,
    password: String,
    id: Option<Uuid>,
    blogs: Option<Vec<Uuid>>,
}

async fn create_user_fixture(
    State(state): State<AppState>,
    Json(p): Json<CreateUserFixture>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user = state.store.0.lock().insert_user(
        p.id,
        &p.username,
        p.name.as_deref().unwrap_or(""),
        &p.password,
        p.blogs.unwrap_or_default(),
    )?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"id": user.id, "username": user.username, "name": user.name})),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBlogFixture {
    title: String,
    author: Option<String>,
    url: String,
    user_id: Uuid,
    id: Option<Uuid>,
    likes: Option<i64>,
}

async fn create_blog_fixture(
    State(state): State<AppState>,
    Json(p): Json<CreateBlogFixture>,
) -> Result<(StatusCode, Json<Blog>), AppError> {
    let blog = state.store.0.lock().insert_blog(
        p.id,
        &p.title,
        p.author.as_deref().unwrap_or(""),
        &p.url,
        p.user_id,
        p.likes.unwrap_or(0),
    )?;
    Ok((StatusCode::CREATED, Json(blog)))
}
