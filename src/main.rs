use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity.
    // The signing secret is required but never echoed here.
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var("BLOGLIST_HTTP_PORT").unwrap_or_else(|_| "3000".to_string());
    let db_folder = std::env::var("BLOGLIST_DB_FOLDER").unwrap_or_else(|_| "data".to_string());
    let env_mode = std::env::var("BLOGLIST_ENV").unwrap_or_else(|_| "development".to_string());
    info!(
        target: "bloglist",
        "bloglist starting: RUST_LOG='{}', http_port={}, env={}, db_root='{}'",
        rust_log, http_port, env_mode, db_folder
    );

    bloglist::server::run().await
}
