//! Drop and recreate the move_results and game_records tables.
//!
//! Operator tooling only; the commit log is left untouched, so delete it too
//! when starting over from scratch.
//!
//! Usage:
//!   cargo run --bin reset-tables -- --yes

use tracing::{info, warn};

use insights_worker::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let _ = dotenvy::dotenv();

    if !std::env::args().any(|a| a == "--yes") {
        warn!("This deletes all analysed moves and games. Re-run with --yes to confirm.");
        return Ok(());
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://insights.db".to_string());
    let pool = db::create_pool(&database_url).await?;
    db::reset_tables(&pool).await?;
    info!(%database_url, "Tables reset");

    pool.close().await;
    Ok(())
}
