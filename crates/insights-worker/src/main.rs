//! Chess insights worker
//!
//! Fetches a user's chess.com archives, replays every game not yet committed
//! to the commit log through Stockfish, and stores per-move and per-game
//! statistics in SQLite.

use tracing::{error, info};

use insights_worker::analyzer::AnalysisParams;
use insights_worker::chess_com::ChessComClient;
use insights_worker::config::WorkerConfig;
use insights_worker::db;
use insights_worker::run_tracker::RunTracker;
use insights_worker::runner::run_batch;
use insights_worker::stockfish::StockfishEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = WorkerConfig::load()?;
    info!(
        username = %config.username,
        stockfish_path = %config.stockfish_path,
        depth = config.search_depth,
        curve = ?config.accuracy_curve,
        "Worker config loaded"
    );

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!(database_url = %config.database_url, "Database ready");

    let mut tracker = RunTracker::open(
        &config.commit_log_path,
        &config.commit_log_tag,
        &config.username,
    )
    .await?;

    let client = ChessComClient::new()?;
    let archives = client.fetch_archives(&config.username).await?;
    info!(archives = archives.len(), "Fetched archive list");

    let mut pgns = Vec::new();
    for url in &archives {
        pgns.extend(client.fetch_games(url).await?);
    }
    info!(games = pgns.len(), "Fetched games");

    let mut engine = StockfishEngine::new(&config.stockfish_path).await?;
    info!("Stockfish engine ready");

    let params = AnalysisParams {
        depth: config.search_depth,
        curve: config.accuracy_curve,
    };

    let result = run_batch(
        &mut engine,
        &pool,
        &mut tracker,
        params,
        &config.username,
        config.start_date,
        &pgns,
    )
    .await;

    engine.quit().await;
    pool.close().await;

    match result {
        Ok(summary) => {
            info!(
                analysed = summary.games_analysed,
                skipped = summary.games_skipped,
                "Done"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run aborted; the next run resumes from the last committed game");
            Err(e.into())
        }
    }
}
