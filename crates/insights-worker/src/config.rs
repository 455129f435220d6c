//! Worker configuration from environment variables

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::WorkerError;
use crate::scoring::AccuracyCurve;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Tracked chess.com username
    pub username: String,

    /// SQLite connection URL
    pub database_url: String,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Fixed search depth for every engine request in a run
    pub search_depth: u32,

    /// Games played before this date are never analysed
    pub start_date: NaiveDate,

    /// Append-only commit log
    pub commit_log_path: PathBuf,

    /// Tag marking this pipeline's lines in the commit log
    pub commit_log_tag: String,

    pub accuracy_curve: AccuracyCurve,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    /// Call `dotenvy::dotenv()` first to pick up a local `.env`.
    pub fn load() -> Result<Self, WorkerError> {
        let username =
            env::var("CHESS_USERNAME").map_err(|_| WorkerError::Config("CHESS_USERNAME not set"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://insights.db".to_string());

        let stockfish_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let search_depth = env::var("SEARCH_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        let start_date = match env::var("ANALYSIS_START_DATE") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                WorkerError::InvalidConfig(format!("ANALYSIS_START_DATE {raw:?}: {e}"))
            })?,
            Err(_) => default_start_date(),
        };

        let commit_log_path = env::var("COMMIT_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("insights.log"));

        let commit_log_tag =
            env::var("COMMIT_LOG_TAG").unwrap_or_else(|_| "game-analysed".to_string());

        let accuracy_curve = match env::var("ACCURACY_CURVE") {
            Ok(raw) => raw
                .parse()
                .map_err(|e: String| WorkerError::InvalidConfig(format!("ACCURACY_CURVE: {e}")))?,
            Err(_) => AccuracyCurve::default(),
        };

        if search_depth == 0 {
            return Err(WorkerError::InvalidConfig("SEARCH_DEPTH must be positive".into()));
        }

        Ok(Self {
            username,
            database_url,
            stockfish_path,
            search_depth,
            start_date,
            commit_log_path,
            commit_log_tag,
            accuracy_curve,
        })
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}
