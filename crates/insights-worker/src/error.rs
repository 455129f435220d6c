//! Worker error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Malformed commit log entry {line:?}: {reason}")]
    MalformedLogEntry { line: String, reason: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("PGN error: {0}")]
    Pgn(#[from] chess_core::PgnError),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
