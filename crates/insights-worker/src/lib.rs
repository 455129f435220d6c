pub use chess;

pub mod aggregate;
pub mod analyzer;
pub mod castling;
pub mod chess_com;
pub mod config;
pub mod db;
pub mod error;
pub mod eval;
pub mod record;
pub mod replay;
pub mod run_tracker;
pub mod runner;
pub mod scoring;
pub mod stockfish;
