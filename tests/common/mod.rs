#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chess::{Board, MoveGen};
use insights_worker::db;
use insights_worker::error::WorkerError;
use insights_worker::eval::EngineScore;
use insights_worker::replay::{find_san_move, uci_string};
use insights_worker::stockfish::Engine;
use sqlx::SqlitePool;

pub const TAG: &str = "game-analysed";
pub const USER: &str = "LucidKoala";

/// Short Italian game, LucidKoala playing Black, ends after 6 plies.
pub const ITALIAN: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[White "JezzaShaw"]
[Black "LucidKoala"]
[Result "0-1"]
[UTCDate "2020.11.08"]
[UTCTime "23:10:17"]
[WhiteElo "1011"]
[BlackElo "1009"]
[TimeControl "180+2"]
[ECO "C50"]
[ECOUrl "https://www.chess.com/openings/Italian-Game"]
[Termination "LucidKoala won by resignation"]

1. e4 {[%clk 0:03:01]} 1... e5 {[%clk 0:02:59]} 2. Nf3 {[%clk 0:02:58]} 2... Nc6 {[%clk 0:02:55]} 3. Bc4 {[%clk 0:02:50]} 3... Bc5 {[%clk 0:02:56]} 0-1"#;

/// Scholar's mate, LucidKoala playing White.
pub const SCHOLARS_MATE: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[White "LucidKoala"]
[Black "SomeOpponent"]
[Result "1-0"]
[UTCDate "2020.11.09"]
[UTCTime "08:15:00"]
[WhiteElo "1020"]
[BlackElo "1100"]
[TimeControl "600"]
[Termination "LucidKoala won by checkmate"]

1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0"#;

/// Game set up from a position with Black to move, LucidKoala playing White.
pub const PAWN_ENDGAME: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[White "LucidKoala"]
[Black "Endgamer"]
[Result "1/2-1/2"]
[SetUp "1"]
[FEN "4k3/4p3/8/8/8/8/4P3/4K3 b - - 0 1"]
[UTCDate "2020.11.07"]
[UTCTime "10:00:00"]
[WhiteElo "1000"]
[BlackElo "1000"]
[TimeControl "600"]
[Termination "Game drawn by agreement"]

1... e5 2. e4 Kd7 1/2-1/2"#;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Generate a unique suffix based on timestamp + counter to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{n}", std::process::id(), ts % 1_000_000_000)
}

/// Fresh commit-log path in the temp dir, not yet created.
pub fn temp_log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("insights_{name}_{}.log", unique_suffix()))
}

pub async fn memory_pool() -> SqlitePool {
    let pool = db::create_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

/// FEN after playing `sans` from the initial position, as the analyzer sends it.
pub fn fen_after(sans: &[&str]) -> String {
    sans.iter()
        .fold(Board::default(), |board, san| {
            board.make_move_new(find_san_move(&board, san).unwrap())
        })
        .to_string()
}

/// UCI of `san` played after `before`.
pub fn uci_after(before: &[&str], san: &str) -> String {
    let board = Board::from_str(&fen_after(before)).unwrap();
    uci_string(find_san_move(&board, san).unwrap())
}

/// Engine stand-in. Best moves and evaluations are looked up by FEN;
/// unknown positions get the first legal move and a 0 evaluation.
#[derive(Default)]
pub struct FakeEngine {
    pub best_moves: HashMap<String, String>,
    pub evals: HashMap<String, EngineScore>,
    /// Fail every evaluate call once this many have succeeded
    pub fail_after: Option<usize>,
    pub best_move_calls: usize,
    pub evaluate_calls: usize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(mut self, fen: String, uci: String) -> Self {
        self.best_moves.insert(fen, uci);
        self
    }

    pub fn with_eval(mut self, fen: String, score: EngineScore) -> Self {
        self.evals.insert(fen, score);
        self
    }
}

impl Engine for FakeEngine {
    async fn best_move(&mut self, fen: &str, _depth: u32) -> Result<String, WorkerError> {
        self.best_move_calls += 1;
        if let Some(uci) = self.best_moves.get(fen) {
            return Ok(uci.clone());
        }
        let board = Board::from_str(fen).map_err(|e| WorkerError::Stockfish(format!("{e}")))?;
        MoveGen::new_legal(&board)
            .next()
            .map(uci_string)
            .ok_or_else(|| WorkerError::Stockfish(format!("No best move for {fen}")))
    }

    async fn evaluate(&mut self, fen: &str, _depth: u32) -> Result<EngineScore, WorkerError> {
        if self.fail_after.is_some_and(|n| self.evaluate_calls >= n) {
            return Err(WorkerError::Stockfish("engine process exited".into()));
        }
        self.evaluate_calls += 1;
        Ok(self
            .evals
            .get(fen)
            .copied()
            .unwrap_or(EngineScore::Centipawns(0)))
    }
}
