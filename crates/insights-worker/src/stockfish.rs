//! Stockfish engine wrapper using UCI protocol (async I/O)

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::error::WorkerError;
use crate::eval::EngineScore;

/// The analysis engine as seen by the pipeline. Scores are from White's
/// point of view; one request is outstanding at a time.
#[allow(async_fn_in_trait)]
pub trait Engine {
    /// Best move in UCI notation for the position.
    async fn best_move(&mut self, fen: &str, depth: u32) -> Result<String, WorkerError>;

    /// Evaluation of the position.
    async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<EngineScore, WorkerError>;
}

/// Result of a single search, side-to-move relative as UCI reports it
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub score: Option<EngineScore>,
    /// `None` for positions without legal moves
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| WorkerError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| WorkerError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 256").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self, line: &mut String) -> Result<(), WorkerError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| WorkerError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(WorkerError::Stockfish("Stockfish closed its output".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position to a fixed depth
    pub async fn search(&mut self, fen: &str, depth: u32) -> Result<SearchResult, WorkerError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut result = SearchResult {
            score: None,
            best_move: None,
        };

        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                if let Some(score) = parse_score(trimmed) {
                    result.score = Some(score);
                }
            } else if trimmed.starts_with("bestmove") {
                debug!(line = trimmed, "SF >");
                result.best_move = trimmed
                    .split_whitespace()
                    .nth(1)
                    .filter(|m| *m != "(none)")
                    .map(str::to_string);
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Engine for StockfishEngine {
    async fn best_move(&mut self, fen: &str, depth: u32) -> Result<String, WorkerError> {
        self.search(fen, depth)
            .await?
            .best_move
            .ok_or_else(|| WorkerError::Stockfish(format!("No best move for {fen}")))
    }

    async fn evaluate(&mut self, fen: &str, depth: u32) -> Result<EngineScore, WorkerError> {
        let score = self
            .search(fen, depth)
            .await?
            .score
            .ok_or_else(|| WorkerError::Stockfish(format!("No score for {fen}")))?;
        Ok(score.from_side_to_move(white_to_move(fen)))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Side to move from the second FEN field
pub fn white_to_move(fen: &str) -> bool {
    fen.split_whitespace().nth(1) != Some("b")
}

/// Parse the score of an info line (side-to-move relative)
fn parse_score(line: &str) -> Option<EngineScore> {
    if let Some(mate) = parse_field(line, "mate") {
        return Some(EngineScore::Mate(mate));
    }
    parse_field(line, "cp").map(EngineScore::Centipawns)
}

/// Parse the integer following `key` in an info line
fn parse_field(line: &str, key: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}
