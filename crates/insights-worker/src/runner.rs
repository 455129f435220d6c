//! One resumable batch pass over a user's games.

use std::time::Instant;

use chess_core::{parse_pgn, ParsedGame};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::analyzer::{analyze_game, AnalysisParams};
use crate::db;
use crate::error::WorkerError;
use crate::record::game_datetime;
use crate::run_tracker::RunTracker;
use crate::stockfish::Engine;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Move rows of an interrupted game removed before the pass
    pub partial_rows_removed: u64,
    pub games_seen: usize,
    pub games_skipped: usize,
    pub games_analysed: usize,
}

/// Analyse every game the tracker still admits, oldest first, committing
/// each one to the log once its rows are stored.
pub async fn run_batch<E: Engine>(
    engine: &mut E,
    pool: &SqlitePool,
    tracker: &mut RunTracker,
    params: AnalysisParams,
    username: &str,
    start_date: NaiveDate,
    pgns: &[String],
) -> Result<RunSummary, WorkerError> {
    let mut summary = RunSummary {
        games_seen: pgns.len(),
        ..Default::default()
    };

    let stale_index = tracker.next_game_index();
    summary.partial_rows_removed = db::delete_move_results(pool, username, stale_index).await?;
    if summary.partial_rows_removed > 0 {
        warn!(
            game_index = stale_index,
            rows = summary.partial_rows_removed,
            "Removed move rows of interrupted game"
        );
    }

    tracker.begin();

    let pending = pending_games(tracker, start_date, pgns)?;
    summary.games_skipped = pgns.len() - pending.len();
    let games_total = pending.len();
    info!(
        username,
        games_total,
        skipped = summary.games_skipped,
        from_index = tracker.next_game_index(),
        "Starting analysis pass"
    );

    let started = Instant::now();
    for (datetime, game) in pending {
        let game_index = tracker.next_game_index();
        analyze_game(engine, pool, params, username, game_index, &game).await?;
        tracker.commit(datetime, game_index).await?;
        summary.games_analysed += 1;

        let elapsed = started.elapsed().as_secs_f64();
        let per_game = elapsed / summary.games_analysed as f64;
        let eta_secs = per_game * (games_total - summary.games_analysed) as f64;
        info!(
            game_index,
            games_done = summary.games_analysed,
            games_total,
            elapsed_secs = elapsed.round() as u64,
            eta_secs = eta_secs.round() as u64,
            "Progress"
        );
    }

    tracker.finish();
    info!(
        username,
        analysed = summary.games_analysed,
        skipped = summary.games_skipped,
        "Analysis pass complete"
    );
    Ok(summary)
}

/// Parse every PGN and keep the games still to analyse, in chronological order.
fn pending_games(
    tracker: &RunTracker,
    start_date: NaiveDate,
    pgns: &[String],
) -> Result<Vec<(NaiveDateTime, ParsedGame)>, WorkerError> {
    let mut pending = Vec::new();
    let mut at_mark = Vec::new();
    for pgn in pgns {
        let game = parse_pgn(pgn)?;
        let Some(datetime) = game_datetime(&game.headers) else {
            warn!(
                white = game.headers.white().unwrap_or("?"),
                black = game.headers.black().unwrap_or("?"),
                "Game has no UTC date/time, skipping"
            );
            continue;
        };
        if tracker.admits(datetime, start_date) {
            pending.push((datetime, game));
        } else if tracker.ties_mark(datetime, start_date) {
            at_mark.push((datetime, game));
        }
    }
    pending.extend(at_mark.into_iter().skip(tracker.committed_at_mark()));
    // Stable: games within the same second keep archive order
    pending.sort_by_key(|(datetime, _)| *datetime);
    Ok(pending)
}
