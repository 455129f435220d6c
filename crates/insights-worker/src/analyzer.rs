//! Game analysis: replay the mainline, score every half-move against the
//! engine's best move, persist the rows and the game record.

use chess_core::{time_spent, ParsedGame, TimeControl};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::aggregate::GameAggregator;
use crate::castling::castle_kind;
use crate::db;
use crate::error::WorkerError;
use crate::eval::normalize;
use crate::record::{build_game_record, GameRecord};
use crate::replay::{find_san_move, parse_uci_move, starting_board, uci_string};
use crate::scoring::{eval_delta, move_accuracy, AccuracyCurve, MoveQuality, MoveResult};
use crate::stockfish::Engine;

/// Per-run engine and scoring settings
#[derive(Debug, Clone, Copy)]
pub struct AnalysisParams {
    pub depth: u32,
    pub curve: AccuracyCurve,
}

/// Analyse one game and persist its move rows and record.
///
/// Replay starts from the game's `FEN` header when it has one; the side to
/// move on each ply comes from the board, not from the ply index.
///
/// Rows are written as they are produced; an error part-way through leaves
/// the rows of `game_index` behind for the next run's cleanup.
pub async fn analyze_game<E: Engine>(
    engine: &mut E,
    pool: &SqlitePool,
    params: AnalysisParams,
    username: &str,
    game_index: u32,
    game: &ParsedGame,
) -> Result<GameRecord, WorkerError> {
    let time_control = game.headers.get("TimeControl").and_then(TimeControl::parse);
    let times = time_spent(&game.clocks, time_control);

    let mut board = starting_board(&game.headers)?;
    let mut aggregator = GameAggregator::new();

    for (move_index, san) in game.moves.iter().enumerate() {
        let fen_before = board.to_string();
        let color = board.side_to_move();

        let played = find_san_move(&board, san)
            .map_err(|e| WorkerError::Replay(format!("Game {game_index} ply {move_index}: {e}")))?;
        let piece = board
            .piece_on(played.get_source())
            .ok_or_else(|| WorkerError::Replay(format!("Empty source square for {san}")))?;
        let played_uci = uci_string(played);

        let best_uci = engine.best_move(&fen_before, params.depth).await?;
        let best = parse_uci_move(&board, &best_uci)
            .map_err(|e| WorkerError::Stockfish(format!("Engine suggested {best_uci}: {e}")))?;

        let best_fen = board.make_move_new(best).to_string();
        let best_eval = normalize(engine.evaluate(&best_fen, params.depth).await?);

        let after_played = board.make_move_new(played);
        let played_eval = if best == played {
            best_eval
        } else {
            normalize(engine.evaluate(&after_played.to_string(), params.depth).await?)
        };

        let delta = eval_delta(move_index, best_eval, played_eval);
        let accuracy = move_accuracy(delta, params.curve);

        let result = MoveResult {
            username: username.to_string(),
            game_index,
            move_index,
            played_move: played_uci.clone(),
            played_eval,
            best_move: uci_string(best),
            best_eval,
            eval_delta: delta,
            accuracy,
            quality: MoveQuality::from_accuracy(accuracy),
            piece,
            color,
            castle_kind: castle_kind(piece, color, &played_uci),
            time_spent_secs: times.get(move_index).copied().unwrap_or(0.0),
        };

        debug!(
            game_index,
            move_index,
            played = %result.played_move,
            best = %result.best_move,
            accuracy,
            quality = %result.quality,
            "Move scored"
        );

        db::insert_move_result(pool, &result).await?;
        aggregator.push(&result);
        board = after_played;
    }

    let summary = aggregator.finish();
    let record = build_game_record(username, game_index, &game.headers, &summary);
    db::insert_game_record(pool, &record).await?;

    info!(
        game_index,
        plies = summary.total_moves,
        accuracy = record.accuracy,
        weakest_phase = %record.weakest_phase,
        opponent = %record.opponent_name,
        "Game analysed"
    );

    Ok(record)
}
