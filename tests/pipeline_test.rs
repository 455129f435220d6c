//! End-to-end analysis against a scripted engine and an in-memory database.

mod common;

use chess_core::parse_pgn;
use chrono::NaiveDate;
use common::*;
use insights_worker::analyzer::{analyze_game, AnalysisParams};
use insights_worker::db;
use insights_worker::error::WorkerError;
use insights_worker::eval::EngineScore;
use insights_worker::record::{GameOutcome, TimeOfDay, MISSING_ECO};
use insights_worker::run_tracker::{RunState, RunTracker};
use insights_worker::runner::run_batch;
use insights_worker::scoring::AccuracyCurve;

const ITALIAN_MOVES: [&str; 6] = ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"];
const SCHOLARS_MOVES: [&str; 7] = ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"];

fn params() -> AnalysisParams {
    AnalysisParams {
        depth: 12,
        curve: AccuracyCurve::STANDARD,
    }
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Engine whose best move is always the move actually played.
fn echo_engine(moves: &[&str]) -> FakeEngine {
    (0..moves.len()).fold(FakeEngine::new(), |engine, i| {
        engine.with_best(fen_after(&moves[..i]), uci_after(&moves[..i], moves[i]))
    })
}

#[tokio::test]
async fn test_analyze_game_builds_user_relative_record() {
    let pool = memory_pool().await;
    let mut engine = FakeEngine::new();
    let game = parse_pgn(ITALIAN).unwrap();

    let record = analyze_game(&mut engine, &pool, params(), USER, 1, &game)
        .await
        .unwrap();

    assert_eq!(db::count_move_results(&pool, USER, 1).await.unwrap(), 6);
    assert_eq!(db::count_game_records(&pool, USER).await.unwrap(), 1);
    assert_eq!(engine.best_move_calls, 6);

    assert_eq!(record.game_number, 1);
    assert_eq!(record.user_color, "black");
    assert_eq!(record.opponent_name, "JezzaShaw");
    assert_eq!(record.user_rating, 1009);
    assert_eq!(record.opponent_rating, 1011);
    assert_eq!(record.user_win_percent, 49.71);
    assert_eq!(record.opponent_win_percent, 50.29);
    assert_eq!(record.eco, "C50");
    assert_eq!(record.opening_name, "Italian Game");
    assert_eq!(record.termination, "Win by resignation");
    assert_eq!(record.result, Some(GameOutcome::Win));
    assert_eq!(record.time_of_day, Some(TimeOfDay::Evening));
    assert_eq!(record.weekday.as_deref(), Some("Sunday"));
    assert_eq!(record.total_moves, 6);

    // Every evaluation is 0, so every move matches the best line
    assert_eq!(record.accuracy, 100.0);
    assert_eq!(record.tiers.best, 3);
    assert!(!record.user_castled);
}

#[tokio::test]
async fn test_played_best_move_reuses_evaluation() {
    let pool = memory_pool().await;
    let mut engine = echo_engine(&ITALIAN_MOVES);
    let game = parse_pgn(ITALIAN).unwrap();

    analyze_game(&mut engine, &pool, params(), USER, 1, &game)
        .await
        .unwrap();

    assert_eq!(engine.best_move_calls, 6);
    assert_eq!(engine.evaluate_calls, 6);
}

#[tokio::test]
async fn test_mistake_is_scored_against_best_line() {
    let pool = memory_pool().await;
    let before_nf6 = &SCHOLARS_MOVES[..5];
    let mut engine = echo_engine(&SCHOLARS_MOVES)
        .with_best(fen_after(before_nf6), uci_after(before_nf6, "Qe7"))
        .with_eval(
            fen_after(&["e4", "e5", "Qh5", "Nc6", "Bc4", "Qe7"]),
            EngineScore::Centipawns(0),
        )
        .with_eval(fen_after(&SCHOLARS_MOVES[..6]), EngineScore::Centipawns(300))
        .with_eval(fen_after(&SCHOLARS_MOVES), EngineScore::Mate(0));
    let game = parse_pgn(SCHOLARS_MATE).unwrap();

    let record = analyze_game(&mut engine, &pool, params(), USER, 7, &game)
        .await
        .unwrap();

    let (best_move, delta, accuracy, tier): (String, f64, f64, i64) = sqlx::query_as(
        "SELECT best_move, eval_delta, accuracy, quality_tier FROM move_results
         WHERE username = ? AND game_index = ? AND move_index = 5",
    )
    .bind(USER)
    .bind(7_i64)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(best_move, "d8e7");
    assert_eq!(delta, 300.0);
    assert_eq!(accuracy, 30.1);
    assert_eq!(tier, -2);

    // The user played White and every White move was the best move
    assert_eq!(record.user_color, "white");
    assert_eq!(record.accuracy, 100.0);
    assert_eq!(record.tiers.best, 4);
    assert_eq!(record.termination, "Win by checkmate");
    assert_eq!(record.eco, MISSING_ECO);
    assert_eq!(record.opening_name, "NA");
    assert_eq!(record.user_win_percent, 38.69);
    assert_eq!(record.opponent_win_percent, 61.31);
}

#[tokio::test]
async fn test_batch_skips_committed_games_and_resumes() {
    let pool = memory_pool().await;
    let log = temp_log_path("batch");
    std::fs::write(&log, format!("{TAG} | {USER} | 2020-11-08 23:10:17 | 1\n")).unwrap();
    let pgns = vec![SCHOLARS_MATE.to_string(), ITALIAN.to_string()];

    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    let mut engine = FakeEngine::new();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();

    assert_eq!(summary.games_seen, 2);
    assert_eq!(summary.games_analysed, 1);
    assert_eq!(summary.games_skipped, 1);
    assert_eq!(summary.partial_rows_removed, 0);
    assert_eq!(tracker.state(), RunState::Idle);
    assert_eq!(tracker.low_water_mark().game_index, 2);
    assert_eq!(db::count_move_results(&pool, USER, 2).await.unwrap(), 7);

    let contents = std::fs::read_to_string(&log).unwrap();
    assert_eq!(
        contents.lines().last(),
        Some("game-analysed | LucidKoala | 2020-11-09 08:15:00 | 2")
    );

    // Second pass has nothing left to do
    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();
    assert_eq!(summary.games_analysed, 0);
    assert_eq!(summary.games_skipped, 2);
    assert_eq!(db::count_game_records(&pool, USER).await.unwrap(), 1);

    let _ = std::fs::remove_file(&log);
}

#[tokio::test]
async fn test_engine_failure_leaves_partial_game_for_cleanup() {
    let pool = memory_pool().await;
    let log = temp_log_path("crash");
    let pgns = vec![ITALIAN.to_string()];

    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    let mut failing = FakeEngine {
        fail_after: Some(4),
        ..FakeEngine::new()
    };
    let err = run_batch(&mut failing, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Stockfish(_)));

    let partial = db::count_move_results(&pool, USER, 1).await.unwrap();
    assert!(partial > 0 && partial < 6);
    assert_eq!(db::count_game_records(&pool, USER).await.unwrap(), 0);

    // Nothing was committed, so the next run replays game 1 from scratch
    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    assert_eq!(tracker.next_game_index(), 1);
    let mut engine = FakeEngine::new();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();

    assert_eq!(summary.partial_rows_removed, partial as u64);
    assert_eq!(summary.games_analysed, 1);
    assert_eq!(db::count_move_results(&pool, USER, 1).await.unwrap(), 6);
    assert_eq!(db::count_game_records(&pool, USER).await.unwrap(), 1);

    let _ = std::fs::remove_file(&log);
}

#[tokio::test]
async fn test_games_without_datetime_or_before_start_are_skipped() {
    let pool = memory_pool().await;
    let log = temp_log_path("undated");
    let undated = "[White \"LucidKoala\"]\n[Black \"x\"]\n\n1. e4 e5 1/2-1/2".to_string();
    let pgns = vec![undated, ITALIAN.to_string()];

    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    let late_start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let mut engine = FakeEngine::new();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, late_start, &pgns)
        .await
        .unwrap();

    assert_eq!(summary.games_analysed, 0);
    assert_eq!(summary.games_skipped, 2);
    assert_eq!(engine.best_move_calls, 0);

    let _ = std::fs::remove_file(&log);
}

#[tokio::test]
async fn test_set_up_position_is_replayed_from_fen_header() {
    let pool = memory_pool().await;
    let log = temp_log_path("setup");
    let pgns = vec![ITALIAN.to_string(), PAWN_ENDGAME.to_string()];

    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    let mut engine = FakeEngine::new();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();

    assert_eq!(summary.games_analysed, 2);
    assert_eq!(tracker.low_water_mark().game_index, 2);

    let rows: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT move_index, played_move, color FROM move_results
         WHERE username = ? AND game_index = 1 ORDER BY move_index",
    )
    .bind(USER)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        rows,
        vec![
            (0, "e7e5".to_string(), "black".to_string()),
            (1, "e2e4".to_string(), "white".to_string()),
            (2, "e8d7".to_string(), "black".to_string()),
        ]
    );
    assert_eq!(db::count_move_results(&pool, USER, 2).await.unwrap(), 6);

    let _ = std::fs::remove_file(&log);
}

#[tokio::test]
async fn test_batch_assigns_indices_in_chronological_order() {
    let pool = memory_pool().await;
    let log = temp_log_path("order");
    // Newest first, as an archive listing might hand them over
    let pgns = vec![SCHOLARS_MATE.to_string(), ITALIAN.to_string()];

    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    let mut engine = FakeEngine::new();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();
    assert_eq!(summary.games_analysed, 2);

    let records: Vec<(i64, String)> = sqlx::query_as(
        "SELECT game_number, opponent_name FROM game_records
         WHERE username = ? ORDER BY game_number",
    )
    .bind(USER)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(
        records,
        vec![
            (1, "JezzaShaw".to_string()),
            (2, "SomeOpponent".to_string()),
        ]
    );
    assert_eq!(db::count_move_results(&pool, USER, 1).await.unwrap(), 6);
    assert_eq!(db::count_move_results(&pool, USER, 2).await.unwrap(), 7);

    let contents = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "game-analysed | LucidKoala | 2020-01-01 00:00:00 | 0",
            "game-analysed | LucidKoala | 2020-11-08 23:10:17 | 1",
            "game-analysed | LucidKoala | 2020-11-09 08:15:00 | 2",
        ]
    );

    let _ = std::fs::remove_file(&log);
}

#[tokio::test]
async fn test_games_in_the_same_second_resume_after_partial_commit() {
    let pool = memory_pool().await;
    let log = temp_log_path("same_second");
    // The first of two games played in the same second is already committed
    std::fs::write(&log, format!("{TAG} | {USER} | 2020-11-08 23:10:17 | 1\n")).unwrap();
    let twin = ITALIAN.replace("JezzaShaw", "TwinOpponent");
    let pgns = vec![ITALIAN.to_string(), twin];

    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    assert_eq!(tracker.committed_at_mark(), 1);
    let mut engine = FakeEngine::new();
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();

    assert_eq!(summary.games_analysed, 1);
    assert_eq!(summary.games_skipped, 1);
    let (game_number, opponent): (i64, String) =
        sqlx::query_as("SELECT game_number, opponent_name FROM game_records WHERE username = ?")
            .bind(USER)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!((game_number, opponent.as_str()), (2, "TwinOpponent"));

    // Both games of that second are now in the log
    let mut tracker = RunTracker::open(&log, TAG, USER).await.unwrap();
    assert_eq!(tracker.committed_at_mark(), 2);
    let summary = run_batch(&mut engine, &pool, &mut tracker, params(), USER, start_date(), &pgns)
        .await
        .unwrap();
    assert_eq!(summary.games_analysed, 0);

    let _ = std::fs::remove_file(&log);
}
