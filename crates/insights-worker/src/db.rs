//! SQLite storage for move results and game records

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::error::WorkerError;
use crate::record::GameRecord;
use crate::scoring::{color_name, piece_name, MoveResult};

/// Open the database, creating the file first when it does not exist.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, WorkerError> {
    if !database_url.contains(":memory:") && !Sqlite::database_exists(database_url).await? {
        info!(database_url, "Creating database");
        Sqlite::create_database(database_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), WorkerError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Drop both tables and recreate them empty.
pub async fn reset_tables(pool: &SqlitePool) -> Result<(), WorkerError> {
    sqlx::raw_sql(
        "DROP TABLE IF EXISTS move_results;
         DROP TABLE IF EXISTS game_records;",
    )
    .execute(pool)
    .await?;
    run_migrations(pool).await
}

const SCHEMA_SQL: &str = r#"
-- One row per analysed half-move
CREATE TABLE IF NOT EXISTS move_results (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    username        TEXT NOT NULL,
    game_index      INTEGER NOT NULL,
    move_index      INTEGER NOT NULL,
    played_move     TEXT NOT NULL,
    played_eval     INTEGER NOT NULL,
    best_move       TEXT NOT NULL,
    best_eval       INTEGER NOT NULL,
    eval_delta      REAL NOT NULL,
    accuracy        REAL NOT NULL,
    quality_tier    INTEGER NOT NULL,
    quality         TEXT NOT NULL,
    piece           TEXT NOT NULL,
    color           TEXT NOT NULL,
    castle_kind     TEXT NOT NULL,
    time_spent_secs REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_move_results_game
    ON move_results (username, game_index);

-- One row per analysed game, user-relative
CREATE TABLE IF NOT EXISTS game_records (
    id                    INTEGER PRIMARY KEY AUTOINCREMENT,
    username              TEXT NOT NULL,
    game_number           INTEGER NOT NULL,
    date                  TEXT,
    time                  TEXT,
    time_of_day           TEXT,
    weekday               TEXT,
    time_control          TEXT NOT NULL,
    user_color            TEXT NOT NULL,
    user_name             TEXT NOT NULL,
    user_rating           INTEGER NOT NULL,
    opponent_name         TEXT NOT NULL,
    opponent_rating       INTEGER NOT NULL,
    eco                   TEXT NOT NULL,
    opening_name          TEXT NOT NULL,
    termination           TEXT NOT NULL,
    result                TEXT,
    total_moves           INTEGER NOT NULL,
    accuracy              REAL NOT NULL,
    opening_accuracy      REAL NOT NULL,
    midgame_accuracy      REAL NOT NULL,
    endgame_accuracy      REAL NOT NULL,
    weakest_phase         TEXT NOT NULL,
    best_count            INTEGER NOT NULL,
    excellent_count       INTEGER NOT NULL,
    good_count            INTEGER NOT NULL,
    inaccuracy_count      INTEGER NOT NULL,
    mistake_count         INTEGER NOT NULL,
    blunder_count         INTEGER NOT NULL,
    missed_win_count      INTEGER NOT NULL,
    user_win_percent      REAL NOT NULL,
    opponent_win_percent  REAL NOT NULL,
    user_castle_move      INTEGER NOT NULL,
    user_castled          INTEGER NOT NULL,
    user_castle_phase     TEXT NOT NULL,
    opponent_castle_move  INTEGER NOT NULL,
    opponent_castled      INTEGER NOT NULL,
    opponent_castle_phase TEXT NOT NULL
);
"#;

pub async fn insert_move_result(pool: &SqlitePool, result: &MoveResult) -> Result<(), WorkerError> {
    sqlx::query(
        r#"INSERT INTO move_results (
            username, game_index, move_index,
            played_move, played_eval, best_move, best_eval,
            eval_delta, accuracy, quality_tier, quality,
            piece, color, castle_kind, time_spent_secs
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&result.username)
    .bind(result.game_index as i64)
    .bind(result.move_index as i64)
    .bind(&result.played_move)
    .bind(result.played_eval)
    .bind(&result.best_move)
    .bind(result.best_eval)
    .bind(result.eval_delta)
    .bind(result.accuracy)
    .bind(result.quality.tier() as i32)
    .bind(result.quality.label())
    .bind(piece_name(result.piece))
    .bind(color_name(result.color))
    .bind(result.castle_kind.as_str())
    .bind(result.time_spent_secs)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_game_record(pool: &SqlitePool, record: &GameRecord) -> Result<(), WorkerError> {
    sqlx::query(
        r#"INSERT INTO game_records (
            username, game_number, date, time, time_of_day, weekday,
            time_control, user_color, user_name, user_rating,
            opponent_name, opponent_rating, eco, opening_name,
            termination, result, total_moves,
            accuracy, opening_accuracy, midgame_accuracy, endgame_accuracy, weakest_phase,
            best_count, excellent_count, good_count, inaccuracy_count,
            mistake_count, blunder_count, missed_win_count,
            user_win_percent, opponent_win_percent,
            user_castle_move, user_castled, user_castle_phase,
            opponent_castle_move, opponent_castled, opponent_castle_phase
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
        )"#,
    )
    .bind(&record.username)
    .bind(record.game_number as i64)
    .bind(record.date)
    .bind(record.time)
    .bind(record.time_of_day.map(|t| t.to_string()))
    .bind(&record.weekday)
    .bind(&record.time_control)
    .bind(&record.user_color)
    .bind(&record.user_name)
    .bind(record.user_rating)
    .bind(&record.opponent_name)
    .bind(record.opponent_rating)
    .bind(&record.eco)
    .bind(&record.opening_name)
    .bind(&record.termination)
    .bind(record.result.map(|r| r.to_string()))
    .bind(record.total_moves as i64)
    .bind(record.accuracy)
    .bind(record.opening_accuracy)
    .bind(record.midgame_accuracy)
    .bind(record.endgame_accuracy)
    .bind(record.weakest_phase.to_string())
    .bind(record.tiers.best as i64)
    .bind(record.tiers.excellent as i64)
    .bind(record.tiers.good as i64)
    .bind(record.tiers.inaccuracy as i64)
    .bind(record.tiers.mistake as i64)
    .bind(record.tiers.blunder as i64)
    .bind(record.tiers.missed_win as i64)
    .bind(record.user_win_percent)
    .bind(record.opponent_win_percent)
    .bind(record.user_castle_move as i64)
    .bind(record.user_castled)
    .bind(record.user_castle_phase.to_string())
    .bind(record.opponent_castle_move as i64)
    .bind(record.opponent_castled)
    .bind(record.opponent_castle_phase.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove move rows left by an interrupted game. Returns the number removed.
pub async fn delete_move_results(
    pool: &SqlitePool,
    username: &str,
    game_index: u32,
) -> Result<u64, WorkerError> {
    let result = sqlx::query("DELETE FROM move_results WHERE username = ? AND game_index = ?")
        .bind(username)
        .bind(game_index as i64)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_move_results(
    pool: &SqlitePool,
    username: &str,
    game_index: u32,
) -> Result<i64, WorkerError> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM move_results WHERE username = ? AND game_index = ?")
            .bind(username)
            .bind(game_index as i64)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn count_game_records(pool: &SqlitePool, username: &str) -> Result<i64, WorkerError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM game_records WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
