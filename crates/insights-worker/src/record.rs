//! Game-level record: header metadata plus the tracked user's side of the
//! aggregated statistics.

use std::fmt::{Display, Formatter};

use chess::Color;
use chess_core::GameHeaders;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::aggregate::{CastlePhase, GameSummary, Phase, TierCounts};
use crate::scoring::round_to;

/// Opening class used when the ECO header is absent.
pub const MISSING_ECO: &str = "000";
/// Default ECO URL; its last path segment becomes the opening name "NA".
const MISSING_ECO_URL: &str = "/NA";
const MISSING: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeOfDay::Night => write!(f, "Night"),
            TimeOfDay::Morning => write!(f, "Morning"),
            TimeOfDay::Afternoon => write!(f, "Afternoon"),
            TimeOfDay::Evening => write!(f, "Evening"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Draw,
    Loss,
}

impl Display for GameOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Win => write!(f, "Win"),
            GameOutcome::Draw => write!(f, "Draw"),
            GameOutcome::Loss => write!(f, "Loss"),
        }
    }
}

/// One row per analysed game, keyed by (username, game_number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub username: String,
    pub game_number: u32,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub time_of_day: Option<TimeOfDay>,
    pub weekday: Option<String>,
    pub time_control: String,
    pub user_color: String,
    pub user_name: String,
    pub user_rating: i32,
    pub opponent_name: String,
    pub opponent_rating: i32,
    pub eco: String,
    pub opening_name: String,
    pub termination: String,
    pub result: Option<GameOutcome>,
    pub total_moves: usize,
    pub accuracy: f64,
    pub opening_accuracy: f64,
    pub midgame_accuracy: f64,
    pub endgame_accuracy: f64,
    pub weakest_phase: Phase,
    pub tiers: TierCounts,
    pub user_win_percent: f64,
    pub opponent_win_percent: f64,
    pub user_castle_move: usize,
    pub user_castled: bool,
    pub user_castle_phase: CastlePhase,
    pub opponent_castle_move: usize,
    pub opponent_castle_phase: CastlePhase,
    pub opponent_castled: bool,
}

/// Which color the tracked user played. Anything but a White match is Black.
pub fn user_color(headers: &GameHeaders, username: &str) -> Color {
    match headers.white() {
        Some(white) if white.eq_ignore_ascii_case(username) => Color::White,
        _ => Color::Black,
    }
}

/// Pre-game Elo expectation, in percent, 2 decimals.
pub fn predicted_win_percent(player_rating: i32, opponent_rating: i32) -> f64 {
    let exponent = (opponent_rating - player_rating) as f64 / 400.0;
    round_to(100.0 / (1.0 + 10f64.powf(exponent)), 2)
}

pub fn time_of_day(hour: u32) -> TimeOfDay {
    if hour <= 6 {
        TimeOfDay::Night
    } else if hour <= 12 {
        TimeOfDay::Morning
    } else if hour <= 18 {
        TimeOfDay::Afternoon
    } else {
        TimeOfDay::Evening
    }
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn game_date(headers: &GameHeaders) -> Option<NaiveDate> {
    let raw = headers.get("UTCDate").or_else(|| headers.get("Date"))?;
    NaiveDate::parse_from_str(raw, "%Y.%m.%d").ok()
}

pub fn game_time(headers: &GameHeaders) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(headers.get("UTCTime")?, "%H:%M:%S").ok()
}

/// UTC start of the game, used to order and admit games.
pub fn game_datetime(headers: &GameHeaders) -> Option<NaiveDateTime> {
    Some(NaiveDateTime::new(game_date(headers)?, game_time(headers)?))
}

/// Rewrite a termination like "LucidKoala won by resignation" relative to
/// the tracked user: "Win by resignation", "Draw by agreement", "Loss on time".
pub fn relative_termination(raw: &str, username: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return MISSING.to_string();
    }
    if let Some(reason) = raw.strip_prefix("Game drawn") {
        return format!("Draw {}", reason.trim());
    }

    let (leader, rest) = raw.split_once(' ').unwrap_or((raw, ""));
    let reason = rest.trim();
    let reason = reason.strip_prefix("won").map(str::trim).unwrap_or(reason);
    if leader.eq_ignore_ascii_case(username) {
        format!("Win {reason}")
    } else {
        format!("Loss {reason}")
    }
}

/// Outcome for the tracked user from the `Result` header.
pub fn relative_result(result: &str, color: Color) -> Option<GameOutcome> {
    match (result.trim(), color) {
        ("1-0", Color::White) | ("0-1", Color::Black) => Some(GameOutcome::Win),
        ("1-0", Color::Black) | ("0-1", Color::White) => Some(GameOutcome::Loss),
        ("1/2-1/2", _) => Some(GameOutcome::Draw),
        _ => None,
    }
}

/// ECO code and opening name with the documented sentinels for missing headers.
pub fn opening_from_headers(headers: &GameHeaders) -> (String, String) {
    let eco = headers.get("ECO").unwrap_or(MISSING_ECO).to_string();
    let url = headers.get("ECOUrl").unwrap_or(MISSING_ECO_URL);
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING)
        .replace('-', " ");
    (eco, name)
}

/// Combine headers and the aggregated summary into the user-relative record.
pub fn build_game_record(
    username: &str,
    game_number: u32,
    headers: &GameHeaders,
    summary: &GameSummary,
) -> GameRecord {
    let color = user_color(headers, username);
    let (user_name_key, user_elo_key, opp_name_key, opp_elo_key) = match color {
        Color::White => ("White", "WhiteElo", "Black", "BlackElo"),
        Color::Black => ("Black", "BlackElo", "White", "WhiteElo"),
    };

    let user_rating = headers.get_int(user_elo_key).unwrap_or(0);
    let opponent_rating = headers.get_int(opp_elo_key).unwrap_or(0);

    let user = summary.side(color);
    let opponent = summary.side(!color);

    let date = game_date(headers);
    let time = game_time(headers);
    let (eco, opening_name) = opening_from_headers(headers);

    GameRecord {
        username: username.to_string(),
        game_number,
        date,
        time,
        time_of_day: time.map(|t| time_of_day(t.hour())),
        weekday: date.map(|d| weekday_name(d).to_string()),
        time_control: headers.get("TimeControl").unwrap_or(MISSING).to_string(),
        user_color: crate::scoring::color_name(color).to_string(),
        user_name: headers.get(user_name_key).unwrap_or(username).to_string(),
        user_rating,
        opponent_name: headers.get(opp_name_key).unwrap_or(MISSING).to_string(),
        opponent_rating,
        eco,
        opening_name,
        termination: relative_termination(headers.get("Termination").unwrap_or(""), username),
        result: headers.get("Result").and_then(|r| relative_result(r, color)),
        total_moves: summary.total_moves,
        accuracy: user.accuracy,
        opening_accuracy: user.opening_accuracy,
        midgame_accuracy: user.midgame_accuracy,
        endgame_accuracy: user.endgame_accuracy,
        weakest_phase: user.weakest_phase,
        tiers: user.tiers,
        user_win_percent: predicted_win_percent(user_rating, opponent_rating),
        opponent_win_percent: predicted_win_percent(opponent_rating, user_rating),
        user_castle_move: user.castle_move_number,
        user_castled: user.castled,
        user_castle_phase: user.castle_phase,
        opponent_castle_move: opponent.castle_move_number,
        opponent_castle_phase: opponent.castle_phase,
        opponent_castled: opponent.castled,
    }
}
