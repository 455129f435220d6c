//! Move scoring and classification: pure functions only
//! (No Board/Engine/Database dependencies)

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chess::{Color, Piece};
use serde::{Deserialize, Serialize};

use crate::castling::CastleKind;

/// Accuracy curve `100 * exp(-k * (delta / v)^2)`.
///
/// Two calibrations exist in older datasets and they are not numerically
/// equivalent, so a dataset must stick to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyCurve {
    pub k: f64,
    pub v: f64,
}

impl AccuracyCurve {
    pub const STANDARD: AccuracyCurve = AccuracyCurve { k: 0.00003, v: 1.5 };
    pub const STEEP: AccuracyCurve = AccuracyCurve { k: 0.00005, v: 0.75 };
}

impl Default for AccuracyCurve {
    fn default() -> Self {
        AccuracyCurve::STANDARD
    }
}

impl FromStr for AccuracyCurve {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(AccuracyCurve::STANDARD),
            "steep" => Ok(AccuracyCurve::STEEP),
            other => Err(format!("unknown accuracy curve {other:?} (expected standard or steep)")),
        }
    }
}

/// Accuracy bands, top-down, first match wins.
const BAND_BEST: f64 = 100.0;
const BAND_EXCELLENT: f64 = 99.5;
const BAND_GOOD: f64 = 87.5;
const BAND_INACCURACY: f64 = 58.6;
const BAND_MISTAKE: f64 = 30.0;
const BAND_BLUNDER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    MissedWin,
}

impl MoveQuality {
    pub const ALL: [MoveQuality; 7] = [
        MoveQuality::Best,
        MoveQuality::Excellent,
        MoveQuality::Good,
        MoveQuality::Inaccuracy,
        MoveQuality::Mistake,
        MoveQuality::Blunder,
        MoveQuality::MissedWin,
    ];

    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= BAND_BEST {
            MoveQuality::Best
        } else if accuracy >= BAND_EXCELLENT {
            MoveQuality::Excellent
        } else if accuracy >= BAND_GOOD {
            MoveQuality::Good
        } else if accuracy >= BAND_INACCURACY {
            MoveQuality::Inaccuracy
        } else if accuracy >= BAND_MISTAKE {
            MoveQuality::Mistake
        } else if accuracy >= BAND_BLUNDER {
            MoveQuality::Blunder
        } else {
            MoveQuality::MissedWin
        }
    }

    /// Stored integer tier, from 2 (best) down to -4 (missed win).
    pub fn tier(&self) -> i8 {
        match self {
            MoveQuality::Best => 2,
            MoveQuality::Excellent => 1,
            MoveQuality::Good => 0,
            MoveQuality::Inaccuracy => -1,
            MoveQuality::Mistake => -2,
            MoveQuality::Blunder => -3,
            MoveQuality::MissedWin => -4,
        }
    }

    pub fn from_tier(tier: i8) -> Option<Self> {
        MoveQuality::ALL.into_iter().find(|q| q.tier() == tier)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoveQuality::Best => "best",
            MoveQuality::Excellent => "excellent",
            MoveQuality::Good => "good",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
            MoveQuality::MissedWin => "missed win",
        }
    }
}

impl Display for MoveQuality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One scored half-move. Written once, never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveResult {
    pub username: String,
    pub game_index: u32,
    /// 0-based ply; even = White.
    pub move_index: usize,
    pub played_move: String,
    pub played_eval: i32,
    pub best_move: String,
    pub best_eval: i32,
    pub eval_delta: f64,
    pub accuracy: f64,
    pub quality: MoveQuality,
    pub piece: Piece,
    pub color: Color,
    pub castle_kind: CastleKind,
    pub time_spent_secs: f64,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Distance between the best and the played evaluation, 3 decimals.
pub fn eval_delta(move_index: usize, best_eval: i32, played_eval: i32) -> f64 {
    // Both branches are absolute differences
    let delta = if move_index % 2 == 0 {
        (best_eval as f64 - played_eval as f64).abs()
    } else {
        (played_eval as f64 - best_eval as f64).abs()
    };
    round_to(delta, 3)
}

/// Accuracy percentage for one move, 1 decimal.
pub fn move_accuracy(eval_delta: f64, curve: AccuracyCurve) -> f64 {
    let scaled = eval_delta / curve.v;
    round_to(100.0 * (-curve.k * scaled * scaled).exp(), 1)
}

pub fn quality_tier(accuracy: f64) -> i8 {
    MoveQuality::from_accuracy(accuracy).tier()
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
