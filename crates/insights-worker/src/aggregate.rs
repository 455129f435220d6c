//! Whole-game aggregation of per-move results.
//!
//! A [`GameAggregator`] lives for exactly one game: results are pushed in ply
//! order and [`GameAggregator::finish`] produces the per-color summary.

use std::fmt::{Display, Formatter};

use chess::Color;
use serde::{Deserialize, Serialize};

use crate::castling::{castle_move_number, has_castled};
use crate::scoring::{round_to, MoveQuality, MoveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Opening,
    Midgame,
    Endgame,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Opening => write!(f, "Opening"),
            Phase::Midgame => write!(f, "Midgame"),
            Phase::Endgame => write!(f, "Endgame"),
        }
    }
}

/// When a side castled, relative to the game's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastlePhase {
    None,
    Opening,
    Midgame,
    Endgame,
}

impl Display for CastlePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CastlePhase::None => write!(f, "None"),
            CastlePhase::Opening => write!(f, "Opening"),
            CastlePhase::Midgame => write!(f, "Midgame"),
            CastlePhase::Endgame => write!(f, "Endgame"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub best: u32,
    pub excellent: u32,
    pub good: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
    pub missed_win: u32,
}

impl TierCounts {
    pub fn add(&mut self, quality: MoveQuality) {
        match quality {
            MoveQuality::Best => self.best += 1,
            MoveQuality::Excellent => self.excellent += 1,
            MoveQuality::Good => self.good += 1,
            MoveQuality::Inaccuracy => self.inaccuracy += 1,
            MoveQuality::Mistake => self.mistake += 1,
            MoveQuality::Blunder => self.blunder += 1,
            MoveQuality::MissedWin => self.missed_win += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.best
            + self.excellent
            + self.good
            + self.inaccuracy
            + self.mistake
            + self.blunder
            + self.missed_win
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub moves: usize,
    pub accuracy: f64,
    pub opening_accuracy: f64,
    pub midgame_accuracy: f64,
    pub endgame_accuracy: f64,
    pub weakest_phase: Phase,
    pub tiers: TierCounts,
    pub castle_move_number: usize,
    pub castled: bool,
    pub castle_phase: CastlePhase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Plies in the game.
    pub total_moves: usize,
    pub white: SideSummary,
    pub black: SideSummary,
}

impl GameSummary {
    pub fn side(&self, color: Color) -> &SideSummary {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

#[derive(Debug, Default)]
struct SideAccumulator {
    accuracies: Vec<f64>,
    tiers: TierCounts,
    castle_numbers: Vec<usize>,
}

impl SideAccumulator {
    fn summarize(&self, total_moves: usize) -> SideSummary {
        let [opening, midgame, endgame] = split_thirds(&self.accuracies).map(mean_or_zero);

        let castled = has_castled(&self.castle_numbers);
        let castle_move = self.castle_numbers.iter().sum();

        SideSummary {
            moves: self.accuracies.len(),
            accuracy: round_to(mean_or_zero(&self.accuracies), 2),
            opening_accuracy: round_to(opening, 2),
            midgame_accuracy: round_to(midgame, 2),
            endgame_accuracy: round_to(endgame, 2),
            // Unrounded means: rounding can turn a strict minimum into a tie
            weakest_phase: weakest_phase(opening, midgame, endgame),
            tiers: self.tiers,
            castle_move_number: castle_move,
            castled,
            castle_phase: castle_phase(castle_move, total_moves, castled),
        }
    }
}

#[derive(Debug, Default)]
pub struct GameAggregator {
    white: SideAccumulator,
    black: SideAccumulator,
    total_moves: usize,
}

impl GameAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one half-move. Results must arrive in ply order.
    pub fn push(&mut self, result: &MoveResult) {
        let side = match result.color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        side.accuracies.push(result.accuracy);
        side.tiers.add(result.quality);
        side.castle_numbers.push(castle_move_number(
            result.castle_kind,
            Some(result.color),
            result.move_index,
        ));
        self.total_moves += 1;
    }

    pub fn finish(self) -> GameSummary {
        GameSummary {
            total_moves: self.total_moves,
            white: self.white.summarize(self.total_moves),
            black: self.black.summarize(self.total_moves),
        }
    }
}

/// Split into three contiguous groups whose sizes differ by at most one,
/// earlier groups taking the remainder (10 -> 4, 3, 3).
pub fn split_thirds<T>(items: &[T]) -> [&[T]; 3] {
    let base = items.len() / 3;
    let extra = items.len() % 3;
    let first = base + usize::from(extra > 0);
    let second = base + usize::from(extra > 1);
    let (opening, rest) = items.split_at(first);
    let (midgame, endgame) = rest.split_at(second);
    [opening, midgame, endgame]
}

pub fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Opening if strictly below both others, else midgame if strictly below
/// both others, else endgame.
pub fn weakest_phase(opening: f64, midgame: f64, endgame: f64) -> Phase {
    if opening < midgame && opening < endgame {
        Phase::Opening
    } else if midgame < opening && midgame < endgame {
        Phase::Midgame
    } else {
        Phase::Endgame
    }
}

pub fn castle_phase(castle_move_number: usize, total_moves: usize, castled: bool) -> CastlePhase {
    if total_moves == 0 || !castled {
        return CastlePhase::None;
    }
    let ratio = castle_move_number as f64 / total_moves as f64;
    if ratio < 1.0 / 3.0 {
        CastlePhase::Opening
    } else if ratio <= 2.0 / 3.0 {
        CastlePhase::Midgame
    } else {
        CastlePhase::Endgame
    }
}
