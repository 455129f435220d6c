//! Clock annotations and time controls.

use serde::{Deserialize, Serialize};

/// Parsed `TimeControl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeControl {
    /// Live game: base seconds plus per-move increment ("600", "180+2").
    Live { base_secs: u32, increment_secs: u32 },
    /// Correspondence game: seconds per move ("1/86400").
    Daily { secs_per_move: u32 },
}

impl TimeControl {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some((_, per_move)) = value.split_once('/') {
            return Some(TimeControl::Daily {
                secs_per_move: per_move.parse().ok()?,
            });
        }
        let (base, increment) = match value.split_once('+') {
            Some((base, inc)) => (base.parse().ok()?, inc.parse().ok()?),
            None => (value.parse().ok()?, 0),
        };
        Some(TimeControl::Live {
            base_secs: base,
            increment_secs: increment,
        })
    }
}

/// Parse a `%clk` value ("0:09:57.3", "9:57", "57.3") into seconds.
pub fn parse_clock(value: &str) -> Option<f64> {
    let mut total = 0.0;
    for part in value.split(':') {
        let n: f64 = part.parse().ok()?;
        total = total * 60.0 + n;
    }
    Some(total)
}

/// Seconds spent on each ply, derived from the remaining-clock annotations.
///
/// A color's first move is measured against the base time. Missing clocks
/// (or a daily game) yield 0 for the affected plies.
pub fn time_spent(clocks: &[Option<f64>], time_control: Option<TimeControl>) -> Vec<f64> {
    let (base, increment) = match time_control {
        Some(TimeControl::Live {
            base_secs,
            increment_secs,
        }) => (base_secs as f64, increment_secs as f64),
        _ => return vec![0.0; clocks.len()],
    };

    clocks
        .iter()
        .enumerate()
        .map(|(i, clock)| {
            let previous = if i >= 2 { clocks[i - 2] } else { Some(base) };
            match (previous, clock) {
                (Some(prev), Some(now)) => {
                    let spent = (prev - now + increment).max(0.0);
                    (spent * 10.0).round() / 10.0
                }
                _ => 0.0,
            }
        })
        .collect()
}
