//! Castling detection from the played move's UCI squares.

use chess::{Color, Piece};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleKind {
    None,
    WhiteKingside,
    WhiteQueenside,
    BlackKingside,
    BlackQueenside,
}

impl CastleKind {
    pub fn color(&self) -> Option<Color> {
        match self {
            CastleKind::None => None,
            CastleKind::WhiteKingside | CastleKind::WhiteQueenside => Some(Color::White),
            CastleKind::BlackKingside | CastleKind::BlackQueenside => Some(Color::Black),
        }
    }

    pub fn is_castle(&self) -> bool {
        *self != CastleKind::None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CastleKind::None => "none",
            CastleKind::WhiteKingside => "white_kingside",
            CastleKind::WhiteQueenside => "white_queenside",
            CastleKind::BlackKingside => "black_kingside",
            CastleKind::BlackQueenside => "black_queenside",
        }
    }
}

/// Classify a move as castling. Only king moves between the fixed
/// e1g1/e1c1/e8g8/e8c8 square pairs count.
pub fn castle_kind(piece: Piece, color: Color, played_move: &str) -> CastleKind {
    if piece != Piece::King {
        return CastleKind::None;
    }
    match (color, played_move) {
        (Color::White, "e1g1") => CastleKind::WhiteKingside,
        (Color::White, "e1c1") => CastleKind::WhiteQueenside,
        (Color::Black, "e8g8") => CastleKind::BlackKingside,
        (Color::Black, "e8c8") => CastleKind::BlackQueenside,
        _ => CastleKind::None,
    }
}

/// Move index of the castle when `kind` is a castle by `side`
/// (or by anyone when `side` is `None`), otherwise 0.
pub fn castle_move_number(kind: CastleKind, side: Option<Color>, move_index: usize) -> usize {
    match (kind.color(), side) {
        (Some(_), None) => move_index,
        (Some(castler), Some(side)) if castler == side => move_index,
        _ => 0,
    }
}

/// A side has castled iff any of its per-move castle numbers is non-zero.
pub fn has_castled(castle_numbers: &[usize]) -> bool {
    castle_numbers.iter().sum::<usize>() > 0
}
