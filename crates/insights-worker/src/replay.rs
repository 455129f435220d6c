//! Replaying SAN move lists on a `chess::Board` and converting moves to and
//! from UCI notation.

use std::str::FromStr;

use chess::{Board, ChessMove, File, MoveGen, Piece, Rank, Square};
use chess_core::GameHeaders;

use crate::error::WorkerError;

/// Position the mainline starts from: the `FEN` header when present,
/// otherwise the standard initial position.
pub fn starting_board(headers: &GameHeaders) -> Result<Board, WorkerError> {
    match headers.get("FEN") {
        Some(fen) => Board::from_str(fen)
            .map_err(|e| WorkerError::Replay(format!("Invalid FEN header {fen:?}: {e}"))),
        None => Ok(Board::default()),
    }
}

/// Resolve a SAN move against the legal moves of `board`.
pub fn find_san_move(board: &Board, san: &str) -> Result<ChessMove, WorkerError> {
    let clean = san.trim_end_matches(|c: char| c == '+' || c == '#' || c == '!' || c == '?');

    let legal_moves: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    // Castling is a two-file king move
    let castle_dir = match clean {
        "O-O" | "0-0" => Some(true),
        "O-O-O" | "0-0-0" => Some(false),
        _ => None,
    };
    if let Some(kingside) = castle_dir {
        return legal_moves
            .iter()
            .copied()
            .find(|m| {
                let src = m.get_source().get_file().to_index() as i32;
                let dst = m.get_dest().get_file().to_index() as i32;
                board.piece_on(m.get_source()) == Some(Piece::King)
                    && dst - src == if kingside { 2 } else { -2 }
            })
            .ok_or_else(|| WorkerError::Replay(format!("No castling move found for: {san}")));
    }

    let bytes = clean.as_bytes();
    if bytes.is_empty() {
        return Err(WorkerError::Replay("Empty SAN move".to_string()));
    }

    let (piece, rest) = if bytes[0].is_ascii_uppercase() {
        let p = match bytes[0] {
            b'K' => Piece::King,
            b'Q' => Piece::Queen,
            b'R' => Piece::Rook,
            b'B' => Piece::Bishop,
            b'N' => Piece::Knight,
            other => {
                return Err(WorkerError::Replay(format!(
                    "Unknown piece: {}",
                    other as char
                )))
            }
        };
        (p, &clean[1..])
    } else {
        (Piece::Pawn, clean)
    };

    let (rest, promotion) = match rest.find('=') {
        Some(eq_pos) => {
            let promo = rest.as_bytes().get(eq_pos + 1).and_then(|b| promotion_piece(*b));
            (&rest[..eq_pos], promo)
        }
        None => (rest, None),
    };

    let rest = rest.replace('x', "");
    let rest_bytes = rest.as_bytes();
    if rest_bytes.len() < 2 {
        return Err(WorkerError::Replay(format!("SAN too short: {san}")));
    }

    let dest = square_from_bytes(rest_bytes[rest_bytes.len() - 2], rest_bytes[rest_bytes.len() - 1])
        .ok_or_else(|| WorkerError::Replay(format!("Invalid destination in SAN: {san}")))?;
    let disambig = &rest_bytes[..rest_bytes.len() - 2];

    let candidates: Vec<ChessMove> = legal_moves
        .into_iter()
        .filter(|m| {
            m.get_dest() == dest
                && board.piece_on(m.get_source()) == Some(piece)
                && m.get_promotion() == promotion
        })
        .filter(|m| {
            let src = m.get_source();
            disambig.iter().all(|&b| match b {
                b'a'..=b'h' => src.get_file().to_index() == (b - b'a') as usize,
                b'1'..=b'8' => src.get_rank().to_index() == (b - b'1') as usize,
                _ => true,
            })
        })
        .collect();

    match candidates.as_slice() {
        [only] => Ok(*only),
        [] => Err(WorkerError::Replay(format!("No legal move matches SAN: {san}"))),
        _ => Err(WorkerError::Replay(format!(
            "Ambiguous SAN: {san} ({} candidates)",
            candidates.len()
        ))),
    }
}

/// UCI text of a move, e.g. `e2e4` or `e7e8q`.
pub fn uci_string(chess_move: ChessMove) -> String {
    let promotion = match chess_move.get_promotion() {
        Some(Piece::Queen) => "q",
        Some(Piece::Rook) => "r",
        Some(Piece::Bishop) => "b",
        Some(Piece::Knight) => "n",
        _ => "",
    };
    format!(
        "{}{}{}",
        chess_move.get_source(),
        chess_move.get_dest(),
        promotion
    )
}

/// Parse a UCI move and check it is legal on `board`.
pub fn parse_uci_move(board: &Board, uci: &str) -> Result<ChessMove, WorkerError> {
    let bytes = uci.as_bytes();
    let invalid = || WorkerError::Replay(format!("Invalid UCI move: {uci}"));
    if !(4..=5).contains(&bytes.len()) {
        return Err(invalid());
    }

    let from = square_from_bytes(bytes[0], bytes[1]).ok_or_else(invalid)?;
    let to = square_from_bytes(bytes[2], bytes[3]).ok_or_else(invalid)?;
    let promotion = match bytes.get(4) {
        Some(b) => Some(promotion_piece(b.to_ascii_uppercase()).ok_or_else(invalid)?),
        None => None,
    };

    let chess_move = ChessMove::new(from, to, promotion);
    if !board.legal(chess_move) {
        return Err(WorkerError::Replay(format!("Illegal move {uci} in {board}")));
    }
    Ok(chess_move)
}

fn square_from_bytes(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return None;
    }
    Some(Square::make_square(
        Rank::from_index((rank - b'1') as usize),
        File::from_index((file - b'a') as usize),
    ))
}

fn promotion_piece(b: u8) -> Option<Piece> {
    match b {
        b'Q' => Some(Piece::Queen),
        b'R' => Some(Piece::Rook),
        b'B' => Some(Piece::Bishop),
        b'N' => Some(Piece::Knight),
        _ => None,
    }
}
