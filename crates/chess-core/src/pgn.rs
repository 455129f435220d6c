//! PGN parsing utilities: lightweight regex-based parser.
//!
//! Only the mainline is kept: variations are dropped, comments are scanned
//! for `%clk` annotations and otherwise ignored.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::clock::parse_clock;
use crate::game_data::{GameHeaders, ParsedGame};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));

// Anchored to whole lines: `[%clk ...]` inside comments must survive.
static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\[[^\]]*\]\s*$").expect("valid header line regex"));

static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("valid variation regex"));

// Comments first so that squares mentioned inside `{...}` are never read as moves.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^}]*\}|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O")
        .expect("valid move regex")
});

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%clk\s+([0-9:.]+)").expect("valid clock regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PgnError {
    #[error("PGN text has neither headers nor moves")]
    Empty,
}

/// Parse one game's PGN text into headers, SAN mainline and per-move clocks.
pub fn parse_pgn(pgn: &str) -> Result<ParsedGame, PgnError> {
    let headers: GameHeaders = HEADER_RE
        .captures_iter(pgn)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect();

    let (moves, clocks) = extract_moves(pgn);

    if headers.is_empty() && moves.is_empty() {
        return Err(PgnError::Empty);
    }

    Ok(ParsedGame {
        headers,
        moves,
        clocks,
    })
}

/// Extract SAN moves (and the clock annotation following each one) from PGN
/// text after removing headers and variations.
fn extract_moves(pgn: &str) -> (Vec<String>, Vec<Option<f64>>) {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");

    // Nested variations collapse from the inside out.
    let mut body = no_headers.into_owned();
    while VARIATION_RE.is_match(&body) {
        body = VARIATION_RE.replace_all(&body, "").into_owned();
    }

    let mut moves = Vec::new();
    let mut clocks: Vec<Option<f64>> = Vec::new();

    for token in TOKEN_RE.find_iter(&body) {
        let text = token.as_str();
        if text.starts_with('{') {
            if let (Some(last), Some(cap)) = (clocks.last_mut(), CLOCK_RE.captures(text)) {
                *last = parse_clock(&cap[1]);
            }
            continue;
        }
        moves.push(text.to_string());
        clocks.push(None);
    }

    (moves, clocks)
}
