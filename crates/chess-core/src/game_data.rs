use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// PGN tag pairs of a single game, keyed by tag name ("White", "UTCDate", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHeaders(BTreeMap<String, String>);

impl GameHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Header value, `None` when the tag is absent or empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Integer header value (ratings). `None` for absent or non-numeric values like "?".
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn white(&self) -> Option<&str> {
        self.get("White")
    }

    pub fn black(&self) -> Option<&str> {
        self.get("Black")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for GameHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = GameHeaders::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedGame {
    pub headers: GameHeaders,
    pub moves: Vec<String>, // SAN notation, mainline only
    /// Remaining clock (seconds) after each move, aligned with `moves`.
    pub clocks: Vec<Option<f64>>,
}
