pub mod clock;
pub mod game_data;
pub mod pgn;

pub use clock::{time_spent, TimeControl};
pub use game_data::{GameHeaders, ParsedGame};
pub use pgn::{parse_pgn, PgnError};
