//! Engine score normalization.
//!
//! Every score handed to the scorer is a plain centipawn integer from
//! White's point of view. Forced mates lose their distance: a mate in 1 and a
//! mate in 30 both collapse to 0, which keeps historical rows comparable.

/// Raw engine score for one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineScore {
    /// Centipawns.
    Centipawns(i32),
    /// Forced mate; the sign tells which side mates, the magnitude is the distance.
    Mate(i32),
}

impl EngineScore {
    /// Convert a side-to-move relative UCI score into White's perspective.
    pub fn from_side_to_move(self, white_to_move: bool) -> Self {
        if white_to_move {
            return self;
        }
        match self {
            EngineScore::Centipawns(cp) => EngineScore::Centipawns(-cp),
            EngineScore::Mate(n) => EngineScore::Mate(-n),
        }
    }
}

/// Collapse a White-perspective score into the integer the scorer consumes.
pub fn normalize(score: EngineScore) -> i32 {
    match score {
        EngineScore::Centipawns(cp) => cp,
        EngineScore::Mate(_) => 0,
    }
}
