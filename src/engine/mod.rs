//! External analysis engines.
//!
//! The HTTP layer only sees [`Analyzer`]; [`UciEngine`] drives a real engine
//! subprocess and [`EnginePool`] hands out exclusive access to a fixed set of
//! them.

pub mod pool;
pub mod uci;

use cozy_chess::Color;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use pool::EnginePool;
pub use uci::{EngineOptions, UciEngine};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch engine '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),
    #[error("engine protocol error: {0}")]
    Protocol(String),
}

/// Evaluation as reported over UCI, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

impl Score {
    pub fn negate(self) -> Self {
        match self {
            Score::Cp(cp) => Score::Cp(-cp),
            Score::Mate(n) => Score::Mate(-n),
        }
    }

    /// Converts a side-to-move score into White's point of view.
    pub fn white_pov(self, side_to_move: Color) -> Self {
        if side_to_move == Color::White { self } else { self.negate() }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "{cp:+}"),
            Score::Mate(n) => write!(f, "#{n}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub best_move: Option<String>,
    pub score: Option<Score>,
    pub pv: Vec<String>,
    pub depth: u32,
    pub nodes: u64,
}

pub trait Analyzer: Send {
    fn name(&self) -> &str;

    /// Searches `fen` for roughly `budget` and reports the final state.
    fn analyse(&mut self, fen: &str, budget: Duration) -> Result<Analysis, EngineError>;

    fn best_move(&mut self, fen: &str, budget: Duration) -> Result<Option<String>, EngineError> {
        Ok(self.analyse(fen, budget)?.best_move)
    }

    fn quit(&mut self) -> Result<(), EngineError> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_rendering() {
        assert_eq!(Score::Cp(35).to_string(), "+35");
        assert_eq!(Score::Cp(-120).to_string(), "-120");
        assert_eq!(Score::Cp(0).to_string(), "+0");
        assert_eq!(Score::Mate(3).to_string(), "#3");
        assert_eq!(Score::Mate(-2).to_string(), "#-2");
    }

    #[test]
    fn score_flips_for_black() {
        assert_eq!(Score::Cp(50).white_pov(Color::Black), Score::Cp(-50));
        assert_eq!(Score::Mate(2).white_pov(Color::White), Score::Mate(2));
    }
}
