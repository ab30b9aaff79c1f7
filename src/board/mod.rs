pub mod cozy;

pub use cozy::{color_name, Outcome, Position, PositionError, STARTPOS_FEN};
