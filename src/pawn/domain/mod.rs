pub mod model;
pub mod tiebreak;
