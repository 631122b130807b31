pub mod audit;
pub mod error;
pub mod open_play;
pub mod types;
