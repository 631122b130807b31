pub mod background;
pub mod config;
pub mod error;
pub mod open_play;
