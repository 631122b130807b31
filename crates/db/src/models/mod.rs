//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for the rows the capacity engine inserts

pub mod audit;
pub mod notification;
pub mod open_play;
pub mod reservation;
pub mod status;
