//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row, plus any create DTOs used by its repository.

pub mod assignment;
pub mod dataset;
pub mod label;
pub mod log_row;
pub mod user;
