//! Domain types and pure logic for the labeldesk annotation service.
//!
//! This crate has no I/O. Storage lives in `labeldesk-db`, HTTP in
//! `labeldesk-api`; both reference the policy constants, closed enums and
//! validation helpers defined here.

pub mod error;
pub mod export;
pub mod ingest;
pub mod labeling;
pub mod progress;
pub mod roles;
pub mod types;
