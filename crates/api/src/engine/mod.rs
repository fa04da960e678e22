//! Labeling engine.
//!
//! Orchestrates the Row Store, Label Store, and Lease Manager repositories
//! into the operations exposed over HTTP: next-row selection with leasing,
//! label submission, lease release, spreadsheet bulk saves, and progress
//! aggregation. Every function takes the pool and policy explicitly so
//! tests can drive it without a router.

pub mod labeling;
pub mod progress;
pub mod spreadsheet;
