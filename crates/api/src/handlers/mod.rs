pub mod auth;
pub mod datasets;
pub mod export;
pub mod labeling;
pub mod spreadsheet;
