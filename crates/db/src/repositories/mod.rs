//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! a `&PgPool` or, when the call must join a caller's transaction, any
//! [`sqlx::PgExecutor`].

pub mod assignment_repo;
pub mod dataset_repo;
pub mod label_repo;
pub mod log_row_repo;
pub mod progress_repo;
pub mod user_repo;

pub use assignment_repo::AssignmentRepo;
pub use dataset_repo::DatasetRepo;
pub use label_repo::LabelRepo;
pub use log_row_repo::LogRowRepo;
pub use progress_repo::ProgressRepo;
pub use user_repo::UserRepo;
