//! Storage crate: persistence for the practice bot.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – Account, Application, Institution, Student, Task, TaskSubmission
//! - [`repository`] – [`PracticeStore`] trait (the gateway the bot talks to)
//! - [`sqlite_store`] – [`SqliteStore`] (SQLite via sqlx)
//! - [`sqlite_pool`] – [`SqlitePoolManager`]

mod error;
mod models;
mod repository;
mod sqlite_pool;
mod sqlite_store;

pub use error::StorageError;
pub use models::{
    Account, AccountRole, Application, ApplicationStatus, Institution, InstitutionType,
    NewAccount, NewApplication, NewStudent, NewSubmission, NewTask, ParseEnumError, PracticeType,
    Student, StudentContact, StudentDetails, SubmissionStatus, Task, TaskStatus, TaskSubmission,
};
pub use repository::{PracticeStore, StorageResult};
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqliteStore;
