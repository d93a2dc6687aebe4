//! Persisted entities and their creation inputs.

mod account;
mod application;
mod enums;
mod institution;
mod student;
mod task;

pub use account::{Account, NewAccount};
pub use application::{Application, NewApplication};
pub use enums::{
    AccountRole, ApplicationStatus, InstitutionType, ParseEnumError, PracticeType,
    SubmissionStatus, TaskStatus,
};
pub use institution::Institution;
pub use student::{NewStudent, Student, StudentContact, StudentDetails};
pub use task::{NewSubmission, NewTask, Task, TaskSubmission};
