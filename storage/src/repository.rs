//! The persistence gateway used by the bot. Implementations: [`crate::SqliteStore`].

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StorageError;
use crate::models::{
    Account, Application, ApplicationStatus, Institution, InstitutionType, NewAccount,
    NewApplication, NewStudent, NewSubmission, NewTask, Student, StudentContact, StudentDetails,
    Task, TaskStatus, TaskSubmission,
};

pub type StorageResult<T> = Result<T, StorageError>;

/// Data operations required by the conversation layer.
///
/// Lookups return `Ok(None)` for missing rows; `NotFound` is reserved for writes that target a
/// missing row. Unique violations surface as `AlreadyExists(column)`.
#[async_trait]
pub trait PracticeStore: Send + Sync {
    // --- accounts ---
    async fn find_account(&self, id: &str) -> StorageResult<Option<Account>>;
    async fn find_account_by_chat_id(&self, chat_id: i64) -> StorageResult<Option<Account>>;
    async fn find_account_by_email(&self, email: &str) -> StorageResult<Option<Account>>;
    async fn find_accounts_by_username(&self, username: &str) -> StorageResult<Vec<Account>>;
    async fn find_account_by_student(&self, student_id: &str) -> StorageResult<Option<Account>>;
    async fn create_account(&self, account: NewAccount) -> StorageResult<Account>;
    /// Deletes the account and (by cascade) its applications. Returns false if nothing matched.
    async fn delete_account(&self, id: &str) -> StorageResult<bool>;
    async fn set_notifications_enabled(&self, account_id: &str, enabled: bool) -> StorageResult<()>;

    // --- applications ---
    async fn create_application(&self, application: NewApplication) -> StorageResult<Application>;
    async fn find_application(&self, id: &str) -> StorageResult<Option<Application>>;
    /// Newest first. An empty `statuses` slice means no status filter.
    async fn find_applications_by_account(
        &self,
        account_id: &str,
        statuses: &[ApplicationStatus],
        limit: i64,
    ) -> StorageResult<Vec<Application>>;
    async fn find_applications_by_status(
        &self,
        status: ApplicationStatus,
        limit: i64,
    ) -> StorageResult<Vec<Application>>;
    /// Writes every mutable column of the application and bumps `updated_at`.
    async fn update_application(&self, application: &Application) -> StorageResult<()>;
    /// Writes the applicant-editable columns plus `status` and `notes`, only while the stored
    /// status is still `expected`. Student link and rejection reason are left alone. Returns
    /// false when the status moved in the meantime.
    async fn update_application_if_status(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> StorageResult<bool>;
    /// Atomically moves `id` from `from` to `to`. Returns false when the row was not in `from`.
    async fn transition_application_status(
        &self,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
        rejection_reason: Option<&str>,
    ) -> StorageResult<bool>;
    async fn count_applications_by_status(&self, status: ApplicationStatus) -> StorageResult<i64>;

    // --- institutions ---
    async fn find_institution(
        &self,
        name: &str,
        institution_type: InstitutionType,
    ) -> StorageResult<Option<Institution>>;
    async fn create_institution(
        &self,
        name: &str,
        institution_type: InstitutionType,
    ) -> StorageResult<Institution>;

    // --- students ---
    async fn create_student(&self, student: NewStudent) -> StorageResult<Student>;
    async fn find_student(&self, id: &str) -> StorageResult<Option<StudentDetails>>;
    async fn update_student(&self, student: &Student) -> StorageResult<()>;
    /// Points the account at its student record.
    async fn link_student_to_account(&self, student_id: &str, account_id: &str) -> StorageResult<()>;
    /// Active students whose practice has not ended before `today`.
    async fn find_active_students(&self, today: NaiveDate) -> StorageResult<Vec<StudentContact>>;

    // --- tasks ---
    async fn create_task(&self, task: NewTask) -> StorageResult<Task>;
    async fn find_task(&self, id: &str) -> StorageResult<Option<Task>>;
    /// Ordered by deadline. An empty `statuses` slice means no status filter.
    async fn find_tasks_by_student(
        &self,
        student_id: &str,
        statuses: &[TaskStatus],
    ) -> StorageResult<Vec<Task>>;
    async fn update_task_status(&self, id: &str, status: TaskStatus) -> StorageResult<()>;

    // --- submissions ---
    async fn find_submission(
        &self,
        task_id: &str,
        student_id: &str,
    ) -> StorageResult<Option<TaskSubmission>>;
    async fn create_submission(&self, submission: NewSubmission) -> StorageResult<TaskSubmission>;
    async fn update_submission(&self, submission: &TaskSubmission) -> StorageResult<()>;
}
