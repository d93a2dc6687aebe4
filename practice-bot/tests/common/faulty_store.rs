//! A [`PracticeStore`] over a real SQLite store that can be told to fail the next application
//! insert, so the engine's conflict and fail-closed paths can be exercised.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use storage::{
    Account, Application, ApplicationStatus, Institution, InstitutionType, NewAccount,
    NewApplication, NewStudent, NewSubmission, NewTask, PracticeStore, SqliteStore, StorageError,
    StorageResult, Student, StudentContact, StudentDetails, Task, TaskStatus, TaskSubmission,
};

#[derive(Debug, Clone)]
pub enum Fault {
    /// Unique violation on the given column, e.g. `accounts.email`.
    Conflict(String),
    /// Any other database failure.
    Database(String),
}

impl Fault {
    fn into_error(self) -> StorageError {
        match self {
            Fault::Conflict(column) => StorageError::AlreadyExists(column),
            Fault::Database(message) => StorageError::Database(message),
        }
    }
}

pub struct FaultyStore {
    inner: Arc<SqliteStore>,
    application_fault: Mutex<Option<Fault>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            application_fault: Mutex::new(None),
        }
    }

    /// The next `create_application` fails with `fault` instead of inserting.
    pub fn fail_next_application(&self, fault: Fault) {
        *self.application_fault.lock().unwrap() = Some(fault);
    }
}

#[async_trait]
impl PracticeStore for FaultyStore {
    async fn find_account(&self, id: &str) -> StorageResult<Option<Account>> {
        self.inner.find_account(id).await
    }

    async fn find_account_by_chat_id(&self, chat_id: i64) -> StorageResult<Option<Account>> {
        self.inner.find_account_by_chat_id(chat_id).await
    }

    async fn find_account_by_email(&self, email: &str) -> StorageResult<Option<Account>> {
        self.inner.find_account_by_email(email).await
    }

    async fn find_accounts_by_username(&self, username: &str) -> StorageResult<Vec<Account>> {
        self.inner.find_accounts_by_username(username).await
    }

    async fn find_account_by_student(&self, student_id: &str) -> StorageResult<Option<Account>> {
        self.inner.find_account_by_student(student_id).await
    }

    async fn create_account(&self, account: NewAccount) -> StorageResult<Account> {
        self.inner.create_account(account).await
    }

    async fn delete_account(&self, id: &str) -> StorageResult<bool> {
        self.inner.delete_account(id).await
    }

    async fn set_notifications_enabled(&self, account_id: &str, enabled: bool) -> StorageResult<()> {
        self.inner.set_notifications_enabled(account_id, enabled).await
    }

    async fn create_application(&self, application: NewApplication) -> StorageResult<Application> {
        let fault = self.application_fault.lock().unwrap().take();
        match fault {
            Some(fault) => Err(fault.into_error()),
            None => self.inner.create_application(application).await,
        }
    }

    async fn find_application(&self, id: &str) -> StorageResult<Option<Application>> {
        self.inner.find_application(id).await
    }

    async fn find_applications_by_account(
        &self,
        account_id: &str,
        statuses: &[ApplicationStatus],
        limit: i64,
    ) -> StorageResult<Vec<Application>> {
        self.inner
            .find_applications_by_account(account_id, statuses, limit)
            .await
    }

    async fn find_applications_by_status(
        &self,
        status: ApplicationStatus,
        limit: i64,
    ) -> StorageResult<Vec<Application>> {
        self.inner.find_applications_by_status(status, limit).await
    }

    async fn update_application(&self, application: &Application) -> StorageResult<()> {
        self.inner.update_application(application).await
    }

    async fn update_application_if_status(
        &self,
        application: &Application,
        expected: ApplicationStatus,
    ) -> StorageResult<bool> {
        self.inner
            .update_application_if_status(application, expected)
            .await
    }

    async fn transition_application_status(
        &self,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
        rejection_reason: Option<&str>,
    ) -> StorageResult<bool> {
        self.inner
            .transition_application_status(id, from, to, rejection_reason)
            .await
    }

    async fn count_applications_by_status(&self, status: ApplicationStatus) -> StorageResult<i64> {
        self.inner.count_applications_by_status(status).await
    }

    async fn find_institution(
        &self,
        name: &str,
        institution_type: InstitutionType,
    ) -> StorageResult<Option<Institution>> {
        self.inner.find_institution(name, institution_type).await
    }

    async fn create_institution(
        &self,
        name: &str,
        institution_type: InstitutionType,
    ) -> StorageResult<Institution> {
        self.inner.create_institution(name, institution_type).await
    }

    async fn create_student(&self, student: NewStudent) -> StorageResult<Student> {
        self.inner.create_student(student).await
    }

    async fn find_student(&self, id: &str) -> StorageResult<Option<StudentDetails>> {
        self.inner.find_student(id).await
    }

    async fn update_student(&self, student: &Student) -> StorageResult<()> {
        self.inner.update_student(student).await
    }

    async fn link_student_to_account(&self, student_id: &str, account_id: &str) -> StorageResult<()> {
        self.inner.link_student_to_account(student_id, account_id).await
    }

    async fn find_active_students(&self, today: NaiveDate) -> StorageResult<Vec<StudentContact>> {
        self.inner.find_active_students(today).await
    }

    async fn create_task(&self, task: NewTask) -> StorageResult<Task> {
        self.inner.create_task(task).await
    }

    async fn find_task(&self, id: &str) -> StorageResult<Option<Task>> {
        self.inner.find_task(id).await
    }

    async fn find_tasks_by_student(
        &self,
        student_id: &str,
        statuses: &[TaskStatus],
    ) -> StorageResult<Vec<Task>> {
        self.inner.find_tasks_by_student(student_id, statuses).await
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> StorageResult<()> {
        self.inner.update_task_status(id, status).await
    }

    async fn find_submission(
        &self,
        task_id: &str,
        student_id: &str,
    ) -> StorageResult<Option<TaskSubmission>> {
        self.inner.find_submission(task_id, student_id).await
    }

    async fn create_submission(&self, submission: NewSubmission) -> StorageResult<TaskSubmission> {
        self.inner.create_submission(submission).await
    }

    async fn update_submission(&self, submission: &TaskSubmission) -> StorageResult<()> {
        self.inner.update_submission(submission).await
    }
}
