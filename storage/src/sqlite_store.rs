//! SQLite implementation of [`PracticeStore`].
//!
//! Uses [`SqlitePoolManager`]; the schema is created on connect. Enums are stored as their
//! SCREAMING_SNAKE_CASE codes, dates as ISO-8601 text.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use crate::error::StorageError;
use crate::models::{
    Account, Application, ApplicationStatus, Institution, InstitutionType, NewAccount,
    NewApplication, NewStudent, NewSubmission, NewTask, Student, StudentContact, StudentDetails,
    Task, TaskStatus, TaskSubmission,
};
use crate::repository::{PracticeStore, StorageResult};
use crate::sqlite_pool::SqlitePoolManager;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        telegram_id INTEGER UNIQUE,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        middle_name TEXT,
        role TEXT NOT NULL,
        student_id TEXT,
        notifications_enabled INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username)",
    "CREATE INDEX IF NOT EXISTS idx_accounts_student_id ON accounts(student_id)",
    r#"
    CREATE TABLE IF NOT EXISTS applications (
        id TEXT PRIMARY KEY,
        account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        last_name TEXT NOT NULL,
        first_name TEXT NOT NULL,
        middle_name TEXT,
        practice_type TEXT NOT NULL,
        institution_type TEXT NOT NULL,
        institution_name TEXT NOT NULL,
        course INTEGER NOT NULL,
        email TEXT,
        phone TEXT,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        status TEXT NOT NULL,
        notes TEXT,
        rejection_reason TEXT,
        student_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_applications_account_id ON applications(account_id)",
    "CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status)",
    r#"
    CREATE TABLE IF NOT EXISTS institutions (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        institution_type TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE(name, institution_type)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id TEXT PRIMARY KEY,
        institution_id TEXT NOT NULL REFERENCES institutions(id),
        last_name TEXT NOT NULL,
        first_name TEXT NOT NULL,
        middle_name TEXT,
        email TEXT,
        phone TEXT,
        course INTEGER NOT NULL,
        practice_type TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        deadline TEXT NOT NULL,
        reference_link TEXT,
        status TEXT NOT NULL,
        allow_late_submission INTEGER,
        created_by INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_student_id ON tasks(student_id)",
    r#"
    CREATE TABLE IF NOT EXISTS task_submissions (
        id TEXT PRIMARY KEY,
        task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
        student_id TEXT NOT NULL,
        solution_link TEXT,
        solution_description TEXT,
        status TEXT NOT NULL,
        submitted_at TEXT NOT NULL,
        UNIQUE(task_id, student_id)
    )
    "#,
];

#[derive(FromRow)]
struct ContactRow {
    #[sqlx(flatten)]
    student: Student,
    chat_id: Option<i64>,
    notifications_enabled: Option<bool>,
}

/// `?, ?, ?` for `n` bind parameters.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[derive(Clone)]
pub struct SqliteStore {
    pool_manager: SqlitePoolManager,
}

impl SqliteStore {
    /// Connects and creates tables if they do not exist.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let store = Self { pool_manager };
        store.init().await?;
        Ok(store)
    }

    /// Fresh private in-memory database; used by tests.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn init(&self) -> StorageResult<()> {
        info!("Creating database tables if not exist");
        let pool = self.pool_manager.pool();
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database tables created successfully");
        Ok(())
    }
}

#[async_trait]
impl PracticeStore for SqliteStore {
    async fn find_account(&self, id: &str) -> StorageResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(account)
    }

    async fn find_account_by_chat_id(&self, chat_id: i64) -> StorageResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE telegram_id = ?")
            .bind(chat_id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> StorageResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(account)
    }

    async fn find_accounts_by_username(&self, username: &str) -> StorageResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_all(self.pool_manager.pool())
            .await?;
        Ok(accounts)
    }

    async fn find_account_by_student(&self, student_id: &str) -> StorageResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE student_id = ?")
            .bind(student_id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(account)
    }

    #[instrument(skip(self, account), fields(telegram_id = account.telegram_id))]
    async fn create_account(&self, account: NewAccount) -> StorageResult<Account> {
        let account = account.into_account();
        sqlx::query(
            r#"
            INSERT INTO accounts (id, telegram_id, email, username, first_name, last_name, middle_name, role, student_id, notifications_enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(account.telegram_id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.middle_name)
        .bind(account.role)
        .bind(&account.student_id)
        .bind(account.notifications_enabled)
        .bind(account.created_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(account_id = %account.id, "Created account");
        Ok(account)
    }

    async fn delete_account(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(self.pool_manager.pool())
            .await?;
        info!(account_id = %id, deleted = result.rows_affected(), "Deleted account");
        Ok(result.rows_affected() > 0)
    }

    async fn set_notifications_enabled(&self, account_id: &str, enabled: bool) -> StorageResult<()> {
        let result = sqlx::query("UPDATE accounts SET notifications_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(account_id)
            .execute(self.pool_manager.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("account {}", account_id)));
        }
        Ok(())
    }

    #[instrument(skip(self, application), fields(account_id = %application.account_id))]
    async fn create_application(&self, application: NewApplication) -> StorageResult<Application> {
        let app = application.into_application();
        sqlx::query(
            r#"
            INSERT INTO applications (id, account_id, last_name, first_name, middle_name, practice_type, institution_type, institution_name, course, email, phone, start_date, end_date, status, notes, rejection_reason, student_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&app.id)
        .bind(&app.account_id)
        .bind(&app.last_name)
        .bind(&app.first_name)
        .bind(&app.middle_name)
        .bind(app.practice_type)
        .bind(app.institution_type)
        .bind(&app.institution_name)
        .bind(app.course)
        .bind(&app.email)
        .bind(&app.phone)
        .bind(app.start_date)
        .bind(app.end_date)
        .bind(app.status)
        .bind(&app.notes)
        .bind(&app.rejection_reason)
        .bind(&app.student_id)
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(application_id = %app.id, "Created application");
        Ok(app)
    }

    async fn find_application(&self, id: &str) -> StorageResult<Option<Application>> {
        let app = sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(app)
    }

    async fn find_applications_by_account(
        &self,
        account_id: &str,
        statuses: &[ApplicationStatus],
        limit: i64,
    ) -> StorageResult<Vec<Application>> {
        let mut sql = String::from("SELECT * FROM applications WHERE account_id = ?");
        if !statuses.is_empty() {
            sql.push_str(&format!(" AND status IN ({})", placeholders(statuses.len())));
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, Application>(&sql).bind(account_id);
        for status in statuses {
            query = query.bind(*status);
        }
        let apps = query
            .bind(limit)
            .fetch_all(self.pool_manager.pool())
            .await?;
        debug!(account_id = %account_id, count = apps.len(), "Retrieved applications");
        Ok(apps)
    }

    async fn find_applications_by_status(
        &self,
        status: ApplicationStatus,
        limit: i64,
    ) -> StorageResult<Vec<Application>> {
        let apps = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE status = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(apps)
    }

    async fn update_application(&self, app: &Application) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                last_name = ?, first_name = ?, middle_name = ?, practice_type = ?,
                institution_type = ?, institution_name = ?, course = ?, email = ?, phone = ?,
                start_date = ?, end_date = ?, status = ?, notes = ?, rejection_reason = ?,
                student_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&app.last_name)
        .bind(&app.first_name)
        .bind(&app.middle_name)
        .bind(app.practice_type)
        .bind(app.institution_type)
        .bind(&app.institution_name)
        .bind(app.course)
        .bind(&app.email)
        .bind(&app.phone)
        .bind(app.start_date)
        .bind(app.end_date)
        .bind(app.status)
        .bind(&app.notes)
        .bind(&app.rejection_reason)
        .bind(&app.student_id)
        .bind(Utc::now())
        .bind(&app.id)
        .execute(self.pool_manager.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("application {}", app.id)));
        }
        Ok(())
    }

    #[instrument(skip(self, app), fields(application_id = %app.id))]
    async fn update_application_if_status(
        &self,
        app: &Application,
        expected: ApplicationStatus,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                last_name = ?, first_name = ?, middle_name = ?, practice_type = ?,
                institution_type = ?, institution_name = ?, course = ?, email = ?, phone = ?,
                start_date = ?, end_date = ?, status = ?, notes = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(&app.last_name)
        .bind(&app.first_name)
        .bind(&app.middle_name)
        .bind(app.practice_type)
        .bind(app.institution_type)
        .bind(&app.institution_name)
        .bind(app.course)
        .bind(&app.email)
        .bind(&app.phone)
        .bind(app.start_date)
        .bind(app.end_date)
        .bind(app.status)
        .bind(&app.notes)
        .bind(Utc::now())
        .bind(&app.id)
        .bind(expected)
        .execute(self.pool_manager.pool())
        .await?;

        let written = result.rows_affected() == 1;
        if !written {
            info!(expected = %expected, "Application status changed before edit was saved");
        }
        Ok(written)
    }

    #[instrument(skip(self))]
    async fn transition_application_status(
        &self,
        id: &str,
        from: ApplicationStatus,
        to: ApplicationStatus,
        rejection_reason: Option<&str>,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = ?, rejection_reason = COALESCE(?, rejection_reason), updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to)
        .bind(rejection_reason)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(self.pool_manager.pool())
        .await?;

        let moved = result.rows_affected() == 1;
        info!(application_id = %id, from = %from, to = %to, moved, "Application status transition");
        Ok(moved)
    }

    async fn count_applications_by_status(&self, status: ApplicationStatus) -> StorageResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applications WHERE status = ?")
            .bind(status)
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(count.0)
    }

    async fn find_institution(
        &self,
        name: &str,
        institution_type: InstitutionType,
    ) -> StorageResult<Option<Institution>> {
        let institution = sqlx::query_as::<_, Institution>(
            "SELECT * FROM institutions WHERE name = ? AND institution_type = ?",
        )
        .bind(name)
        .bind(institution_type)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(institution)
    }

    async fn create_institution(
        &self,
        name: &str,
        institution_type: InstitutionType,
    ) -> StorageResult<Institution> {
        let institution = Institution {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            institution_type,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO institutions (id, name, institution_type, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&institution.id)
        .bind(&institution.name)
        .bind(institution.institution_type)
        .bind(institution.created_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(institution_id = %institution.id, name = %institution.name, "Created institution");
        Ok(institution)
    }

    async fn create_student(&self, student: NewStudent) -> StorageResult<Student> {
        let student = student.into_student();
        sqlx::query(
            r#"
            INSERT INTO students (id, institution_id, last_name, first_name, middle_name, email, phone, course, practice_type, start_date, end_date, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&student.id)
        .bind(&student.institution_id)
        .bind(&student.last_name)
        .bind(&student.first_name)
        .bind(&student.middle_name)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.course)
        .bind(student.practice_type)
        .bind(student.start_date)
        .bind(student.end_date)
        .bind(student.is_active)
        .bind(student.created_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(student_id = %student.id, "Created student");
        Ok(student)
    }

    async fn find_student(&self, id: &str) -> StorageResult<Option<StudentDetails>> {
        let pool = self.pool_manager.pool();
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        let Some(student) = student else {
            return Ok(None);
        };
        let institution = sqlx::query_as::<_, Institution>("SELECT * FROM institutions WHERE id = ?")
            .bind(&student.institution_id)
            .fetch_optional(pool)
            .await?;
        Ok(Some(StudentDetails {
            student,
            institution,
        }))
    }

    async fn update_student(&self, student: &Student) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE students SET
                institution_id = ?, last_name = ?, first_name = ?, middle_name = ?, email = ?,
                phone = ?, course = ?, practice_type = ?, start_date = ?, end_date = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&student.institution_id)
        .bind(&student.last_name)
        .bind(&student.first_name)
        .bind(&student.middle_name)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.course)
        .bind(student.practice_type)
        .bind(student.start_date)
        .bind(student.end_date)
        .bind(student.is_active)
        .bind(&student.id)
        .execute(self.pool_manager.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("student {}", student.id)));
        }
        Ok(())
    }

    async fn link_student_to_account(&self, student_id: &str, account_id: &str) -> StorageResult<()> {
        let result = sqlx::query("UPDATE accounts SET student_id = ? WHERE id = ?")
            .bind(student_id)
            .bind(account_id)
            .execute(self.pool_manager.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("account {}", account_id)));
        }
        Ok(())
    }

    async fn find_active_students(&self, today: NaiveDate) -> StorageResult<Vec<StudentContact>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT s.*, a.telegram_id AS chat_id, a.notifications_enabled AS notifications_enabled
            FROM students s
            LEFT JOIN accounts a ON a.student_id = s.id
            WHERE s.is_active = 1 AND s.end_date >= ?
            ORDER BY s.end_date ASC
            "#,
        )
        .bind(today)
        .fetch_all(self.pool_manager.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StudentContact {
                student: row.student,
                chat_id: row.chat_id,
                notifications_enabled: row.notifications_enabled.unwrap_or(false),
            })
            .collect())
    }

    async fn create_task(&self, task: NewTask) -> StorageResult<Task> {
        let task = task.into_task();
        sqlx::query(
            r#"
            INSERT INTO tasks (id, student_id, title, description, deadline, reference_link, status, allow_late_submission, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.student_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.deadline)
        .bind(&task.reference_link)
        .bind(task.status)
        .bind(task.allow_late_submission)
        .bind(task.created_by)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(task_id = %task.id, student_id = %task.student_id, "Created task");
        Ok(task)
    }

    async fn find_task(&self, id: &str) -> StorageResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool_manager.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_by_student(
        &self,
        student_id: &str,
        statuses: &[TaskStatus],
    ) -> StorageResult<Vec<Task>> {
        let mut sql = String::from("SELECT * FROM tasks WHERE student_id = ?");
        if !statuses.is_empty() {
            sql.push_str(&format!(" AND status IN ({})", placeholders(statuses.len())));
        }
        sql.push_str(" ORDER BY deadline ASC");

        let mut query = sqlx::query_as::<_, Task>(&sql).bind(student_id);
        for status in statuses {
            query = query.bind(*status);
        }
        let tasks = query.fetch_all(self.pool_manager.pool()).await?;
        debug!(student_id = %student_id, count = tasks.len(), "Retrieved tasks");
        Ok(tasks)
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool_manager.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }

    async fn find_submission(
        &self,
        task_id: &str,
        student_id: &str,
    ) -> StorageResult<Option<TaskSubmission>> {
        let submission = sqlx::query_as::<_, TaskSubmission>(
            "SELECT * FROM task_submissions WHERE task_id = ? AND student_id = ?",
        )
        .bind(task_id)
        .bind(student_id)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(submission)
    }

    async fn create_submission(&self, submission: NewSubmission) -> StorageResult<TaskSubmission> {
        let submission = submission.into_submission();
        sqlx::query(
            r#"
            INSERT INTO task_submissions (id, task_id, student_id, solution_link, solution_description, status, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.id)
        .bind(&submission.task_id)
        .bind(&submission.student_id)
        .bind(&submission.solution_link)
        .bind(&submission.solution_description)
        .bind(submission.status)
        .bind(submission.submitted_at)
        .execute(self.pool_manager.pool())
        .await?;

        info!(submission_id = %submission.id, task_id = %submission.task_id, "Created submission");
        Ok(submission)
    }

    async fn update_submission(&self, submission: &TaskSubmission) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE task_submissions
            SET solution_link = ?, solution_description = ?, status = ?, submitted_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&submission.solution_link)
        .bind(&submission.solution_description)
        .bind(submission.status)
        .bind(submission.submitted_at)
        .bind(&submission.id)
        .execute(self.pool_manager.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("submission {}", submission.id)));
        }
        Ok(())
    }
}
