//! Tasks assigned to students and their submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SubmissionStatus, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub reference_link: Option<String>,
    pub status: TaskStatus,
    /// `Some(false)` forbids submissions after the deadline; unset allows them.
    pub allow_late_submission: Option<bool>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// True only when the deadline passed and late work is explicitly forbidden.
    pub fn rejects_submission_at(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline && self.allow_late_submission == Some(false)
    }
}

/// Input for [`crate::PracticeStore::create_task`].
#[derive(Debug, Clone)]
pub struct NewTask {
    pub student_id: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub reference_link: Option<String>,
    pub allow_late_submission: Option<bool>,
    pub created_by: Option<i64>,
}

impl NewTask {
    pub fn into_task(self) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4().to_string(),
            student_id: self.student_id,
            title: self.title,
            description: self.description,
            deadline: self.deadline,
            reference_link: self.reference_link,
            status: TaskStatus::Assigned,
            allow_late_submission: self.allow_late_submission,
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One submission per (task, student); resubmitting overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSubmission {
    pub id: String,
    pub task_id: String,
    pub student_id: String,
    pub solution_link: Option<String>,
    pub solution_description: Option<String>,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Input for [`crate::PracticeStore::create_submission`].
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub task_id: String,
    pub student_id: String,
    pub solution_link: Option<String>,
    pub solution_description: Option<String>,
}

impl NewSubmission {
    pub fn into_submission(self) -> TaskSubmission {
        TaskSubmission {
            id: Uuid::new_v4().to_string(),
            task_id: self.task_id,
            student_id: self.student_id,
            solution_link: self.solution_link,
            solution_description: self.solution_description,
            status: SubmissionStatus::Submitted,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(deadline: DateTime<Utc>, allow: Option<bool>) -> Task {
        NewTask {
            student_id: "s".to_string(),
            title: "Отчёт".to_string(),
            description: None,
            deadline,
            reference_link: None,
            allow_late_submission: allow,
            created_by: None,
        }
        .into_task()
    }

    #[test]
    fn test_late_gate_only_when_explicitly_forbidden() {
        let now = Utc::now();
        let past = now - Duration::days(1);
        assert!(task(past, Some(false)).rejects_submission_at(now));
        assert!(!task(past, None).rejects_submission_at(now));
        assert!(!task(past, Some(true)).rejects_submission_at(now));
        assert!(!task(now + Duration::days(1), Some(false)).rejects_submission_at(now));
    }
}
