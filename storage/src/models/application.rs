//! Practice application submitted through the bot. Maps to the `applications` table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApplicationStatus, InstitutionType, PracticeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: String,
    pub account_id: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub practice_type: PracticeType,
    pub institution_type: InstitutionType,
    pub institution_name: String,
    pub course: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ApplicationStatus,
    /// Free-form audit trail; lines are appended, never rewritten.
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub student_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// "Last First Middle" with the middle name omitted when absent.
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }

    /// Appends one line to `notes`.
    pub fn append_note(&mut self, line: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, line),
            _ => line.to_string(),
        });
    }
}

/// Input for [`crate::PracticeStore::create_application`]. Status always starts as `PENDING`.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub account_id: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub practice_type: PracticeType,
    pub institution_type: InstitutionType,
    pub institution_name: String,
    pub course: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewApplication {
    pub fn into_application(self) -> Application {
        let now = Utc::now();
        Application {
            id: Uuid::new_v4().to_string(),
            account_id: self.account_id,
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            practice_type: self.practice_type,
            institution_type: self.institution_type,
            institution_name: self.institution_name,
            course: self.course,
            email: self.email,
            phone: self.phone,
            start_date: self.start_date,
            end_date: self.end_date,
            status: ApplicationStatus::Pending,
            notes: None,
            rejection_reason: None,
            student_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
