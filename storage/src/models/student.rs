//! Permanent student record created when an application is approved.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Institution, PracticeType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: String,
    pub institution_id: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub course: i64,
    pub practice_type: PracticeType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }
}

/// Input for [`crate::PracticeStore::create_student`].
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub institution_id: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub course: i64,
    pub practice_type: PracticeType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewStudent {
    pub fn into_student(self) -> Student {
        Student {
            id: Uuid::new_v4().to_string(),
            institution_id: self.institution_id,
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            email: self.email,
            phone: self.phone,
            course: self.course,
            practice_type: self.practice_type,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Student with its institution, as returned by `find_student`.
#[derive(Debug, Clone)]
pub struct StudentDetails {
    pub student: Student,
    pub institution: Option<Institution>,
}

/// Active student plus the chat it can be reached at (through the linked account).
#[derive(Debug, Clone)]
pub struct StudentContact {
    pub student: Student,
    pub chat_id: Option<i64>,
    pub notifications_enabled: bool,
}
