//! Conversation sessions. Each flow owns its steps and its draft, so a session's data always
//! matches its state.

use chrono::{DateTime, NaiveDate, Utc};
use storage::{InstitutionType, PracticeType};

use crate::core::EditField;

#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Registration(RegistrationSession),
    Edit(EditSession),
    Submission(SubmissionSession),
    Creation(CreationSession),
}

impl Session {
    /// Flow and step, for logs.
    pub fn describe(&self) -> String {
        match self {
            Session::Registration(s) => format!("registration/{:?}", s.step),
            Session::Edit(s) => format!("edit/{:?}", s.step),
            Session::Submission(_) => "submission/WaitingSolution".to_string(),
            Session::Creation(s) => format!("creation/{:?}", s.step),
        }
    }
}

// --- registration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    PrivacyConsent,
    LastName,
    FirstName,
    MiddleName,
    PracticeType,
    InstitutionType,
    InstitutionName,
    Course,
    Email,
    Phone,
    StartDate,
    EndDate,
    Confirming,
}

/// Fields are only filled after passing their validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationDraft {
    pub privacy_accepted: bool,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub practice_type: Option<PracticeType>,
    pub institution_type: Option<InstitutionType>,
    pub institution_name: Option<String>,
    pub course: Option<i64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationSession {
    pub step: RegistrationStep,
    pub draft: RegistrationDraft,
}

impl RegistrationSession {
    pub fn new() -> Self {
        Self {
            step: RegistrationStep::PrivacyConsent,
            draft: RegistrationDraft::default(),
        }
    }
}

impl Default for RegistrationSession {
    fn default() -> Self {
        Self::new()
    }
}

// --- edit ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStep {
    WaitingField,
    /// For [`EditField::Dates`] this captures the start date.
    WaitingValue(EditField),
    WaitingEndDate { start: NaiveDate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub application_id: String,
    pub step: EditStep,
}

// --- submission ---

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionSession {
    pub task_id: String,
}

// --- task creation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStep {
    WaitingStudent,
    WaitingTitle,
    WaitingDescription,
    WaitingDeadline,
    WaitingReferenceLink,
    Confirming,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub reference_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreationSession {
    pub step: CreationStep,
    pub draft: TaskDraft,
}

impl CreationSession {
    pub fn new() -> Self {
        Self {
            step: CreationStep::WaitingStudent,
            draft: TaskDraft::default(),
        }
    }
}

impl Default for CreationSession {
    fn default() -> Self {
        Self::new()
    }
}
