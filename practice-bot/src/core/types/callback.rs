//! Inline-button payloads. Encoded as `prefix:argument` strings (Telegram caps them at 64 bytes)
//! and decoded once, at the transport boundary.

use std::str::FromStr;
use storage::{InstitutionType, PracticeType};

/// Application attribute selectable in the edit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditField {
    LastName,
    FirstName,
    MiddleName,
    PracticeType,
    InstitutionType,
    InstitutionName,
    Course,
    Email,
    Phone,
    /// Start and end date, captured one after the other.
    Dates,
}

impl EditField {
    pub const ALL: [EditField; 10] = [
        EditField::LastName,
        EditField::FirstName,
        EditField::MiddleName,
        EditField::PracticeType,
        EditField::InstitutionType,
        EditField::InstitutionName,
        EditField::Course,
        EditField::Email,
        EditField::Phone,
        EditField::Dates,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EditField::LastName => "last_name",
            EditField::FirstName => "first_name",
            EditField::MiddleName => "middle_name",
            EditField::PracticeType => "practice_type",
            EditField::InstitutionType => "institution_type",
            EditField::InstitutionName => "institution_name",
            EditField::Course => "course",
            EditField::Email => "email",
            EditField::Phone => "phone",
            EditField::Dates => "dates",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        EditField::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Button caption.
    pub fn label(&self) -> &'static str {
        match self {
            EditField::LastName => "Фамилия",
            EditField::FirstName => "Имя",
            EditField::MiddleName => "Отчество",
            EditField::PracticeType => "Тип практики",
            EditField::InstitutionType => "Тип учебного заведения",
            EditField::InstitutionName => "Учебное заведение",
            EditField::Course => "Курс",
            EditField::Email => "Email",
            EditField::Phone => "Телефон",
            EditField::Dates => "Даты практики",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    PrivacyAccept,
    PrivacyDecline,
    RegistrationPracticeType(PracticeType),
    RegistrationInstitutionType(InstitutionType),
    ConfirmRegistration,
    CancelRegistration,
    EditField(EditField),
    EditPracticeType(PracticeType),
    EditInstitutionType(InstitutionType),
    CancelEdit,
    SubmitTask(String),
    NewTaskStudent(String),
    ConfirmNewTask,
    CancelNewTask,
    Approve(String),
    Reject(String),
    Notifications(bool),
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::PrivacyAccept => "privacy:accept".to_string(),
            CallbackAction::PrivacyDecline => "privacy:decline".to_string(),
            CallbackAction::RegistrationPracticeType(t) => format!("reg_practice:{}", t.as_str()),
            CallbackAction::RegistrationInstitutionType(t) => format!("reg_inst:{}", t.as_str()),
            CallbackAction::ConfirmRegistration => "reg:confirm".to_string(),
            CallbackAction::CancelRegistration => "reg:cancel".to_string(),
            CallbackAction::EditField(f) => format!("edit_field:{}", f.code()),
            CallbackAction::EditPracticeType(t) => format!("edit_practice:{}", t.as_str()),
            CallbackAction::EditInstitutionType(t) => format!("edit_inst:{}", t.as_str()),
            CallbackAction::CancelEdit => "edit:cancel".to_string(),
            CallbackAction::SubmitTask(id) => format!("task_submit:{}", id),
            CallbackAction::NewTaskStudent(id) => format!("newtask_student:{}", id),
            CallbackAction::ConfirmNewTask => "newtask:confirm".to_string(),
            CallbackAction::CancelNewTask => "newtask:cancel".to_string(),
            CallbackAction::Approve(id) => format!("app_approve:{}", id),
            CallbackAction::Reject(id) => format!("app_reject:{}", id),
            CallbackAction::Notifications(true) => "notify:on".to_string(),
            CallbackAction::Notifications(false) => "notify:off".to_string(),
        }
    }

    /// `None` for unknown prefixes or malformed arguments (stale keyboards from older builds).
    pub fn decode(data: &str) -> Option<Self> {
        let (prefix, arg) = data.split_once(':')?;
        let action = match (prefix, arg) {
            ("privacy", "accept") => CallbackAction::PrivacyAccept,
            ("privacy", "decline") => CallbackAction::PrivacyDecline,
            ("reg_practice", code) => CallbackAction::RegistrationPracticeType(code.parse().ok()?),
            ("reg_inst", code) => CallbackAction::RegistrationInstitutionType(code.parse().ok()?),
            ("reg", "confirm") => CallbackAction::ConfirmRegistration,
            ("reg", "cancel") => CallbackAction::CancelRegistration,
            ("edit_field", code) => CallbackAction::EditField(EditField::from_code(code)?),
            ("edit_practice", code) => CallbackAction::EditPracticeType(code.parse().ok()?),
            ("edit_inst", code) => CallbackAction::EditInstitutionType(code.parse().ok()?),
            ("edit", "cancel") => CallbackAction::CancelEdit,
            ("task_submit", id) if !id.is_empty() => CallbackAction::SubmitTask(id.to_string()),
            ("newtask_student", id) if !id.is_empty() => {
                CallbackAction::NewTaskStudent(id.to_string())
            }
            ("newtask", "confirm") => CallbackAction::ConfirmNewTask,
            ("newtask", "cancel") => CallbackAction::CancelNewTask,
            ("app_approve", id) if !id.is_empty() => CallbackAction::Approve(id.to_string()),
            ("app_reject", id) if !id.is_empty() => CallbackAction::Reject(id.to_string()),
            ("notify", "on") => CallbackAction::Notifications(true),
            ("notify", "off") => CallbackAction::Notifications(false),
            _ => return None,
        };
        Some(action)
    }

    /// Payloads that only make sense inside a registration session.
    pub fn belongs_to_registration(&self) -> bool {
        matches!(
            self,
            CallbackAction::PrivacyAccept
                | CallbackAction::PrivacyDecline
                | CallbackAction::RegistrationPracticeType(_)
                | CallbackAction::RegistrationInstitutionType(_)
                | CallbackAction::ConfirmRegistration
                | CallbackAction::CancelRegistration
        )
    }

    /// Payloads that only make sense inside an edit session.
    pub fn belongs_to_edit(&self) -> bool {
        matches!(
            self,
            CallbackAction::EditField(_)
                | CallbackAction::EditPracticeType(_)
                | CallbackAction::EditInstitutionType(_)
                | CallbackAction::CancelEdit
        )
    }

    /// Payloads that only make sense inside a task-creation session.
    pub fn belongs_to_task_creation(&self) -> bool {
        matches!(
            self,
            CallbackAction::NewTaskStudent(_)
                | CallbackAction::ConfirmNewTask
                | CallbackAction::CancelNewTask
        )
    }
}

impl FromStr for CallbackAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallbackAction::decode(s).ok_or_else(|| format!("unknown callback payload: {}", s))
    }
}
