//! Account: the identity a chat registers under. Maps to the `accounts` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    /// Telegram chat id of the owner; unique.
    pub telegram_id: Option<i64>,
    /// Unique.
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub role: AccountRole,
    /// Set once an application is approved and a student record exists.
    pub student_id: Option<String>,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for [`crate::PracticeStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub telegram_id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
}

impl NewAccount {
    /// Builds the stored account with a generated id, student role and notifications on.
    pub fn into_account(self) -> Account {
        Account {
            id: Uuid::new_v4().to_string(),
            telegram_id: Some(self.telegram_id),
            email: self.email,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            middle_name: self.middle_name,
            role: AccountRole::Student,
            student_id: None,
            notifications_enabled: true,
            created_at: Utc::now(),
        }
    }
}
