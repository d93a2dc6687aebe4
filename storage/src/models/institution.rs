//! Educational institution, created on first approval that names it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InstitutionType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub institution_type: InstitutionType,
    pub created_at: DateTime<Utc>,
}
