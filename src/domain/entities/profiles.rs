use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::profiles;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = profiles)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role is left to the column default (`member`).
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct InsertProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}
