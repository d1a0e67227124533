use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::styles;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = styles)]
pub struct StyleEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = styles)]
pub struct InsertStyleEntity {
    pub name: String,
    pub slug: String,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = styles)]
pub struct EditStyleEntity {
    pub name: String,
    pub slug: String,
}
