use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::videos;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = videos)]
pub struct VideoEntity {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<i32>,
    pub teacher: Option<String>,
    pub published: bool,
    pub video_path: Option<String>,
    pub preview_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = videos)]
pub struct InsertVideoEntity {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<i32>,
    pub teacher: Option<String>,
    pub published: bool,
    pub video_path: Option<String>,
    pub preview_path: Option<String>,
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = videos)]
#[diesel(treat_none_as_null = true)]
pub struct EditVideoEntity {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<i32>,
    pub teacher: Option<String>,
    pub published: bool,
    pub video_path: Option<String>,
    pub preview_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub updated_at: DateTime<Utc>,
}
