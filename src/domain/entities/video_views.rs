use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::video_views;

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = video_views)]
pub struct InsertVideoViewEntity {
    pub video_id: Uuid,
    pub user_id: Option<Uuid>,
}
