use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::auth_events;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = auth_events)]
pub struct InsertAuthEventEntity {
    pub user_id: Uuid,
    pub event: String,
    pub ip: String,
    pub user_agent: String,
}
