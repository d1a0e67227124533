use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into};

use crate::{
    domain::{
        entities::auth_events::InsertAuthEventEntity,
        repositories::auth_events::AuthEventRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::auth_events},
};

pub struct AuthEventPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl AuthEventPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AuthEventRepository for AuthEventPostgres {
    async fn record(&self, insert_auth_event_entity: InsertAuthEventEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(auth_events::table)
            .values(&insert_auth_event_entity)
            .execute(&mut conn)?;

        Ok(())
    }
}
