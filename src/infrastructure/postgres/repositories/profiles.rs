use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::profiles::{InsertProfileEntity, ProfileEntity},
        repositories::profiles::ProfileRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::profiles},
};

pub struct ProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ProfileRepository for ProfilePostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let profile = profiles::table
            .filter(profiles::id.eq(user_id))
            .select(ProfileEntity::as_select())
            .first::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(profile)
    }

    async fn insert_if_missing(&self, insert_profile_entity: InsertProfileEntity) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let inserted = insert_into(profiles::table)
            .values(&insert_profile_entity)
            .on_conflict(profiles::id)
            .do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }

    async fn update_full_name(
        &self,
        user_id: Uuid,
        full_name: Option<String>,
    ) -> Result<Option<ProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let profile = update(profiles::table)
            .filter(profiles::id.eq(user_id))
            .set((
                profiles::full_name.eq(full_name),
                profiles::updated_at.eq(Utc::now()),
            ))
            .returning(ProfileEntity::as_returning())
            .get_result::<ProfileEntity>(&mut conn)
            .optional()?;

        Ok(profile)
    }
}
