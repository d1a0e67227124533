use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, dsl::max, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::levels::{InsertLevelEntity, LevelEntity},
        repositories::levels::LevelRepository,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{levels, video_levels},
    },
};

pub struct LevelPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LevelPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl LevelRepository for LevelPostgres {
    async fn list_levels(&self) -> Result<Vec<LevelEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = levels::table
            .order((levels::position.asc(), levels::name.asc()))
            .select(LevelEntity::as_select())
            .load::<LevelEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_level(&self, name: String) -> Result<LevelEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let level = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let last_position = levels::table
                .select(max(levels::position))
                .first::<Option<i32>>(conn)?;

            insert_into(levels::table)
                .values(&InsertLevelEntity {
                    name,
                    position: last_position.map_or(0, |position| position + 1),
                })
                .returning(LevelEntity::as_returning())
                .get_result::<LevelEntity>(conn)
        })?;

        Ok(level)
    }

    async fn rename_level(&self, level_id: Uuid, name: String) -> Result<Option<LevelEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let level = update(levels::table)
            .filter(levels::id.eq(level_id))
            .set(levels::name.eq(name))
            .returning(LevelEntity::as_returning())
            .get_result::<LevelEntity>(&mut conn)
            .optional()?;

        Ok(level)
    }

    async fn delete_level(&self, level_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            delete(video_levels::table.filter(video_levels::level_id.eq(level_id)))
                .execute(conn)?;
            delete(levels::table.filter(levels::id.eq(level_id))).execute(conn)
        })?;

        Ok(deleted > 0)
    }

    async fn upsert_level(&self, insert_level_entity: InsertLevelEntity) -> Result<LevelEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let level = insert_into(levels::table)
            .values(&insert_level_entity)
            .on_conflict(levels::name)
            .do_update()
            .set(&insert_level_entity)
            .returning(LevelEntity::as_returning())
            .get_result::<LevelEntity>(&mut conn)?;

        Ok(level)
    }
}
