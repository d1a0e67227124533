use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, dsl::max, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::styles::{EditStyleEntity, InsertStyleEntity, StyleEntity},
        repositories::styles::StyleRepository,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{styles, video_styles},
    },
};

pub struct StylePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StylePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StyleRepository for StylePostgres {
    async fn list_styles(&self) -> Result<Vec<StyleEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = styles::table
            .order((styles::position.asc(), styles::name.asc()))
            .select(StyleEntity::as_select())
            .load::<StyleEntity>(&mut conn)?;

        Ok(results)
    }

    async fn create_style(&self, name: String, slug: String) -> Result<StyleEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let style = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let last_position = styles::table
                .select(max(styles::position))
                .first::<Option<i32>>(conn)?;

            insert_into(styles::table)
                .values(&InsertStyleEntity {
                    name,
                    slug,
                    position: last_position.map_or(0, |position| position + 1),
                })
                .returning(StyleEntity::as_returning())
                .get_result::<StyleEntity>(conn)
        })?;

        Ok(style)
    }

    async fn update_style(
        &self,
        style_id: Uuid,
        edit_style_entity: EditStyleEntity,
    ) -> Result<Option<StyleEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let style = update(styles::table)
            .filter(styles::id.eq(style_id))
            .set(&edit_style_entity)
            .returning(StyleEntity::as_returning())
            .get_result::<StyleEntity>(&mut conn)
            .optional()?;

        Ok(style)
    }

    async fn delete_style(&self, style_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            delete(video_styles::table.filter(video_styles::style_id.eq(style_id)))
                .execute(conn)?;
            delete(styles::table.filter(styles::id.eq(style_id))).execute(conn)
        })?;

        Ok(deleted > 0)
    }

    async fn upsert_style(&self, insert_style_entity: InsertStyleEntity) -> Result<StyleEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let style = insert_into(styles::table)
            .values(&insert_style_entity)
            .on_conflict(styles::slug)
            .do_update()
            .set(&insert_style_entity)
            .returning(StyleEntity::as_returning())
            .get_result::<StyleEntity>(&mut conn)?;

        Ok(style)
    }
}
