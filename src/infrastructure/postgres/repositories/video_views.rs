use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, insert_into, prelude::*};

use crate::{
    domain::{
        entities::video_views::InsertVideoViewEntity,
        repositories::video_views::VideoViewRepository,
    },
    infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::video_views},
};

pub struct VideoViewPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl VideoViewPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl VideoViewRepository for VideoViewPostgres {
    async fn record_view(&self, insert_video_view_entity: InsertVideoViewEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(video_views::table)
            .values(&insert_video_view_entity)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn count_views(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = video_views::table
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}
