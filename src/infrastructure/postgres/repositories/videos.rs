use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    RunQueryDsl, delete, dsl::count_star, insert_into, pg::Pg, prelude::*, update,
};
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            levels::LevelEntity,
            styles::StyleEntity,
            videos::{EditVideoEntity, InsertVideoEntity, VideoEntity},
        },
        repositories::videos::VideoRepository,
        value_objects::{enums::video_sorts::VideoSort, videos::VideoFilter},
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{levels, styles, video_levels, video_styles, video_views, videos},
    },
};

pub struct VideoPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl VideoPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

type BoxedVideoQuery<'a> = videos::BoxedQuery<'a, Pg>;

fn published_matching(filter: &VideoFilter) -> BoxedVideoQuery<'static> {
    let mut query = videos::table
        .filter(videos::published.eq(true))
        .into_boxed();

    if let Some(style_id) = filter.style_id {
        query = query.filter(
            videos::id.eq_any(
                video_styles::table
                    .filter(video_styles::style_id.eq(style_id))
                    .select(video_styles::video_id),
            ),
        );
    }

    if let Some(level_id) = filter.level_id {
        query = query.filter(
            videos::id.eq_any(
                video_levels::table
                    .filter(video_levels::level_id.eq(level_id))
                    .select(video_levels::video_id),
            ),
        );
    }

    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            videos::title
                .ilike(pattern.clone())
                .or(videos::description.ilike(pattern)),
        );
    }

    query
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Most-viewed first; candidates arrive newest-first and the stable sort keeps that order among ties.
fn rank_by_views(
    mut candidates: Vec<VideoEntity>,
    view_counts: &HashMap<Uuid, i64>,
    limit: usize,
) -> Vec<VideoEntity> {
    candidates.sort_by_key(|video| {
        std::cmp::Reverse(view_counts.get(&video.id).copied().unwrap_or(0))
    });
    candidates.truncate(limit);
    candidates
}

fn link_rows(
    conn: &mut PgConnection,
    video_id: Uuid,
    style_ids: &[Uuid],
    level_ids: &[Uuid],
) -> QueryResult<()> {
    if !style_ids.is_empty() {
        let rows: Vec<_> = style_ids
            .iter()
            .map(|style_id| {
                (
                    video_styles::video_id.eq(video_id),
                    video_styles::style_id.eq(*style_id),
                )
            })
            .collect();
        insert_into(video_styles::table).values(&rows).execute(conn)?;
    }

    if !level_ids.is_empty() {
        let rows: Vec<_> = level_ids
            .iter()
            .map(|level_id| {
                (
                    video_levels::video_id.eq(video_id),
                    video_levels::level_id.eq(*level_id),
                )
            })
            .collect();
        insert_into(video_levels::table).values(&rows).execute(conn)?;
    }

    Ok(())
}

fn unlink_rows(conn: &mut PgConnection, video_id: Uuid) -> QueryResult<()> {
    delete(video_styles::table.filter(video_styles::video_id.eq(video_id))).execute(conn)?;
    delete(video_levels::table.filter(video_levels::video_id.eq(video_id))).execute(conn)?;
    Ok(())
}

#[async_trait]
impl VideoRepository for VideoPostgres {
    async fn list_published(&self, filter: VideoFilter) -> Result<Vec<VideoEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<VideoEntity>> {
            let mut conn = db_pool.get()?;
            let query = published_matching(&filter);

            let results = match filter.sort {
                VideoSort::Newest => query
                    .order(videos::created_at.desc())
                    .limit(filter.limit)
                    .select(VideoEntity::as_select())
                    .load::<VideoEntity>(&mut conn)?,
                VideoSort::Duration => query
                    .order((videos::duration_seconds.asc(), videos::created_at.desc()))
                    .limit(filter.limit)
                    .select(VideoEntity::as_select())
                    .load::<VideoEntity>(&mut conn)?,
                VideoSort::Popular => {
                    let candidates = query
                        .order(videos::created_at.desc())
                        .select(VideoEntity::as_select())
                        .load::<VideoEntity>(&mut conn)?;
                    let candidate_ids: Vec<Uuid> =
                        candidates.iter().map(|video| video.id).collect();

                    let view_counts: HashMap<Uuid, i64> = video_views::table
                        .filter(video_views::video_id.eq_any(candidate_ids))
                        .group_by(video_views::video_id)
                        .select((video_views::video_id, count_star()))
                        .load::<(Uuid, i64)>(&mut conn)?
                        .into_iter()
                        .collect();

                    rank_by_views(
                        candidates,
                        &view_counts,
                        usize::try_from(filter.limit).unwrap_or(0),
                    )
                }
            };

            Ok(results)
        })
        .await??)
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<VideoEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let slug = slug.to_string();

        Ok(task::spawn_blocking(move || -> Result<Option<VideoEntity>> {
            let mut conn = db_pool.get()?;

            let video = videos::table
                .filter(videos::slug.eq(slug))
                .filter(videos::published.eq(true))
                .select(VideoEntity::as_select())
                .first::<VideoEntity>(&mut conn)
                .optional()?;

            Ok(video)
        })
        .await??)
    }

    async fn list_related(
        &self,
        video_id: Uuid,
        style_ids: Vec<Uuid>,
        limit: i64,
    ) -> Result<Vec<VideoEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<VideoEntity>> {
            let mut conn = db_pool.get()?;

            let results = videos::table
                .filter(videos::published.eq(true))
                .filter(videos::id.ne(video_id))
                .filter(
                    videos::id.eq_any(
                        video_styles::table
                            .filter(video_styles::style_id.eq_any(style_ids))
                            .select(video_styles::video_id),
                    ),
                )
                .order(videos::created_at.desc())
                .limit(limit)
                .select(VideoEntity::as_select())
                .load::<VideoEntity>(&mut conn)?;

            Ok(results)
        })
        .await??)
    }

    async fn styles_for_videos(&self, video_ids: Vec<Uuid>) -> Result<Vec<(Uuid, StyleEntity)>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<(Uuid, StyleEntity)>> {
            let mut conn = db_pool.get()?;

            let results = video_styles::table
                .inner_join(styles::table)
                .filter(video_styles::video_id.eq_any(video_ids))
                .order((styles::position.asc(), styles::name.asc()))
                .select((video_styles::video_id, StyleEntity::as_select()))
                .load::<(Uuid, StyleEntity)>(&mut conn)?;

            Ok(results)
        })
        .await??)
    }

    async fn levels_for_videos(&self, video_ids: Vec<Uuid>) -> Result<Vec<(Uuid, LevelEntity)>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<(Uuid, LevelEntity)>> {
            let mut conn = db_pool.get()?;

            let results = video_levels::table
                .inner_join(levels::table)
                .filter(video_levels::video_id.eq_any(video_ids))
                .order((levels::position.asc(), levels::name.asc()))
                .select((video_levels::video_id, LevelEntity::as_select()))
                .load::<(Uuid, LevelEntity)>(&mut conn)?;

            Ok(results)
        })
        .await??)
    }

    async fn list_all(&self) -> Result<Vec<VideoEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = videos::table
            .order(videos::created_at.desc())
            .select(VideoEntity::as_select())
            .load::<VideoEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<VideoEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let video = videos::table
            .filter(videos::id.eq(video_id))
            .select(VideoEntity::as_select())
            .first::<VideoEntity>(&mut conn)
            .optional()?;

        Ok(video)
    }

    async fn create_video(
        &self,
        insert_video_entity: InsertVideoEntity,
        style_ids: Vec<Uuid>,
        level_ids: Vec<Uuid>,
    ) -> Result<VideoEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let video = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let video = insert_into(videos::table)
                .values(&insert_video_entity)
                .returning(VideoEntity::as_returning())
                .get_result::<VideoEntity>(conn)?;
            link_rows(conn, video.id, &style_ids, &level_ids)?;
            Ok(video)
        })?;

        Ok(video)
    }

    async fn update_video(
        &self,
        video_id: Uuid,
        edit_video_entity: EditVideoEntity,
        style_ids: Vec<Uuid>,
        level_ids: Vec<Uuid>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let updated = update(videos::table)
                .filter(videos::id.eq(video_id))
                .set(&edit_video_entity)
                .execute(conn)?;
            if updated == 0 {
                return Ok(false);
            }

            unlink_rows(conn, video_id)?;
            link_rows(conn, video_id, &style_ids, &level_ids)?;
            Ok(true)
        })?;

        Ok(updated)
    }

    async fn delete_video(&self, video_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            unlink_rows(conn, video_id)?;
            delete(video_views::table.filter(video_views::video_id.eq(video_id)))
                .execute(conn)?;
            delete(videos::table.filter(videos::id.eq(video_id))).execute(conn)
        })?;

        Ok(deleted > 0)
    }

    async fn count_videos(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = videos::table.count().get_result::<i64>(&mut conn)?;

        Ok(total)
    }

    async fn count_published_videos(&self) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let total = videos::table
            .filter(videos::published.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total)
    }
}
