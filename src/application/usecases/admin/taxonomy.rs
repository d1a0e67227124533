use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use super::{AdminError, UseCaseResult, write_error};
use crate::domain::{
    entities::{
        levels::InsertLevelEntity,
        styles::{EditStyleEntity, InsertStyleEntity},
    },
    repositories::{levels::LevelRepository, styles::StyleRepository},
    value_objects::taxonomy::{
        LevelDto, LevelModel, StyleDto, StyleModel, TaxonomyDto, is_valid_slug, slugify,
    },
};

pub const DEFAULT_STYLES: [(&str, &str); 3] =
    [("Salsa", "salsa"), ("Bachata", "bachata"), ("Kizomba", "kizomba")];
pub const DEFAULT_LEVELS: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

pub struct AdminTaxonomyUseCase<S, L>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    style_repo: Arc<S>,
    level_repo: Arc<L>,
}

impl<S, L> AdminTaxonomyUseCase<S, L>
where
    S: StyleRepository + Send + Sync + 'static,
    L: LevelRepository + Send + Sync + 'static,
{
    pub fn new(style_repo: Arc<S>, level_repo: Arc<L>) -> Self {
        Self {
            style_repo,
            level_repo,
        }
    }

    pub async fn list_styles(&self) -> UseCaseResult<Vec<StyleDto>> {
        let styles = self.style_repo.list_styles().await.map_err(|err| {
            error!(db_error = ?err, "admin: failed to list styles");
            AdminError::Internal(err)
        })?;
        Ok(styles.into_iter().map(StyleDto::from).collect())
    }

    pub async fn create_style(&self, model: StyleModel) -> UseCaseResult<StyleDto> {
        let (name, slug) = style_fields(model)?;
        let style = self
            .style_repo
            .create_style(name, slug)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin: failed to create style");
                write_error(err)
            })?;

        info!(style_id = %style.id, slug = %style.slug, "admin: style created");
        Ok(StyleDto::from(style))
    }

    pub async fn update_style(&self, style_id: Uuid, model: StyleModel) -> UseCaseResult<StyleDto> {
        let (name, slug) = style_fields(model)?;
        let style = self
            .style_repo
            .update_style(style_id, EditStyleEntity { name, slug })
            .await
            .map_err(|err| {
                error!(%style_id, db_error = ?err, "admin: failed to update style");
                write_error(err)
            })?
            .ok_or(AdminError::NotFound("Style"))?;

        info!(%style_id, "admin: style updated");
        Ok(StyleDto::from(style))
    }

    pub async fn delete_style(&self, style_id: Uuid) -> UseCaseResult<()> {
        let deleted = self.style_repo.delete_style(style_id).await.map_err(|err| {
            error!(%style_id, db_error = ?err, "admin: failed to delete style");
            AdminError::Internal(err)
        })?;
        if !deleted {
            return Err(AdminError::NotFound("Style"));
        }
        info!(%style_id, "admin: style deleted");
        Ok(())
    }

    pub async fn list_levels(&self) -> UseCaseResult<Vec<LevelDto>> {
        let levels = self.level_repo.list_levels().await.map_err(|err| {
            error!(db_error = ?err, "admin: failed to list levels");
            AdminError::Internal(err)
        })?;
        Ok(levels.into_iter().map(LevelDto::from).collect())
    }

    pub async fn create_level(&self, model: LevelModel) -> UseCaseResult<LevelDto> {
        let name = level_name(model)?;
        let level = self.level_repo.create_level(name).await.map_err(|err| {
            error!(db_error = ?err, "admin: failed to create level");
            AdminError::Internal(err)
        })?;

        info!(level_id = %level.id, "admin: level created");
        Ok(LevelDto::from(level))
    }

    pub async fn update_level(&self, level_id: Uuid, model: LevelModel) -> UseCaseResult<LevelDto> {
        let name = level_name(model)?;
        let level = self
            .level_repo
            .rename_level(level_id, name)
            .await
            .map_err(|err| {
                error!(%level_id, db_error = ?err, "admin: failed to update level");
                AdminError::Internal(err)
            })?
            .ok_or(AdminError::NotFound("Level"))?;

        info!(%level_id, "admin: level updated");
        Ok(LevelDto::from(level))
    }

    pub async fn delete_level(&self, level_id: Uuid) -> UseCaseResult<()> {
        let deleted = self.level_repo.delete_level(level_id).await.map_err(|err| {
            error!(%level_id, db_error = ?err, "admin: failed to delete level");
            AdminError::Internal(err)
        })?;
        if !deleted {
            return Err(AdminError::NotFound("Level"));
        }
        info!(%level_id, "admin: level deleted");
        Ok(())
    }

    /// Upserts the default styles (by slug) and levels (by name); safe to run repeatedly.
    pub async fn seed_defaults(&self) -> UseCaseResult<TaxonomyDto> {
        let mut styles = Vec::with_capacity(DEFAULT_STYLES.len());
        for (position, (name, slug)) in DEFAULT_STYLES.iter().enumerate() {
            let style = self
                .style_repo
                .upsert_style(InsertStyleEntity {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    position: position as i32,
                })
                .await
                .map_err(|err| {
                    error!(slug, db_error = ?err, "admin: failed to seed style");
                    AdminError::Internal(err)
                })?;
            styles.push(StyleDto::from(style));
        }

        let mut levels = Vec::with_capacity(DEFAULT_LEVELS.len());
        for (position, name) in DEFAULT_LEVELS.iter().enumerate() {
            let level = self
                .level_repo
                .upsert_level(InsertLevelEntity {
                    name: name.to_string(),
                    position: position as i32,
                })
                .await
                .map_err(|err| {
                    error!(name, db_error = ?err, "admin: failed to seed level");
                    AdminError::Internal(err)
                })?;
            levels.push(LevelDto::from(level));
        }

        info!(
            style_count = styles.len(),
            level_count = levels.len(),
            "admin: default taxonomy seeded"
        );
        Ok(TaxonomyDto { styles, levels })
    }
}

fn style_fields(model: StyleModel) -> UseCaseResult<(String, String)> {
    let name = model
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AdminError::Validation("Name is required".to_string()))?;

    let slug = model
        .slug
        .map(|slug| slug.trim().to_string())
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&name));
    if !is_valid_slug(&slug) {
        return Err(AdminError::Validation(
            "Slug must contain only lowercase letters, numbers and hyphens".to_string(),
        ));
    }

    Ok((name, slug))
}

fn level_name(model: LevelModel) -> UseCaseResult<String> {
    model
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AdminError::Validation("Name is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::{levels::LevelEntity, styles::StyleEntity},
        repositories::{levels::MockLevelRepository, styles::MockStyleRepository},
    };
    use axum::http::StatusCode;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn style(name: &str, slug: &str, position: i32) -> StyleEntity {
        StyleEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            position,
            created_at: Utc::now(),
        }
    }

    fn level(name: &str, position: i32) -> LevelEntity {
        LevelEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            position,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_style_derives_slug_from_name() {
        let mut styles = MockStyleRepository::new();
        styles
            .expect_create_style()
            .with(eq("Cuban Salsa".to_string()), eq("cuban-salsa".to_string()))
            .times(1)
            .returning(|name, slug| Ok(style(&name, &slug, 3)));

        let uc = AdminTaxonomyUseCase::new(Arc::new(styles), Arc::new(MockLevelRepository::new()));
        let created = uc
            .create_style(StyleModel {
                name: Some(" Cuban Salsa ".to_string()),
                slug: None,
            })
            .await
            .unwrap();

        assert_eq!(created.slug, "cuban-salsa");
    }

    #[tokio::test]
    async fn existing_style_slug_is_rejected() {
        let mut styles = MockStyleRepository::new();
        styles
            .expect_create_style()
            .returning(|_, _| Err(crate::application::usecases::admin::unique_violation()));

        let uc = AdminTaxonomyUseCase::new(Arc::new(styles), Arc::new(MockLevelRepository::new()));
        let err = uc
            .create_style(StyleModel {
                name: Some("Salsa".to_string()),
                slug: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Slug already exists");
    }

    #[tokio::test]
    async fn style_requires_name_and_valid_slug() {
        let uc = AdminTaxonomyUseCase::new(
            Arc::new(MockStyleRepository::new()),
            Arc::new(MockLevelRepository::new()),
        );

        let err = uc
            .create_style(StyleModel {
                name: None,
                slug: Some("salsa".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        let err = uc
            .create_style(StyleModel {
                name: Some("Salsa".to_string()),
                slug: Some("Salsa Cubana".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn renaming_missing_level_is_not_found() {
        let mut levels = MockLevelRepository::new();
        levels.expect_rename_level().returning(|_, _| Ok(None));

        let uc = AdminTaxonomyUseCase::new(Arc::new(MockStyleRepository::new()), Arc::new(levels));
        let err = uc
            .update_level(
                Uuid::new_v4(),
                LevelModel {
                    name: Some("Expert".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Level not found");
    }

    #[tokio::test]
    async fn seed_upserts_defaults_in_order() {
        let mut styles = MockStyleRepository::new();
        styles
            .expect_upsert_style()
            .times(3)
            .returning(|insert| Ok(style(&insert.name, &insert.slug, insert.position)));
        let mut levels = MockLevelRepository::new();
        levels
            .expect_upsert_level()
            .withf(|insert| DEFAULT_LEVELS[insert.position as usize] == insert.name)
            .times(3)
            .returning(|insert| Ok(level(&insert.name, insert.position)));

        let uc = AdminTaxonomyUseCase::new(Arc::new(styles), Arc::new(levels));
        let seeded = uc.seed_defaults().await.unwrap();

        let slugs: Vec<&str> = seeded.styles.iter().map(|style| style.slug.as_str()).collect();
        assert_eq!(slugs, vec!["salsa", "bachata", "kizomba"]);
        let names: Vec<&str> = seeded.levels.iter().map(|level| level.name.as_str()).collect();
        assert_eq!(names, vec!["Beginner", "Intermediate", "Advanced"]);
    }
}
