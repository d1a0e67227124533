use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{levels::LevelEntity, styles::StyleEntity};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StyleDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<StyleEntity> for StyleDto {
    fn from(value: StyleEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            slug: value.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LevelDto {
    pub id: Uuid,
    pub name: String,
}

impl From<LevelEntity> for LevelDto {
    fn from(value: LevelEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaxonomyDto {
    pub styles: Vec<StyleDto>,
    pub levels: Vec<LevelDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleModel {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelModel {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StyleResponse {
    pub style: StyleDto,
}

#[derive(Debug, Serialize)]
pub struct LevelResponse {
    pub level: LevelDto,
}

/// Lower-cases and hyphenates a display name: "Cuban Salsa!" becomes "cuban-salsa".
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}
