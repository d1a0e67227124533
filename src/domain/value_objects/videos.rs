use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    enums::video_sorts::VideoSort,
    taxonomy::{LevelDto, StyleDto},
};

pub const DEFAULT_VIDEO_LIMIT: i64 = 50;
pub const MAX_VIDEO_LIMIT: i64 = 100;
pub const RELATED_VIDEO_LIMIT: i64 = 6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoFilter {
    pub style_id: Option<Uuid>,
    pub level_id: Option<Uuid>,
    pub search: Option<String>,
    pub sort: VideoSort,
    pub limit: i64,
}

/// Query string of the library and search endpoints. A blank `style` or `level` means no filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListQuery {
    pub q: Option<String>,
    pub style: Option<String>,
    pub level: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
}

impl VideoListQuery {
    pub fn into_filter(self) -> Result<VideoFilter, String> {
        Ok(VideoFilter {
            style_id: taxonomy_id(self.style.as_deref(), "style")?,
            level_id: taxonomy_id(self.level.as_deref(), "level")?,
            search: self
                .q
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            sort: VideoSort::from_query(self.sort.as_deref()),
            limit: self
                .limit
                .unwrap_or(DEFAULT_VIDEO_LIMIT)
                .clamp(1, MAX_VIDEO_LIMIT),
        })
    }
}

fn taxonomy_id(raw: Option<&str>, kind: &str) -> Result<Option<Uuid>, String> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| format!("Invalid {} id", kind)),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoCardDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<i32>,
    pub duration: Option<String>,
    pub styles: Vec<StyleDto>,
    pub levels: Vec<LevelDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaybackDto {
    pub video_url: Option<String>,
    pub preview_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub has_subscription: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoDetailDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub teacher: Option<String>,
    pub duration_seconds: Option<i32>,
    pub duration: Option<String>,
    pub styles: Vec<StyleDto>,
    pub levels: Vec<LevelDto>,
    pub playback: PlaybackDto,
    pub related: Vec<VideoCardDto>,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoCardDto>,
}

/// Admin form body. Empty strings for media paths are stored as null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminVideoModel {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i32>,
    pub teacher: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub video_path: Option<String>,
    pub preview_path: Option<String>,
    pub thumbnail_path: Option<String>,
    #[serde(rename = "selectedStyles", default)]
    pub selected_styles: Vec<Uuid>,
    #[serde(rename = "selectedLevels", default)]
    pub selected_levels: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminVideoDto {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<i32>,
    pub teacher: Option<String>,
    pub published: bool,
    pub video_path: Option<String>,
    pub preview_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub styles: Vec<StyleDto>,
    pub levels: Vec<LevelDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AdminVideoResponse {
    pub video: AdminVideoDto,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// `h:mm:ss` past the hour, `m:ss` otherwise.
pub fn format_duration(seconds: i32) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
