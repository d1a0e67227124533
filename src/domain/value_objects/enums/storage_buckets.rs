use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const ALLOWED_VIDEO_TYPES: [&str; 3] = ["video/mp4", "video/webm", "video/quicktime"];
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBucket {
    Videos,
    Thumbnails,
    Previews,
}

impl Display for StorageBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StorageBucket {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "videos" => Some(StorageBucket::Videos),
            "thumbnails" => Some(StorageBucket::Thumbnails),
            "previews" => Some(StorageBucket::Previews),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBucket::Videos => "videos",
            StorageBucket::Thumbnails => "thumbnails",
            StorageBucket::Previews => "previews",
        }
    }

    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        match self {
            StorageBucket::Videos | StorageBucket::Previews => &ALLOWED_VIDEO_TYPES,
            StorageBucket::Thumbnails => &ALLOWED_IMAGE_TYPES,
        }
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        self.allowed_content_types().contains(&content_type)
    }
}
