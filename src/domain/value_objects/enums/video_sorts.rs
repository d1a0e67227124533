use serde::Deserialize;

#[derive(Default, Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VideoSort {
    #[default]
    Newest,
    Popular,
    Duration,
}

impl VideoSort {
    /// Unknown values fall back to newest, like an unset sort.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("popular") => VideoSort::Popular,
            Some("duration") => VideoSort::Duration,
            _ => VideoSort::Newest,
        }
    }
}
