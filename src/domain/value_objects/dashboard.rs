use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardDto {
    pub active_subscribers: i64,
    /// Estimate: active subscribers times the configured monthly price.
    pub estimated_mrr_minor: i64,
    pub total_videos: i64,
    pub published_videos: i64,
    pub total_views: i64,
}
