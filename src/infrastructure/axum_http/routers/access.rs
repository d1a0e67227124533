use std::sync::Arc;

use axum::{Extension, Json, Router, extract::Query, response::IntoResponse, routing::get};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::infrastructure::axum_http::{
    auth::{AuthState, MaybeAuthUser},
    error_responses::AppError,
};

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub path: Option<String>,
}

pub fn routes() -> Router {
    Router::new().route("/", get(check_access))
}

/// Evaluates the navigation gate for a client-side route change.
pub async fn check_access(
    Extension(auth_state): Extension<Arc<AuthState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    WithRejection(Query(access_query), _): WithRejection<Query<AccessQuery>, AppError>,
) -> impl IntoResponse {
    let path = access_query.path.unwrap_or_else(|| "/".to_string());
    let check = auth_state
        .access_gate
        .check(&path, user.as_ref().map(|user| &user.session));
    Json(check)
}
