use axum::{
    Json,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::application::usecases::{
    access::AccessError,
    account::AccountError,
    admin::AdminError,
    auth::AuthError,
    billing::BillingError,
    catalog::CatalogError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        message: String,
        redirect_to: Option<String>,
    },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Rejected {
            status,
            message: message.into(),
            redirect_to: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Rejected { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, redirect_to) = match self {
            AppError::Rejected {
                message,
                redirect_to,
                ..
            } => (message, redirect_to),
            // Don't leak internal error detail to client
            AppError::Internal(_) => ("Internal server error".to_string(), None),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
            redirect_to,
        });

        (status, body).into_response()
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        let redirect_to = err.redirect_to();
        match err {
            AccessError::Internal(err) => AppError::Internal(err),
            err => AppError::Rejected {
                status: err.status_code(),
                message: err.to_string(),
                redirect_to,
            },
        }
    }
}

/// Timeouts, body limits and unmatched methods come from layers with plain bodies.
pub async fn json_layer_errors(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|value| value.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    let status = response.status();
    match status {
        StatusCode::REQUEST_TIMEOUT => AppError::new(status, "Request timed out").into_response(),
        StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::new(status, "Request body is too large").into_response()
        }
        StatusCode::METHOD_NOT_ALLOWED => {
            AppError::new(status, "Method not allowed").into_response()
        }
        _ => response,
    }
}

/// Use-case errors carry their own status; only `Internal` hides its message.
macro_rules! impl_from_usecase_error {
    ($($error:ident),+ $(,)?) => {
        $(
            impl From<$error> for AppError {
                fn from(err: $error) -> Self {
                    match err {
                        $error::Internal(err) => AppError::Internal(err),
                        err => AppError::new(err.status_code(), err.to_string()),
                    }
                }
            }
        )+
    };
}

impl_from_usecase_error!(AuthError, CatalogError, BillingError, AccountError, AdminError);

macro_rules! impl_from_rejection {
    ($($rejection:ident),+ $(,)?) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::new(rejection.status(), rejection.body_text())
                }
            }
        )+
    };
}

impl_from_rejection!(JsonRejection, QueryRejection, PathRejection, MultipartRejection);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) =
            body_of(AppError::from(CatalogError::Internal(anyhow::anyhow!("pool timed out")))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("redirect_to").is_none());
    }

    #[tokio::test]
    async fn unauthenticated_access_carries_sign_in_redirect() {
        let (status, body) = body_of(AppError::from(AccessError::Unauthenticated {
            next: "/videos/salsa-basics".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
        assert_eq!(body["redirect_to"], "/signin?next=%2Fvideos%2Fsalsa-basics");
    }

    #[tokio::test]
    async fn extractor_rejections_render_as_json() {
        let rejection = axum::extract::Query::<std::collections::HashMap<String, u32>>::try_from_uri(
            &"/api/videos?limit=many".parse().unwrap(),
        )
        .unwrap_err();

        let (status, body) = body_of(AppError::from(rejection)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to deserialize query string")
        );
    }

    #[tokio::test]
    async fn webhook_failures_keep_their_message() {
        let (status, body) = body_of(AppError::from(BillingError::WebhookFailed(anyhow::anyhow!(
            "db down"
        ))))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Webhook handler failed");

        let (status, body) = body_of(AppError::from(BillingError::InvalidPrice)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid price ID");
    }
}
