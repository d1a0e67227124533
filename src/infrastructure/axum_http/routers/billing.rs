use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use serde_json::json;

use crate::{
    application::usecases::billing::{BillingSettings, BillingUseCase},
    domain::{
        repositories::{
            payment_gateway::PaymentGateway, profiles::ProfileRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::subscriptions::{CreateCheckoutRequest, UrlResponse},
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::AppError},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{profiles::ProfilePostgres, subscriptions::SubscriptionPostgres},
        },
        stripe::stripe_client::StripeClient,
    },
};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    stripe_client: Arc<StripeClient>,
    settings: BillingSettings,
) -> Router {
    let billing_usecase = BillingUseCase::new(
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        stripe_client,
        settings,
    );

    router(Arc::new(billing_usecase))
}

pub fn router<S, P, G>(billing_usecase: Arc<BillingUseCase<S, P, G>>) -> Router
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    Router::new()
        .route("/pricing", get(pricing))
        .route("/stripe/create-checkout-session", post(create_checkout_session))
        .route("/stripe/portal", post(create_portal_session))
        .route("/stripe/webhook", post(webhook))
        .with_state(billing_usecase)
}

pub async fn pricing<S, P, G>(
    State(billing_usecase): State<Arc<BillingUseCase<S, P, G>>>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    Json(billing_usecase.pricing())
}

pub async fn create_checkout_session<S, P, G>(
    State(billing_usecase): State<Arc<BillingUseCase<S, P, G>>>,
    user: AuthUser,
    WithRejection(Json(create_checkout_request), _): WithRejection<
        Json<CreateCheckoutRequest>,
        AppError,
    >,
) -> Result<impl IntoResponse, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let url = billing_usecase
        .create_checkout_session(&user.session, create_checkout_request.price_id)
        .await?;
    Ok(Json(UrlResponse { url }))
}

pub async fn create_portal_session<S, P, G>(
    State(billing_usecase): State<Arc<BillingUseCase<S, P, G>>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let url = billing_usecase.create_portal_session(&user.session).await?;
    Ok(Json(UrlResponse { url }))
}

/// Raw body: the signature covers the exact bytes Stripe sent.
pub async fn webhook<S, P, G>(
    State(billing_usecase): State<Arc<BillingUseCase<S, P, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok());
    billing_usecase.handle_webhook(&body, signature).await?;
    Ok(Json(json!({ "received": true })))
}
