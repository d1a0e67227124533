use std::sync::Arc;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use axum_extra::extract::WithRejection;

use crate::{
    application::usecases::account::AccountUseCase,
    domain::{
        repositories::{profiles::ProfileRepository, subscriptions::SubscriptionRepository},
        value_objects::account::{ProfileResponse, UpdateAccountModel},
    },
    infrastructure::{
        axum_http::{auth::AuthUser, error_responses::AppError},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{profiles::ProfilePostgres, subscriptions::SubscriptionPostgres},
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let account_usecase = AccountUseCase::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
    );

    router(Arc::new(account_usecase))
}

pub fn router<P, S>(account_usecase: Arc<AccountUseCase<P, S>>) -> Router
where
    P: ProfileRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(get_account).patch(update_account))
        .with_state(account_usecase)
}

pub async fn get_account<P, S>(
    State(account_usecase): State<Arc<AccountUseCase<P, S>>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError>
where
    P: ProfileRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    Ok(Json(account_usecase.get_account(&user.session).await?))
}

pub async fn update_account<P, S>(
    State(account_usecase): State<Arc<AccountUseCase<P, S>>>,
    user: AuthUser,
    WithRejection(Json(update_account_model), _): WithRejection<Json<UpdateAccountModel>, AppError>,
) -> Result<impl IntoResponse, AppError>
where
    P: ProfileRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
{
    let profile = account_usecase
        .update_account(&user.session, update_account_model)
        .await?;
    Ok(Json(ProfileResponse { profile }))
}
