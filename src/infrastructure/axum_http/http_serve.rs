use crate::{
    application::usecases::{access::AccessGate, billing::BillingSettings},
    config::config_model::DotEnvyConfig,
    infrastructure::{
        axum_http::{
            auth::AuthState, default_routers, error_responses::json_layer_errors, routers,
        },
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{profiles::ProfilePostgres, subscriptions::SubscriptionPostgres},
        },
        stripe::stripe_client::StripeClient,
        supabase::{
            auth_client::SupabaseAuthClient,
            storage_client::{SupabaseStorageClient, SupabaseStorageConfig},
        },
    },
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::get,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let auth_client = Arc::new(SupabaseAuthClient::new(
        &config.supabase.project_url,
        config.supabase.anon_key.clone(),
    ));
    let storage_client = Arc::new(
        SupabaseStorageClient::new(SupabaseStorageConfig {
            project_url: config.supabase.project_url.clone(),
            s3_endpoint: config.storage.s3_endpoint.clone(),
            region: config.storage.region.clone(),
            access_key: config.storage.access_key.clone(),
            secret_key: config.storage.secret_key.clone(),
        })
        .await?,
    );
    let stripe_client = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.site.url.clone(),
    ));
    info!("External clients have been configured");

    let access_gate = AccessGate::new(
        Arc::new(ProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool))),
    );
    let auth_state = Arc::new(AuthState::new(
        config.supabase.jwt_secret.clone(),
        access_gate,
        config.stage.secure_cookies(),
    ));

    let billing_settings = BillingSettings {
        monthly_price_id: config.stripe.price_monthly.clone(),
        yearly_price_id: config.stripe.price_yearly.clone(),
    };

    let admin_routes = Router::new()
        .merge(routers::admin_videos::routes(Arc::clone(&db_pool)))
        .merge(routers::admin_taxonomy::routes(Arc::clone(&db_pool)))
        .merge(routers::admin_dashboard::routes(
            Arc::clone(&db_pool),
            config.site.mrr_monthly_price_minor,
        ));

    let api_routes = Router::new()
        .merge(routers::videos::routes(
            Arc::clone(&db_pool),
            Arc::clone(&storage_client),
            config.storage.signed_url_ttl_seconds,
        ))
        .merge(routers::billing::routes(
            Arc::clone(&db_pool),
            stripe_client,
            billing_settings,
        ));

    let site_origin = HeaderValue::from_str(&config.site.url)
        .with_context(|| format!("SITE_URL is not a valid origin: {}", config.site.url))?;

    let json_routes = Router::new()
        .merge(routers::auth::routes(
            Arc::clone(&db_pool),
            auth_client,
            config.site.url.clone(),
        ))
        .nest("/api/v1/access", routers::access::routes())
        .nest("/api/account", routers::account::routes(Arc::clone(&db_pool)))
        .nest("/api/admin", admin_routes)
        .nest("/api", api_routes)
        .route("/api/v1/health-check", get(default_routers::health_check));

    let app = with_body_limits(
        json_routes,
        routers::admin_upload::routes(Arc::clone(&storage_client)),
        config.server.body_limit_bytes()?,
    )
    .fallback(default_routers::not_found)
    .layer(Extension(auth_state))
    .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
    .layer(middleware::map_response(json_layer_errors))
    .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::exact(site_origin)),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!(stage = %config.stage, "Server is running on port {}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// The server-wide limit covers JSON routes; uploads keep their own multipart limit.
fn with_body_limits(json_routes: Router, upload_routes: Router, body_limit: usize) -> Router {
    json_routes
        .layer(RequestBodyLimitLayer::new(body_limit))
        .nest("/api/admin", upload_routes)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
