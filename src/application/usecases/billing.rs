use std::sync::Arc;

use anyhow::{Context, anyhow};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{EditSubscriptionStatusEntity, UpsertSubscriptionEntity},
    repositories::{
        payment_gateway::PaymentGateway, profiles::ProfileRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        auth::SessionUser,
        subscriptions::{
            CheckoutSessionObject, PaymentEvent, PricingDto, ProviderSubscription,
            SubscriptionObject,
        },
    },
};

pub const USER_ID_METADATA_KEY: &str = "supabase_user_id";

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Invalid price ID")]
    InvalidPrice,
    #[error("No billing account found")]
    NoBillingAccount,
    #[error("An email address is required for checkout")]
    MissingEmail,
    #[error("Webhook Error: {0}")]
    InvalidSignature(String),
    #[error("Webhook handler failed")]
    WebhookFailed(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::InvalidPrice
            | BillingError::NoBillingAccount
            | BillingError::MissingEmail
            | BillingError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            BillingError::WebhookFailed(_) | BillingError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BillingError>;

#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub monthly_price_id: String,
    pub yearly_price_id: String,
}

pub struct BillingUseCase<S, P, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    profile_repo: Arc<P>,
    payment_gateway: Arc<G>,
    settings: BillingSettings,
}

impl<S, P, G> BillingUseCase<S, P, G>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        subscription_repo: Arc<S>,
        profile_repo: Arc<P>,
        payment_gateway: Arc<G>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            subscription_repo,
            profile_repo,
            payment_gateway,
            settings,
        }
    }

    pub fn pricing(&self) -> PricingDto {
        PricingDto {
            monthly_price_id: self.settings.monthly_price_id.clone(),
            yearly_price_id: self.settings.yearly_price_id.clone(),
        }
    }

    pub async fn create_checkout_session(
        &self,
        session: &SessionUser,
        price_id: Option<String>,
    ) -> UseCaseResult<String> {
        let user_id = session.user_id;
        let price_id = price_id
            .filter(|price_id| {
                *price_id == self.settings.monthly_price_id
                    || *price_id == self.settings.yearly_price_id
            })
            .ok_or_else(|| {
                warn!(%user_id, "billing: checkout requested with unknown price");
                BillingError::InvalidPrice
            })?;

        info!(%user_id, %price_id, "billing: creating checkout session");
        let customer_id = self.resolve_customer(session).await?;

        let url = self
            .payment_gateway
            .create_checkout_session(&customer_id, &price_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, stripe_error = ?err, "billing: failed to create checkout session");
                BillingError::Internal(err)
            })?;

        info!(%user_id, %customer_id, "billing: checkout session created");
        Ok(url)
    }

    pub async fn create_portal_session(&self, session: &SessionUser) -> UseCaseResult<String> {
        let user_id = session.user_id;
        let customer_id = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load subscription");
                BillingError::Internal(err)
            })?
            .and_then(|subscription| subscription.stripe_customer_id)
            .ok_or_else(|| {
                info!(%user_id, "billing: portal requested without a customer");
                BillingError::NoBillingAccount
            })?;

        let url = self
            .payment_gateway
            .create_portal_session(&customer_id)
            .await
            .map_err(|err| {
                error!(%user_id, stripe_error = ?err, "billing: failed to create portal session");
                BillingError::Internal(err)
            })?;

        info!(%user_id, "billing: portal session created");
        Ok(url)
    }

    /// Verifies the delivery, then reconciles it with one upsert or update.
    /// Replaying an event rewrites the same row.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> UseCaseResult<()> {
        let signature_header = signature_header.ok_or_else(|| {
            warn!("billing: webhook without stripe-signature header");
            BillingError::InvalidSignature("missing stripe-signature header".to_string())
        })?;

        let event = self
            .payment_gateway
            .verify_webhook(payload, signature_header)
            .map_err(|err| {
                warn!(error = %err, "billing: webhook signature verification failed");
                BillingError::InvalidSignature(err.to_string())
            })?;

        info!(event_id = ?event.id, event_type = %event.type_, "billing: webhook received");

        self.process_event(&event).await.map_err(|err| {
            error!(
                event_id = ?event.id,
                event_type = %event.type_,
                error = ?err,
                "billing: webhook processing failed"
            );
            BillingError::WebhookFailed(err)
        })
    }

    async fn process_event(&self, event: &PaymentEvent) -> anyhow::Result<()> {
        match event.type_.as_str() {
            "checkout.session.completed" => self.on_checkout_completed(event).await,
            "customer.subscription.updated" | "customer.subscription.deleted" => {
                self.on_subscription_changed(event).await
            }
            other => {
                info!(event_type = other, "billing: unhandled webhook event type");
                Ok(())
            }
        }
    }

    async fn on_checkout_completed(&self, event: &PaymentEvent) -> anyhow::Result<()> {
        let checkout: CheckoutSessionObject = serde_json::from_value(event.object.clone())
            .context("invalid checkout session object")?;

        let user_id = checkout
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get(USER_ID_METADATA_KEY))
            .and_then(|value| Uuid::parse_str(value).ok());
        let Some(user_id) = user_id else {
            error!(checkout_id = ?checkout.id, "billing: no user id in checkout session metadata");
            return Ok(());
        };

        let subscription_id = checkout
            .subscription
            .as_deref()
            .ok_or_else(|| anyhow!("checkout session has no subscription"))?;
        let subscription = self
            .payment_gateway
            .retrieve_subscription(subscription_id)
            .await?;

        let upsert_entity = UpsertSubscriptionEntity {
            user_id,
            stripe_customer_id: checkout.customer.or_else(|| subscription.customer.clone()),
            stripe_subscription_id: Some(subscription.id.clone()),
            status: subscription.status.clone(),
            price_id: subscription.price_id.clone(),
            current_period_end: period_end(&subscription),
            updated_at: Utc::now(),
        };
        self.subscription_repo
            .upsert_subscription(upsert_entity)
            .await?;

        info!(
            %user_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "billing: subscription upserted from checkout"
        );
        Ok(())
    }

    async fn on_subscription_changed(&self, event: &PaymentEvent) -> anyhow::Result<()> {
        let object: SubscriptionObject = serde_json::from_value(event.object.clone())
            .context("invalid subscription object")?;
        let subscription = ProviderSubscription::from(object);

        let Some(customer_id) = subscription.customer.as_deref() else {
            warn!(subscription_id = %subscription.id, "billing: subscription event without customer");
            return Ok(());
        };

        let Some(existing) = self
            .subscription_repo
            .find_by_customer_id(customer_id)
            .await?
        else {
            debug!(customer_id, "billing: no local subscription for customer");
            return Ok(());
        };

        let edit_entity = EditSubscriptionStatusEntity {
            status: subscription.status.clone(),
            price_id: subscription.price_id.clone(),
            current_period_end: period_end(&subscription),
            updated_at: Utc::now(),
        };
        self.subscription_repo
            .update_status_by_user_id(existing.user_id, edit_entity)
            .await?;

        info!(
            user_id = %existing.user_id,
            customer_id,
            status = %subscription.status,
            "billing: subscription status updated"
        );
        Ok(())
    }

    async fn resolve_customer(&self, session: &SessionUser) -> UseCaseResult<String> {
        let user_id = session.user_id;
        let existing = self
            .subscription_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "billing: failed to load subscription");
                BillingError::Internal(err)
            })?
            .and_then(|subscription| subscription.stripe_customer_id);

        if let Some(customer_id) = existing {
            debug!(%user_id, %customer_id, "billing: reusing stripe customer");
            return Ok(customer_id);
        }

        let email = match session.email.clone() {
            Some(email) => email,
            None => self
                .profile_repo
                .find_by_id(user_id)
                .await
                .map_err(|err| {
                    error!(%user_id, db_error = ?err, "billing: failed to load profile");
                    BillingError::Internal(err)
                })?
                .map(|profile| profile.email)
                .filter(|email| !email.is_empty())
                .ok_or(BillingError::MissingEmail)?,
        };

        let customer_id = self
            .payment_gateway
            .create_customer(&email, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, stripe_error = ?err, "billing: failed to create customer");
                BillingError::Internal(err)
            })?;
        info!(%user_id, %customer_id, "billing: stripe customer created");
        Ok(customer_id)
    }
}

fn period_end(subscription: &ProviderSubscription) -> Option<DateTime<Utc>> {
    subscription
        .current_period_end
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
}
