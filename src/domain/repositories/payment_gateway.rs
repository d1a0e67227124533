use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::subscriptions::{PaymentEvent, ProviderSubscription};

#[automock]
#[async_trait]
pub trait PaymentGateway {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String>;

    /// Subscription-mode hosted checkout; returns the redirect URL.
    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        user_id: Uuid,
    ) -> Result<String>;

    /// Hosted billing portal; returns the redirect URL.
    async fn create_portal_session(&self, customer_id: &str) -> Result<String>;

    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<ProviderSubscription>;

    fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent>;
}
