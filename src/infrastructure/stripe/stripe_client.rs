use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::usecases::billing::USER_ID_METADATA_KEY,
    domain::{
        repositories::payment_gateway::PaymentGateway,
        value_objects::subscriptions::{PaymentEvent, ProviderSubscription, SubscriptionObject},
    },
};

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Signatures older (or newer) than this many seconds are rejected.
pub const WEBHOOK_TOLERANCE_SECONDS: i64 = 300;

/// Stripe client built on reqwest form requests.
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
    site_url: String,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: Option<String>,
    #[serde(rename = "type")]
    type_: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlResp {
    url: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String, site_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: STRIPE_API_BASE.to_string(),
            secret_key,
            webhook_secret,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    fn success_url(&self) -> String {
        format!("{}/account?success=true", self.site_url)
    }

    fn cancel_url(&self) -> String {
        format!("{}/pricing?canceled=true", self.site_url)
    }

    fn return_url(&self) -> String {
        format!("{}/account", self.site_url)
    }

    async fn post_form(
        &self,
        path: &str,
        body: &[(String, String)],
        context: &str,
    ) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(body)
            .send()
            .await?;
        Self::ensure_success(resp, context).await
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.as_deref()),
            stripe_error_param = ?details.as_ref().and_then(|d| d.param.as_deref()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.as_deref()),
            response_body = %body,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    fn verify_signature_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<PaymentEvent> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest);
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signatures.push(rest);
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow::anyhow!("missing timestamp in stripe-signature"))?;
        if signatures.is_empty() {
            anyhow::bail!("missing v1 in stripe-signature");
        }

        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timestamp in stripe-signature"))?;
        if (now - signed_at).abs() > WEBHOOK_TOLERANCE_SECONDS {
            anyhow::bail!("timestamp outside the tolerance zone");
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);

        let matched = signatures.iter().any(|signature| {
            hex::decode(signature)
                .map(|provided| mac.clone().verify_slice(&provided).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            anyhow::bail!("No signatures found matching the expected signature for payload");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(PaymentEvent {
            id: event.id,
            type_: event.type_,
            object: event.data.object,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<String> {
        // https://stripe.com/docs/api/customers/create
        let body = vec![
            ("email".to_string(), email.to_string()),
            (
                format!("metadata[{}]", USER_ID_METADATA_KEY),
                user_id.to_string(),
            ),
        ];
        let resp = self.post_form("/v1/customers", &body, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        info!(%user_id, customer_id = %parsed.id, "stripe customer created");
        Ok(parsed.id)
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        user_id: Uuid,
    ) -> Result<String> {
        // https://stripe.com/docs/payments/checkout
        let body = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("customer".to_string(), customer_id.to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), self.success_url()),
            ("cancel_url".to_string(), self.cancel_url()),
            (
                format!("metadata[{}]", USER_ID_METADATA_KEY),
                user_id.to_string(),
            ),
            (
                format!("subscription_data[metadata][{}]", USER_ID_METADATA_KEY),
                user_id.to_string(),
            ),
        ];
        let resp = self
            .post_form("/v1/checkout/sessions", &body, "create checkout session")
            .await?;

        let parsed: UrlResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }

    async fn create_portal_session(&self, customer_id: &str) -> Result<String> {
        // https://stripe.com/docs/api/customer_portal/sessions/create
        let body = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), self.return_url()),
        ];
        let resp = self
            .post_form("/v1/billing_portal/sessions", &body, "create portal session")
            .await?;

        let parsed: UrlResp = resp.json().await?;
        parsed
            .url
            .ok_or_else(|| anyhow::anyhow!("Stripe billing portal URL is missing"))
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> Result<ProviderSubscription> {
        // https://stripe.com/docs/api/subscriptions/retrieve
        let resp = self
            .http
            .get(format!(
                "{}/v1/subscriptions/{}",
                self.api_base, subscription_id
            ))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "retrieve subscription").await?;

        let subscription: SubscriptionObject = resp.json().await?;
        Ok(ProviderSubscription::from(subscription))
    }

    /// https://stripe.com/docs/webhooks/signatures
    fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent> {
        self.verify_signature_at(payload, signature_header, Utc::now().timestamp())
    }
}
