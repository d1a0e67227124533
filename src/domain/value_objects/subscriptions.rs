use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::subscriptions::{SubscriberEntity, SubscriptionEntity};

use super::enums::subscription_statuses::SubscriptionStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(rename = "priceId")]
    pub price_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingDto {
    pub monthly_price_id: String,
    pub yearly_price_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionDto {
    pub status: SubscriptionStatus,
    pub price_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub has_billing_account: bool,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(value: SubscriptionEntity) -> Self {
        Self {
            status: SubscriptionStatus::from_str(&value.status),
            price_id: value.price_id,
            current_period_end: value.current_period_end,
            has_billing_account: value.stripe_customer_id.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriberDto {
    pub user_id: Uuid,
    pub user_email: String,
    pub stripe_customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub is_active: bool,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriberEntity> for SubscriberDto {
    fn from(value: SubscriberEntity) -> Self {
        let status = SubscriptionStatus::from_str(&value.subscription.status);
        Self {
            user_id: value.subscription.user_id,
            user_email: value.email.unwrap_or_else(|| "Unknown".to_string()),
            stripe_customer_id: value.subscription.stripe_customer_id,
            status,
            is_active: status.grants_access(),
            current_period_end: value.subscription.current_period_end,
            created_at: value.subscription.created_at,
        }
    }
}

/// The paywall rule: an access-granting status whose period (when known) has not ended.
pub fn is_subscription_active(subscription: &SubscriptionEntity, now: DateTime<Utc>) -> bool {
    if !SubscriptionStatus::from_str(&subscription.status).grants_access() {
        return false;
    }
    match subscription.current_period_end {
        Some(period_end) => period_end > now,
        None => true,
    }
}

/// Provider-side subscription fields the reconciliation cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer: Option<String>,
    pub status: String,
    pub price_id: Option<String>,
    pub current_period_end: Option<i64>,
}

/// Stripe subscription object as returned by the API and carried in webhook events.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: Option<String>,
    pub status: String,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    pub current_period_end: Option<i64>,
    pub price: Option<PriceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRef {
    pub id: String,
}

impl From<SubscriptionObject> for ProviderSubscription {
    fn from(value: SubscriptionObject) -> Self {
        let first_item = value.items.data.into_iter().next();
        // Newer API versions only report the period on the item.
        let current_period_end = value.current_period_end.or_else(|| {
            first_item
                .as_ref()
                .and_then(|item| item.current_period_end)
        });
        Self {
            id: value.id,
            customer: value.customer,
            status: value.status,
            price_id: first_item.and_then(|item| item.price).map(|price| price.id),
            current_period_end,
        }
    }
}

/// A verified webhook delivery; `object` is left raw until the event type is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub id: Option<String>,
    pub type_: String,
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(status: &str, period_end: Option<DateTime<Utc>>) -> SubscriptionEntity {
        SubscriptionEntity {
            user_id: Uuid::new_v4(),
            stripe_customer_id: Some("cus_1".to_string()),
            stripe_subscription_id: Some("sub_1".to_string()),
            status: status.to_string(),
            price_id: Some("price_monthly".to_string()),
            current_period_end: period_end,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn active_subscription_in_period_is_active() {
        let now = Utc::now();
        assert!(is_subscription_active(
            &subscription("active", Some(now + Duration::days(3))),
            now
        ));
        assert!(is_subscription_active(&subscription("trialing", None), now));
    }

    #[test]
    fn lapsed_or_failing_subscription_is_not_active() {
        let now = Utc::now();
        assert!(!is_subscription_active(
            &subscription("active", Some(now - Duration::seconds(1))),
            now
        ));
        assert!(!is_subscription_active(
            &subscription("past_due", Some(now + Duration::days(3))),
            now
        ));
        assert!(!is_subscription_active(&subscription("canceled", None), now));
    }

    #[test]
    fn provider_subscription_reads_price_and_period_from_first_item() {
        let object: SubscriptionObject = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "items": { "data": [
                { "current_period_end": 1_767_225_600, "price": { "id": "price_monthly" } }
            ] }
        }))
        .unwrap();

        let subscription = ProviderSubscription::from(object);
        assert_eq!(subscription.price_id.as_deref(), Some("price_monthly"));
        assert_eq!(subscription.current_period_end, Some(1_767_225_600));
        assert_eq!(subscription.customer.as_deref(), Some("cus_1"));
    }

    #[test]
    fn subscriber_without_profile_email_is_unknown() {
        let dto = SubscriberDto::from(SubscriberEntity {
            subscription: subscription("active", None),
            email: None,
        });
        assert_eq!(dto.user_email, "Unknown");
        assert!(dto.is_active);
    }
}
