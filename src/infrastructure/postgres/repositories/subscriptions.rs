use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{
            EditSubscriptionStatusEntity, SubscriberEntity, SubscriptionEntity,
            UpsertSubscriptionEntity,
        },
        repositories::subscriptions::SubscriptionRepository,
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    },
    infrastructure::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{profiles, subscriptions},
    },
};

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn find_by_customer_id(&self, customer_id: &str) -> Result<Option<SubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = subscriptions::table
            .filter(subscriptions::stripe_customer_id.eq(customer_id))
            .order(subscriptions::updated_at.desc())
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn upsert_subscription(&self, upsert_entity: UpsertSubscriptionEntity) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        insert_into(subscriptions::table)
            .values(&upsert_entity)
            .on_conflict(subscriptions::user_id)
            .do_update()
            .set(&upsert_entity)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_status_by_user_id(
        &self,
        user_id: Uuid,
        edit_entity: EditSubscriptionStatusEntity,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(subscriptions::table)
            .filter(subscriptions::user_id.eq(user_id))
            .set(&edit_entity)
            .execute(&mut conn)?;

        Ok(())
    }

    async fn count_active(&self, now: DateTime<Utc>) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let statuses: Vec<String> = SubscriptionStatus::access_granting()
            .iter()
            .map(|status| status.to_string())
            .collect();

        let active = subscriptions::table
            .filter(subscriptions::status.eq_any(statuses))
            .filter(
                subscriptions::current_period_end
                    .is_null()
                    .or(subscriptions::current_period_end.gt(now)),
            )
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(active)
    }

    async fn list_subscribers(&self) -> Result<Vec<SubscriberEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = subscriptions::table
            .left_join(profiles::table)
            .order(subscriptions::created_at.desc())
            .select((
                SubscriptionEntity::as_select(),
                profiles::email.nullable(),
            ))
            .load::<(SubscriptionEntity, Option<String>)>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(|(subscription, email)| SubscriberEntity {
                subscription,
                email,
            })
            .collect())
    }
}
