use anyhow::{Context, Result, ensure};

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub server: Server,
    pub database: Database,
    pub supabase: Supabase,
    pub storage: Storage,
    pub stripe: Stripe,
    pub site: Site,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

impl Server {
    /// `body_limit` is configured in MiB; JSON routes are capped at this many bytes.
    pub fn body_limit_bytes(&self) -> Result<usize> {
        ensure!(self.body_limit > 0, "SERVER_BODY_LIMIT must be at least 1 MiB");

        self.body_limit
            .checked_mul(1024 * 1024)
            .and_then(|bytes| usize::try_from(bytes).ok())
            .with_context(|| format!("SERVER_BODY_LIMIT is too large: {} MiB", self.body_limit))
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Supabase {
    pub project_url: String,
    pub anon_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Storage {
    pub s3_endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub signed_url_ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub price_monthly: String,
    pub price_yearly: String,
}

#[derive(Debug, Clone)]
pub struct Site {
    pub url: String,
    /// Monthly list price used for the dashboard MRR estimate.
    pub mrr_monthly_price_minor: i64,
}
