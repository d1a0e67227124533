use anyhow::{Context, Result};

use super::{
    config_model::{Database, DotEnvyConfig, Server, Site, Storage, Stripe, Supabase},
    stage::Stage,
};

const DEFAULT_SITE_URL: &str = "http://localhost:3000";
const DEFAULT_SIGNED_URL_TTL_SECONDS: u64 = 3600;
const DEFAULT_MRR_MONTHLY_PRICE_MINOR: i64 = 1999;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: required("SERVER_PORT")?.parse().context("SERVER_PORT is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };
    server.body_limit_bytes()?;

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let project_url = required("SUPABASE_PROJECT_URL")?
        .trim_end_matches('/')
        .to_string();

    let storage = Storage {
        s3_endpoint: optional("SUPABASE_S3_ENDPOINT")
            .unwrap_or_else(|| format!("{}/storage/v1/s3", project_url)),
        region: required("SUPABASE_S3_REGION")?,
        access_key: required("SUPABASE_S3_ACCESS_KEY_ID")?,
        secret_key: required("SUPABASE_S3_SECRET_ACCESS_KEY")?,
        signed_url_ttl_seconds: match optional("SIGNED_URL_TTL_SECONDS") {
            Some(raw) => raw.parse().context("SIGNED_URL_TTL_SECONDS is invalid")?,
            None => DEFAULT_SIGNED_URL_TTL_SECONDS,
        },
    };

    let supabase = Supabase {
        project_url,
        anon_key: required("SUPABASE_ANON_KEY")?,
        jwt_secret: required("SUPABASE_JWT_SECRET")?,
    };

    let stripe = Stripe {
        secret_key: required("STRIPE_SECRET_KEY")?,
        webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
        price_monthly: required("STRIPE_PRICE_MONTHLY")?,
        price_yearly: required("STRIPE_PRICE_YEARLY")?,
    };

    let site = Site {
        url: optional("SITE_URL")
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
            .trim_end_matches('/')
            .to_string(),
        mrr_monthly_price_minor: match optional("MRR_MONTHLY_PRICE_MINOR") {
            Some(raw) => raw.parse().context("MRR_MONTHLY_PRICE_MINOR is invalid")?,
            None => DEFAULT_MRR_MONTHLY_PRICE_MINOR,
        },
    };

    Ok(DotEnvyConfig {
        stage: get_stage(),
        server,
        database,
        supabase,
        storage,
        stripe,
        site,
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
