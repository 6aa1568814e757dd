use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::engine::{AdmissionPolicy, AdmissionSettings};
use crate::model::member::{DEFAULT_ANNUAL_ENTITLEMENT, DEFAULT_SICK_ENTITLEMENT};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// Without a database url the service runs on the in-memory store
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub default_annual_entitlement: u32,
    pub default_sick_entitlement: u32,
    pub allow_overlap: bool,
    pub allow_negative_balance: bool,
    pub admission_lock_timeout_ms: u64,

    /// Registered as an active scrum master at startup when missing
    pub bootstrap_scrum_master: Option<String>,
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: optional("DATABASE_URL"),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min
            refresh_token_ttl: parse_or("REFRESH_TOKEN_TTL", 604_800)?, // default 7 days

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            default_annual_entitlement: parse_or(
                "DEFAULT_ANNUAL_ENTITLEMENT",
                DEFAULT_ANNUAL_ENTITLEMENT,
            )?,
            default_sick_entitlement: parse_or("DEFAULT_SICK_ENTITLEMENT", DEFAULT_SICK_ENTITLEMENT)?,
            allow_overlap: parse_or("ALLOW_OVERLAP", false)?,
            allow_negative_balance: parse_or("ALLOW_NEGATIVE_BALANCE", false)?,
            admission_lock_timeout_ms: parse_or("ADMISSION_LOCK_TIMEOUT_MS", 5000)?,

            bootstrap_scrum_master: optional("BOOTSTRAP_SCRUM_MASTER_EMAIL"),
        })
    }

    pub fn admission_settings(&self) -> AdmissionSettings {
        AdmissionSettings {
            policy: AdmissionPolicy {
                allow_overlap: self.allow_overlap,
                allow_negative_balance: self.allow_negative_balance,
            },
            lock_timeout: Duration::from_millis(self.admission_lock_timeout_ms),
            default_annual_entitlement: self.default_annual_entitlement,
            default_sick_entitlement: self.default_sick_entitlement,
        }
    }

    /// Settings for tests and local runs; never read from the environment.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 1000,
            rate_protected_per_min: 1000,
            api_prefix: "/api/v1".to_string(),
            default_annual_entitlement: DEFAULT_ANNUAL_ENTITLEMENT,
            default_sick_entitlement: DEFAULT_SICK_ENTITLEMENT,
            allow_overlap: false,
            allow_negative_balance: false,
            admission_lock_timeout_ms: 5000,
            bootstrap_scrum_master: None,
        }
    }
}
