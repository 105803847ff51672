//! Environment configuration
//!
//! Every setting comes from an environment variable; blank values count as
//! unset. The binary loads `.env` first.

use crate::dispatch::EmailSettings;
use crate::links::Links;
use crate::render::Branding;
use crate::token::DEFAULT_TOKEN_TTL_DAYS;
use chrono::Duration;
use std::path::PathBuf;

/// Quote engine configuration
///
/// | Variable | Default |
/// |----------|---------|
/// | DATABASE_URL | (required for database commands) |
/// | DATABASE_MAX_CONNECTIONS | 5 |
/// | PUBLIC_BASE_URL | http://localhost:3000 |
/// | QUOTE_FROM_EMAIL | quotes@example.com |
/// | QUOTE_FROM_NAME | Sales |
/// | RESEND_API_KEY / SENDGRID_API_KEY | (unset) |
/// | QUOTE_BCC | (empty, comma separated) |
/// | QUOTE_TOKEN_TTL_DAYS | 14 |
/// | BRAND_NAME | Storefront |
/// | BRAND_LOGO_PATH | (unset) |
/// | BRAND_CONTACT_LINES | (empty, `|` separated) |
/// | CURRENCY_SYMBOL | £ |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub public_base_url: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub resend_api_key: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub default_bcc: Vec<String>,
    pub token_ttl_days: i64,
    pub brand_name: String,
    pub brand_logo_path: Option<PathBuf>,
    pub brand_contact_lines: Vec<String>,
    pub currency_symbol: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable source
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parsed = |key: &str, default: i64| {
            var(key)
                .and_then(|v| match v.parse::<i64>() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        tracing::warn!(key, value = %v, "Ignoring unparseable setting");
                        None
                    }
                })
                .unwrap_or(default)
        };

        Self {
            database_url: var("DATABASE_URL"),
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5).clamp(1, 100) as u32,
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            from_email: var("QUOTE_FROM_EMAIL").unwrap_or_else(|| "quotes@example.com".into()),
            from_name: Some(var("QUOTE_FROM_NAME").unwrap_or_else(|| "Sales".into())),
            resend_api_key: var("RESEND_API_KEY"),
            sendgrid_api_key: var("SENDGRID_API_KEY"),
            default_bcc: split_list(var("QUOTE_BCC"), ','),
            token_ttl_days: parsed("QUOTE_TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS).max(1),
            brand_name: var("BRAND_NAME").unwrap_or_else(|| "Storefront".into()),
            brand_logo_path: var("BRAND_LOGO_PATH").map(PathBuf::from),
            brand_contact_lines: split_list(var("BRAND_CONTACT_LINES"), '|'),
            currency_symbol: var("CURRENCY_SYMBOL").unwrap_or_else(|| "£".into()),
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::days(self.token_ttl_days)
    }

    pub fn links(&self) -> Links {
        Links::new(self.public_base_url.as_str())
    }

    pub fn email_settings(&self) -> EmailSettings {
        EmailSettings {
            from_email: self.from_email.clone(),
            from_name: self.from_name.clone(),
            resend_api_key: self.resend_api_key.clone(),
            sendgrid_api_key: self.sendgrid_api_key.clone(),
            resend_base_url: None,
            sendgrid_base_url: None,
            brand_name: self.brand_name.clone(),
            currency_symbol: self.currency_symbol.clone(),
        }
    }

    /// Branding for documents; loads the logo file when one is configured
    pub fn branding(&self) -> Branding {
        let branding = Branding {
            name: self.brand_name.clone(),
            logo: None,
            contact_lines: self.brand_contact_lines.clone(),
            currency_symbol: self.currency_symbol.clone(),
        };
        match &self.brand_logo_path {
            Some(path) => branding.with_logo_file(path),
            None => branding,
        }
    }
}

fn split_list(value: Option<String>, separator: char) -> Vec<String> {
    value
        .map(|v| {
            v.split(separator)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
