//! Public access tokens
//!
//! A quote can be opened without an account through a bearer link. The
//! token is 32 random bytes, hex encoded, with an absolute expiry. Tokens
//! are refreshed lazily: [`TokenManager::ensure_active`] writes only when
//! the current token is missing or has run out.

use crate::clock::Clock;
use crate::store::{QuoteStore, StoreResult};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use shared::error::ErrorCode;
use shared::models::Quote;
use std::sync::Arc;

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 14;

/// Random bytes per token
const TOKEN_BYTES: usize = 32;

/// Token value with its absolute expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl PublicToken {
    /// Fresh random token valid for `ttl` from `now`
    pub fn generate(now: DateTime<Utc>, ttl: Duration) -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self {
            value: hex::encode(bytes),
            expires_at: now + ttl,
        }
    }

    /// Token stored on a quote, if both halves are present
    pub fn from_quote(quote: &Quote) -> Option<Self> {
        Some(Self {
            value: quote.public_token.clone()?,
            expires_at: quote.public_token_expires_at?,
        })
    }

    /// Usable at `now`; the expiry instant itself is already expired
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Why a supplied token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenRejection {
    #[error("Access token is required")]
    MissingToken,

    #[error("Quote has no access token")]
    MissingQuoteToken,

    #[error("Access token does not match")]
    Mismatch,

    #[error("Access token has no valid expiry")]
    InvalidExpiry,

    #[error("Access token has expired")]
    Expired,
}

impl TokenRejection {
    /// Expired links are forbidden; every other rejection is unauthorized
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingToken => ErrorCode::QuoteTokenMissing,
            Self::Expired => ErrorCode::QuoteTokenExpired,
            Self::MissingQuoteToken | Self::Mismatch | Self::InvalidExpiry => {
                ErrorCode::QuoteTokenInvalid
            }
        }
    }
}

/// Check a supplied token against the quote's stored token
pub fn validate(
    quote: &Quote,
    supplied: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), TokenRejection> {
    let supplied = supplied
        .filter(|s| !s.is_empty())
        .ok_or(TokenRejection::MissingToken)?;
    let stored = quote
        .public_token
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(TokenRejection::MissingQuoteToken)?;

    if !constant_time_eq(supplied.as_bytes(), stored.as_bytes()) {
        return Err(TokenRejection::Mismatch);
    }

    let expires_at = quote
        .public_token_expires_at
        .ok_or(TokenRejection::InvalidExpiry)?;
    if now >= expires_at {
        return Err(TokenRejection::Expired);
    }
    Ok(())
}

/// Whether the quote needs a new token at `now`
pub fn needs_refresh(quote: &Quote, now: DateTime<Utc>) -> bool {
    match PublicToken::from_quote(quote) {
        Some(token) => token.value.is_empty() || !token.is_active(now),
        None => true,
    }
}

/// Byte comparison whose running time does not depend on where inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issues and refreshes public tokens
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn QuoteStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TokenManager {
    pub fn new(store: Arc<dyn QuoteStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the quote with a usable token, writing a new one only when
    /// the current token is absent or expired
    ///
    /// Concurrent refreshes are last-writer-wins; the losing token simply
    /// stops matching.
    pub async fn ensure_active(&self, quote: Quote) -> StoreResult<Quote> {
        let now = self.clock.now();
        if !needs_refresh(&quote, now) {
            return Ok(quote);
        }

        let token = PublicToken::generate(now, self.ttl);
        let quote = self
            .store
            .set_public_token(&quote.quote_number, &token)
            .await?;
        tracing::info!(
            quote_number = %quote.quote_number,
            expires_at = %token.expires_at,
            "Public token issued"
        );
        Ok(quote)
    }
}
