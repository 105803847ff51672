//! Quote workflow
//!
//! Ties the record manager, token lifecycle, renderer and dispatcher
//! together. Issuing always persists first; rendering and email happen
//! afterwards and their failure is reported next to the saved quote rather
//! than undoing it.

use crate::clock::Clock;
use crate::dispatch::{DeliveryReceipt, DispatchError, Dispatcher, EmailConfigError, EmailSettings};
use crate::error::ServiceResult;
use crate::links::Links;
use crate::records::QuoteRecords;
use crate::render::{DocumentRenderer, RenderError, RenderedDocument};
use crate::store::QuoteStore;
use crate::token::{self, TokenManager};
use crate::validity::{self, DisplayStatus, Validity};
use chrono::Duration;
use shared::models::{Quote, QuoteInput, QuoteStatus};
use std::sync::Arc;
use tracing::instrument;

/// A quote as the customer sees it
#[derive(Debug, Clone)]
pub struct QuoteView {
    pub quote: Quote,
    pub validity: Validity,
}

/// Why an issued quote was not delivered
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    EmailConfig(#[from] EmailConfigError),

    #[error(transparent)]
    Send(#[from] DispatchError),
}

/// Result of issuing: the quote is saved either way
#[derive(Debug)]
pub struct IssueOutcome {
    pub quote: Quote,
    pub validity: Validity,
    pub delivery: Result<DeliveryReceipt, DeliveryError>,
}

impl IssueOutcome {
    pub fn delivered(&self) -> bool {
        self.delivery.is_ok()
    }
}

/// Everything the workflow needs besides the store and clock
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub token_ttl: Duration,
    pub links: Links,
    pub email: EmailSettings,
    /// Added to every quote email
    pub default_bcc: Vec<String>,
}

#[derive(Clone)]
pub struct QuoteService {
    records: QuoteRecords,
    tokens: TokenManager,
    renderer: Arc<DocumentRenderer>,
    settings: Arc<ServiceSettings>,
    http: reqwest::Client,
}

impl QuoteService {
    pub fn new(
        store: Arc<dyn QuoteStore>,
        clock: Arc<dyn Clock>,
        renderer: DocumentRenderer,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            records: QuoteRecords::new(store.clone(), clock.clone()),
            tokens: TokenManager::new(store, clock, settings.token_ttl),
            renderer: Arc::new(renderer),
            settings: Arc::new(settings),
            http: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client for provider calls
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn records(&self) -> &QuoteRecords {
        &self.records
    }

    pub async fn create(&self, input: &QuoteInput) -> ServiceResult<Quote> {
        Ok(self.records.create(input).await?)
    }

    pub async fn update(&self, quote_number: &str, input: &QuoteInput) -> ServiceResult<Quote> {
        Ok(self.records.update(quote_number, input).await?)
    }

    pub async fn find(&self, quote_number: &str) -> ServiceResult<QuoteView> {
        let quote = self.records.find(quote_number).await?;
        Ok(self.with_validity(quote))
    }

    /// Public access: the supplied token must match and be unexpired
    #[instrument(skip(self, supplied_token))]
    pub async fn view(
        &self,
        quote_number: &str,
        supplied_token: Option<&str>,
    ) -> ServiceResult<QuoteView> {
        let quote = self.records.find(quote_number).await?;
        if let Err(rejection) = token::validate(&quote, supplied_token, self.now()) {
            tracing::warn!(reason = %rejection, "Quote access rejected");
            return Err(rejection.into());
        }
        Ok(self.with_validity(quote))
    }

    /// Public download of the document, after the same token check
    pub async fn document(
        &self,
        quote_number: &str,
        supplied_token: Option<&str>,
    ) -> ServiceResult<RenderedDocument> {
        let view = self.view(quote_number, supplied_token).await?;
        Ok(self.renderer.render(&view.quote, view.validity, None)?)
    }

    /// Render without any token check
    pub async fn render_quote(&self, quote_number: &str) -> ServiceResult<RenderedDocument> {
        let view = self.find(quote_number).await?;
        Ok(self.renderer.render(&view.quote, view.validity, None)?)
    }

    /// Issue (or re-issue) and email the quote
    ///
    /// Re-issuing an already issued quote bumps the revision by one; the
    /// first issue of a draft keeps it. A still-valid token is kept.
    #[instrument(skip(self, bcc), fields(bcc = bcc.len()))]
    pub async fn issue_and_send(
        &self,
        quote_number: &str,
        bcc: &[String],
    ) -> ServiceResult<IssueOutcome> {
        let current = self.records.find(quote_number).await?;
        let issued = match current.status {
            QuoteStatus::Issued => self.records.reissue(quote_number).await?,
            QuoteStatus::Draft => self.records.issue(quote_number).await?,
        };
        let quote = self.tokens.ensure_active(issued).await?;
        let validity = validity::evaluate(quote.quote_date, quote.status, self.now());

        let delivery = self.deliver(&quote, validity, bcc).await;
        match &delivery {
            Ok(receipt) => tracing::info!(
                quote_number = %quote.quote_number,
                revision = quote.revision,
                provider = receipt.provider,
                "Quote issued and sent"
            ),
            Err(e) => tracing::warn!(
                quote_number = %quote.quote_number,
                revision = quote.revision,
                error = %e,
                "Quote issued but not delivered"
            ),
        }

        Ok(IssueOutcome {
            quote,
            validity,
            delivery,
        })
    }

    async fn deliver(
        &self,
        quote: &Quote,
        validity: Validity,
        bcc: &[String],
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let document = self
            .renderer
            .render(quote, validity, Some(DisplayStatus::Issued))?;
        let dispatcher = Dispatcher::from_settings(
            &self.settings.email,
            self.settings.links.clone(),
            &self.http,
        )?;

        let mut recipients = self.settings.default_bcc.clone();
        recipients.extend(bcc.iter().cloned());
        Ok(dispatcher
            .send_quote(quote, &document, validity.valid_until, &recipients)
            .await?)
    }

    fn with_validity(&self, quote: Quote) -> QuoteView {
        let validity = validity::evaluate(quote.quote_date, quote.status, self.now());
        QuoteView { quote, validity }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.records.clock().now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ServiceError;
    use crate::store::MemoryQuoteStore;
    use crate::token::TokenRejection;
    use chrono::{TimeZone, Utc};
    use shared::models::QuoteLineInput;

    fn input() -> QuoteInput {
        QuoteInput {
            email: "buyer@example.com".into(),
            lines: vec![QuoteLineInput {
                sku: "A1".into(),
                name: "Widget".into(),
                qty: 2,
                unit_price_ex_vat: 10.0,
            }],
            ..Default::default()
        }
    }

    fn service(clock: Arc<FixedClock>) -> QuoteService {
        QuoteService::new(
            Arc::new(MemoryQuoteStore::new()),
            clock,
            DocumentRenderer::default(),
            ServiceSettings {
                token_ttl: Duration::days(14),
                links: Links::new("https://shop.example"),
                email: EmailSettings {
                    from_email: "quotes@shop.example".into(),
                    brand_name: "Shop".into(),
                    currency_symbol: "£".into(),
                    ..Default::default()
                },
                default_bcc: vec![],
            },
        )
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_issue_without_provider_still_saves() {
        let service = service(clock());
        let quote = service.create(&input()).await.unwrap();

        let outcome = service.issue_and_send(&quote.quote_number, &[]).await.unwrap();
        assert!(!outcome.delivered());
        assert!(matches!(
            outcome.delivery,
            Err(DeliveryError::EmailConfig(EmailConfigError::NoProvider))
        ));
        assert_eq!(outcome.quote.status, QuoteStatus::Issued);
        assert_eq!(outcome.quote.revision, 0);
        assert!(outcome.quote.public_token.is_some());

        let stored = service.find(&quote.quote_number).await.unwrap();
        assert_eq!(stored.quote.status, QuoteStatus::Issued);
    }

    #[tokio::test]
    async fn test_reissue_bumps_revision_and_keeps_token() {
        let service = service(clock());
        let quote = service.create(&input()).await.unwrap();

        let first = service.issue_and_send(&quote.quote_number, &[]).await.unwrap();
        let second = service.issue_and_send(&quote.quote_number, &[]).await.unwrap();
        assert_eq!(first.quote.revision, 0);
        assert_eq!(second.quote.revision, 1);
        assert_eq!(first.quote.public_token, second.quote.public_token);
    }

    #[tokio::test]
    async fn test_view_checks_token() {
        let clock = clock();
        let service = service(clock.clone());
        let quote = service.create(&input()).await.unwrap();
        let issued = service
            .issue_and_send(&quote.quote_number, &[])
            .await
            .unwrap()
            .quote;
        let token = issued.public_token.clone().unwrap();

        let view = service
            .view(&quote.quote_number, Some(token.as_str()))
            .await
            .unwrap();
        assert_eq!(view.validity.status, DisplayStatus::Issued);

        let err = service.view(&quote.quote_number, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Token(TokenRejection::MissingToken)));

        let err = service
            .view(&quote.quote_number, Some("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Token(TokenRejection::Mismatch)));

        clock.advance(Duration::days(14));
        let err = service
            .document(&quote.quote_number, Some(token.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Token(TokenRejection::Expired)));
    }

    #[tokio::test]
    async fn test_draft_has_no_public_access() {
        let service = service(clock());
        let quote = service.create(&input()).await.unwrap();
        let err = service
            .view(&quote.quote_number, Some("anything"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Token(TokenRejection::MissingQuoteToken)
        ));
    }
}
