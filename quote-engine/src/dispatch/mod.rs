//! Quote email dispatch
//!
//! Sends an issued quote to the customer with the PDF attached and two
//! links (direct download and online view). The transport is the first
//! provider whose credential is configured, probed in a fixed order:
//! Resend, then SendGrid.
//!
//! Delivery is best-effort. There is no retry here; callers decide.

mod provider;
mod resend;
mod sendgrid;

pub use provider::{Attachment, DeliveryReceipt, EmailProvider, Mailbox, OutboundEmail};
pub use resend::ResendProvider;
pub use sendgrid::SendGridProvider;

use crate::links::Links;
use crate::money::{Totals, format_money};
use crate::render::{CONTENT_TYPE, RenderedDocument};
use chrono::NaiveDate;
use shared::models::Quote;
use tracing::instrument;
use validator::ValidateEmail;

const DATE_FORMAT: &str = "%d %B %Y";

/// Email is not usable with the current configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailConfigError {
    #[error("No email provider configured (set RESEND_API_KEY or SENDGRID_API_KEY)")]
    NoProvider,

    #[error("Invalid sender address: {0}")]
    InvalidSender(String),
}

/// A send attempt failed
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("{provider} rejected the message with HTTP {status}: {body}")]
    Rejected {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl DispatchError {
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRecipient(_) => None,
            Self::Rejected { provider, .. } | Self::Transport { provider, .. } => Some(*provider),
        }
    }
}

/// Sender identity and provider credentials
#[derive(Debug, Clone, Default)]
pub struct EmailSettings {
    pub from_email: String,
    pub from_name: Option<String>,
    pub resend_api_key: Option<String>,
    pub sendgrid_api_key: Option<String>,
    /// Override for tests and proxies
    pub resend_base_url: Option<String>,
    pub sendgrid_base_url: Option<String>,
    /// Name used in the email signature
    pub brand_name: String,
    pub currency_symbol: String,
}

type Probe = fn(&EmailSettings, &reqwest::Client) -> Option<Box<dyn EmailProvider>>;

fn probe_resend(settings: &EmailSettings, client: &reqwest::Client) -> Option<Box<dyn EmailProvider>> {
    let key = settings.resend_api_key.clone()?;
    Some(Box::new(ResendProvider::new(
        client.clone(),
        key,
        settings.resend_base_url.clone(),
    )))
}

fn probe_sendgrid(
    settings: &EmailSettings,
    client: &reqwest::Client,
) -> Option<Box<dyn EmailProvider>> {
    let key = settings.sendgrid_api_key.clone()?;
    Some(Box::new(SendGridProvider::new(
        client.clone(),
        key,
        settings.sendgrid_base_url.clone(),
    )))
}

/// Probed in order; the first configured provider wins
const PROBES: [Probe; 2] = [probe_resend, probe_sendgrid];

/// Pick the first configured provider
pub fn select_provider(
    settings: &EmailSettings,
    client: &reqwest::Client,
) -> Result<Box<dyn EmailProvider>, EmailConfigError> {
    PROBES
        .iter()
        .find_map(|probe| probe(settings, client))
        .ok_or(EmailConfigError::NoProvider)
}

fn is_valid_address(address: &str) -> bool {
    address.to_string().validate_email()
}

/// Composes and sends quote emails through one provider
pub struct Dispatcher {
    provider: Box<dyn EmailProvider>,
    sender: Mailbox,
    links: Links,
    brand_name: String,
    currency_symbol: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("provider", &self.provider.name())
            .field("sender", &self.sender)
            .finish()
    }
}

impl Dispatcher {
    /// Validate the sender and select a provider
    pub fn from_settings(
        settings: &EmailSettings,
        links: Links,
        client: &reqwest::Client,
    ) -> Result<Self, EmailConfigError> {
        let from_email = settings.from_email.trim();
        if !is_valid_address(from_email) {
            return Err(EmailConfigError::InvalidSender(from_email.to_string()));
        }
        let provider = select_provider(settings, client)?;
        Ok(Self {
            provider,
            sender: Mailbox::new(from_email, settings.from_name.clone()),
            links,
            brand_name: settings.brand_name.clone(),
            currency_symbol: settings.currency_symbol.clone(),
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Compose the quote email without sending it
    ///
    /// The quote must carry a public token; links are built from it.
    pub fn compose(
        &self,
        quote: &Quote,
        document: &RenderedDocument,
        valid_until: NaiveDate,
        bcc: &[String],
    ) -> Result<OutboundEmail, DispatchError> {
        let to = quote.email.trim();
        if !is_valid_address(to) {
            return Err(DispatchError::InvalidRecipient(to.to_string()));
        }
        let mut bcc_list: Vec<String> = Vec::with_capacity(bcc.len());
        for address in bcc.iter().map(|b| b.trim()).filter(|b| !b.is_empty()) {
            if !is_valid_address(address) {
                return Err(DispatchError::InvalidRecipient(address.to_string()));
            }
            // The recipient never appears twice in one message
            if address.eq_ignore_ascii_case(to) {
                continue;
            }
            if !bcc_list.iter().any(|b| b.eq_ignore_ascii_case(address)) {
                bcc_list.push(address.to_string());
            }
        }

        let token = quote.public_token.as_deref().unwrap_or_default();
        let content = EmailContent {
            quote_number: &quote.quote_number,
            revision: quote.revision,
            view_url: self.links.view_url(&quote.quote_number, token),
            download_url: self.links.document_url(&quote.quote_number, token),
            valid_until: valid_until.format(DATE_FORMAT).to_string(),
            total: format_money(
                Totals::from_subtotal(quote.subtotal_ex_vat).total_inc_vat,
                &self.currency_symbol,
            ),
            brand_name: &self.brand_name,
        };

        Ok(OutboundEmail {
            from: self.sender.clone(),
            to: to.to_string(),
            bcc: bcc_list,
            subject: content.subject(),
            text: content.text(),
            html: content.html(),
            attachment: Attachment {
                file_name: document.file_name.clone(),
                content_type: CONTENT_TYPE.to_string(),
                data: document.bytes.clone(),
            },
        })
    }

    /// Compose and send
    #[instrument(skip_all, fields(quote_number = %quote.quote_number, provider = self.provider.name()))]
    pub async fn send_quote(
        &self,
        quote: &Quote,
        document: &RenderedDocument,
        valid_until: NaiveDate,
        bcc: &[String],
    ) -> Result<DeliveryReceipt, DispatchError> {
        let email = self.compose(quote, document, valid_until, bcc)?;
        match self.provider.send(&email).await {
            Ok(receipt) => {
                tracing::info!(
                    to = %email.to,
                    bcc = email.bcc.len(),
                    message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "Quote email sent"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Quote email failed");
                Err(e)
            }
        }
    }
}

struct EmailContent<'a> {
    quote_number: &'a str,
    revision: i32,
    view_url: String,
    download_url: String,
    valid_until: String,
    total: String,
    brand_name: &'a str,
}

impl EmailContent<'_> {
    fn subject(&self) -> String {
        if self.revision > 0 {
            format!("Your quote {} (revision {})", self.quote_number, self.revision)
        } else {
            format!("Your quote {}", self.quote_number)
        }
    }

    fn text(&self) -> String {
        format!(
            "Thank you for your enquiry.\n\n\
             Your quote {number} is attached. Total {total} including VAT, \
             valid until {valid_until}.\n\n\
             Download the PDF: {download}\n\
             View online: {view}\n\n\
             {brand}\n",
            number = self.quote_number,
            total = self.total,
            valid_until = self.valid_until,
            download = self.download_url,
            view = self.view_url,
            brand = self.brand_name,
        )
    }

    fn html(&self) -> String {
        format!(
            "<p>Thank you for your enquiry.</p>\
             <p>Your quote <strong>{number}</strong> is attached. Total {total} including VAT, \
             valid until {valid_until}.</p>\
             <p><a href=\"{download}\">Download the PDF</a> &middot; \
             <a href=\"{view}\">View online</a></p>\
             <p>{brand}</p>",
            number = escape_html(self.quote_number),
            total = escape_html(&self.total),
            valid_until = escape_html(&self.valid_until),
            download = escape_html(&self.download_url),
            view = escape_html(&self.view_url),
            brand = escape_html(self.brand_name),
        )
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
