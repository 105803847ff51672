//! SendGrid v3 mail send API

use super::DispatchError;
use super::provider::{DeliveryReceipt, EmailProvider, OutboundEmail};
use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";
const NAME: &str = "sendgrid";

pub struct SendGridProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SendGridProvider {
    pub fn new(client: reqwest::Client, api_key: String, base_url: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

fn address(email: &str) -> Address<'_> {
    Address { email, name: None }
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
    /// SendGrid rejects an empty bcc list
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct RequestAttachment<'a> {
    content: String,
    filename: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    disposition: &'static str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
    attachments: [RequestAttachment<'a>; 1],
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DispatchError> {
        let body = SendRequest {
            personalizations: [Personalization {
                to: vec![address(&email.to)],
                bcc: email.bcc.iter().map(|b| address(b)).collect(),
            }],
            from: Address {
                email: &email.from.email,
                name: email.from.name.as_deref(),
            },
            subject: &email.subject,
            content: [
                Content {
                    kind: "text/plain",
                    value: &email.text,
                },
                Content {
                    kind: "text/html",
                    value: &email.html,
                },
            ],
            attachments: [RequestAttachment {
                content: email.attachment.base64(),
                filename: &email.attachment.file_name,
                kind: &email.attachment.content_type,
                disposition: "attachment",
            }],
        };

        let resp = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| DispatchError::Transport {
                provider: NAME,
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                provider: NAME,
                status: status.as_u16(),
                body,
            });
        }

        let message_id = resp
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(DeliveryReceipt {
            provider: NAME,
            message_id,
        })
    }
}
