//! Resend transactional email API

use super::DispatchError;
use super::provider::{DeliveryReceipt, EmailProvider, OutboundEmail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";
const NAME: &str = "resend";

pub struct ResendProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ResendProvider {
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
struct SendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    #[serde(skip_serializing_if = "no_bcc")]
    bcc: &'a [String],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
    attachments: [RequestAttachment<'a>; 1],
}

fn no_bcc(bcc: &&[String]) -> bool {
    bcc.is_empty()
}

#[derive(Serialize)]
struct RequestAttachment<'a> {
    filename: &'a str,
    content: String,
    content_type: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: Option<String>,
}

#[async_trait]
impl EmailProvider for ResendProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DispatchError> {
        let body = SendRequest {
            from: email.from.to_string(),
            to: [email.to.as_str()],
            bcc: &email.bcc,
            subject: &email.subject,
            text: &email.text,
            html: &email.html,
            attachments: [RequestAttachment {
                filename: &email.attachment.file_name,
                content: email.attachment.base64(),
                content_type: &email.attachment.content_type,
            }],
        };

        let resp = self
            .client
            .post(format!("{}/emails", self.base_url))
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

        // A 2xx without a readable body is still accepted
        let message_id = resp.json::<SendResponse>().await.ok().and_then(|r| r.id);
        Ok(DeliveryReceipt {
            provider: NAME,
            message_id,
        })
    }
}
