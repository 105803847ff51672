//! Transactional email provider abstraction

use super::DispatchError;
use async_trait::async_trait;
use std::fmt;

/// Address with an optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub email: String,
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }
}

/// `Name <email>` when a name is set, otherwise the bare address
impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name.replace(['<', '>', '"'], ""), self.email),
            None => f.write_str(&self.email),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// Fully composed message, ready for any provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: Mailbox,
    pub to: String,
    pub bcc: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachment: Attachment,
}

/// Accepted by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider: &'static str,
    /// Provider-side message id, when the provider returns one
    pub message_id: Option<String>,
}

/// One transactional-send capability
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Short provider name used in logs and errors
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_display() {
        assert_eq!(Mailbox::new("a@b.com", None).to_string(), "a@b.com");
        assert_eq!(
            Mailbox::new("a@b.com", Some("Sales <Team>".into())).to_string(),
            "Sales Team <a@b.com>"
        );
    }

    #[test]
    fn test_attachment_base64() {
        let attachment = Attachment {
            file_name: "quote.pdf".into(),
            content_type: "application/pdf".into(),
            data: b"%PDF".to_vec(),
        };
        assert_eq!(attachment.base64(), "JVBERg==");
    }
}
