//! Public link shapes

/// Builds customer-facing links from the public base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    base: String,
}

impl Links {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// `{base}/quotes/{number}?token={token}`
    pub fn view_url(&self, quote_number: &str, token: &str) -> String {
        format!("{}/quotes/{quote_number}?token={token}", self.base)
    }

    /// `{base}/api/quotes/{number}/pdf?token={token}`
    pub fn document_url(&self, quote_number: &str, token: &str) -> String {
        format!("{}/api/quotes/{quote_number}/pdf?token={token}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_shapes() {
        let links = Links::new("https://shop.example.com/");
        assert_eq!(
            links.view_url("250115-001", "ab12"),
            "https://shop.example.com/quotes/250115-001?token=ab12"
        );
        assert_eq!(
            links.document_url("250115-001", "ab12"),
            "https://shop.example.com/api/quotes/250115-001/pdf?token=ab12"
        );
    }
}
