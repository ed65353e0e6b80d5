//! Resend transactional email API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Delivery, MailTransport, TransportError, TransportKind};
use crate::config::ResendConfig;
use crate::request::EmailRequest;

/// Client for `POST /emails`. The underlying `reqwest::Client` is built once
/// and shared by every invocation.
pub struct ResendTransport {
    client: reqwest::Client,
    config: ResendConfig,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

impl ResendTransport {
    pub fn new(config: ResendConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sendmail-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn render_html(&self, body: &str) -> String {
        if self.config.escape_html {
            format!("<p>{}</p>", escape_html(body))
        } else {
            format!("<p>{body}</p>")
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Resend
    }

    async fn deliver(&self, request: &EmailRequest) -> Result<Delivery, TransportError> {
        let payload = SendEmailRequest {
            from: &self.config.from_address,
            to: [request.to.as_str()],
            subject: &request.subject,
            html: self.render_html(&request.body),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Network(format!("Unreadable Resend response: {e}")))?;

        debug!(id = %sent.id, "Resend accepted message");
        Ok(Delivery {
            message_id: Some(sent.id),
        })
    }
}

/// Escape the characters that matter inside an HTML text node or attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
