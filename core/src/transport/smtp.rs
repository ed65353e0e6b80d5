//! Direct SMTP submission with lettre
//!
//! No authentication and no TLS: the message is handed to a local relay
//! (or a dev catcher such as MailHog) exactly as built by [`raw_message`].

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::debug;

use super::{Delivery, MailTransport, TransportError, TransportKind};
use crate::config::SmtpConfig;
use crate::request::EmailRequest;

pub struct SmtpTransport {
    config: SmtpConfig,
    /// `None` when host or port is missing; every send then fails
    relay: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpTransport {
    pub fn new(config: SmtpConfig) -> Self {
        let relay = config.port.filter(|_| !config.host.is_empty()).map(|port| {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(port)
                .build()
        });
        Self { config, relay }
    }

    fn envelope(&self, to: &str) -> Result<Envelope, TransportError> {
        let from = if self.config.from_address.is_empty() {
            None
        } else {
            Some(parse_address(&self.config.from_address)?)
        };
        Envelope::new(from, vec![parse_address(to)?])
            .map_err(|e| TransportError::InvalidAddress(format!("{to}: {e}")))
    }
}

/// The exact bytes submitted after `DATA`: a subject header, a blank line, the body.
pub fn raw_message(request: &EmailRequest) -> String {
    format!("Subject: {}\r\n\r\n{}", request.subject, request.body)
}

fn parse_address(addr: &str) -> Result<Address, TransportError> {
    addr.trim()
        .parse()
        .map_err(|_| TransportError::InvalidAddress(addr.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Smtp
    }

    async fn deliver(&self, request: &EmailRequest) -> Result<Delivery, TransportError> {
        let relay = self.relay.as_ref().ok_or_else(|| {
            TransportError::Unreachable(format!(
                "no SMTP address configured (host '{}', port {:?})",
                self.config.host, self.config.port
            ))
        })?;

        let envelope = self.envelope(&request.to)?;
        let message = raw_message(request);

        let response = relay
            .send_raw(&envelope, message.as_bytes())
            .await
            .map_err(|e| {
                if e.is_permanent() || e.is_transient() {
                    TransportError::Refused(e.to_string())
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        debug!(
            server = %response.message().collect::<Vec<&str>>().join(" "),
            "SMTP relay accepted message"
        );
        Ok(Delivery { message_id: None })
    }
}
