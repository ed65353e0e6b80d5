//! Mail transports: the network call behind every send
//!
//! - `resend`: Resend transactional email HTTP API
//! - `smtp`: direct SMTP submission, no authentication

pub mod resend;
pub mod smtp;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::TransportConfig;
use crate::request::EmailRequest;

pub use resend::ResendTransport;
pub use smtp::SmtpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Resend,
    Smtp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resend => f.write_str("resend"),
            Self::Smtp => f.write_str("smtp"),
        }
    }
}

/// What the transport reports back on acceptance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Provider-assigned id; SMTP submission has none
    pub message_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("Mail server refused message: {0}")]
    Refused(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Mail server unreachable: {0}")]
    Unreachable(String),

    #[error("Failed to build transport: {0}")]
    Build(String),
}

/// Sends one email to one recipient. Implementations are shared across
/// concurrent invocations and hold no per-call state.
#[async_trait]
pub trait MailTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// One send attempt. Calling twice sends twice.
    async fn deliver(&self, request: &EmailRequest) -> Result<Delivery, TransportError>;
}

/// Build the transport matching a resolved configuration
pub fn build(config: TransportConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
    Ok(match config {
        TransportConfig::Resend(c) => Arc::new(ResendTransport::new(c)?),
        TransportConfig::Smtp(c) => Arc::new(SmtpTransport::new(c)),
    })
}
