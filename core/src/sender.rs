//! Sends one email through the configured transport and folds any error into [`SendOutcome`]

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::request::EmailRequest;
use crate::transport::{MailTransport, TransportKind};

/// Result of exactly one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent {
        recipient: String,
        message_id: Option<String>,
    },
    Failed {
        reason: String,
    },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Owns the shared transport handle. Clones are cheap and share it.
#[derive(Clone)]
pub struct MailSender {
    transport: Arc<dyn MailTransport>,
}

impl MailSender {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Send once. No retry, no deduplication; transport errors never escape.
    pub async fn send(&self, request: &EmailRequest) -> SendOutcome {
        let start = Instant::now();
        let result = self.transport.deliver(request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(delivery) => {
                info!(
                    transport = %self.transport.kind(),
                    to = %request.to,
                    elapsed_ms,
                    "Transport accepted email"
                );
                SendOutcome::Sent {
                    recipient: request.to.clone(),
                    message_id: delivery.message_id,
                }
            }
            Err(e) => {
                warn!(
                    transport = %self.transport.kind(),
                    to = %request.to,
                    elapsed_ms,
                    error = %e,
                    "Transport rejected email"
                );
                SendOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
