//! Caller-facing result text for a send, plus one structured log event per send

use tracing::{error, info};

use crate::request::EmailRequest;
use crate::sender::SendOutcome;
use crate::transport::TransportKind;

pub const GENERIC_FAILURE: &str = "Failed to send email, please try again later";

/// How much of a transport error the caller gets to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDetail {
    /// Include the transport's error text
    Verbatim,
    /// Fixed message; the error only goes to the log
    Generic,
}

impl From<TransportKind> for FailureDetail {
    fn from(kind: TransportKind) -> Self {
        match kind {
            TransportKind::Resend => Self::Verbatim,
            TransportKind::Smtp => Self::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResultReporter {
    detail: FailureDetail,
}

impl ResultReporter {
    pub fn new(detail: FailureDetail) -> Self {
        Self { detail }
    }

    /// Render the outcome for the caller and log it
    pub fn report(&self, request: &EmailRequest, outcome: &SendOutcome) -> String {
        match outcome {
            SendOutcome::Sent {
                recipient,
                message_id,
            } => {
                let text = match message_id {
                    Some(id) => {
                        format!("Email has been successfully sent to {recipient} with ID: {id}")
                    }
                    None => format!("Email has been successfully sent to {recipient}"),
                };
                info!(
                    to = %request.to,
                    outcome = "sent",
                    message_id = message_id.as_deref().unwrap_or(""),
                    "send-email"
                );
                text
            }
            SendOutcome::Failed { reason } => {
                error!(to = %request.to, outcome = "failed", error = %reason, "send-email");
                self.failure_text(reason)
            }
        }
    }

    /// Text for a failure that happened before the transport was reached
    pub fn failure_text(&self, reason: &str) -> String {
        match self.detail {
            FailureDetail::Verbatim => format!("Failed to send email: {reason}"),
            FailureDetail::Generic => GENERIC_FAILURE.to_string(),
        }
    }
}
