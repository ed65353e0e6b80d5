//! Tool-call arguments for sending one email

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// One email to one recipient, as supplied by the calling LLM.
///
/// Nothing here is checked: an empty or malformed `to` is handed to the
/// transport as-is and surfaces as a transport failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Recipient email address
    #[serde(default, deserialize_with = "null_as_empty")]
    pub to: String,
    /// Email subject line
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subject: String,
    /// Email body (plain text)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

/// `null` reads as an empty string, like a missing field
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Invalid JSON arguments: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl EmailRequest {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Parse raw tool-call arguments. Missing fields become empty strings.
    pub fn from_arguments(raw: &str) -> Result<Self, ArgumentError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Same as [`EmailRequest::from_arguments`] for an already-parsed value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ArgumentError> {
        Ok(serde_json::from_value(value)?)
    }
}
