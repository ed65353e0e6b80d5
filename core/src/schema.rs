//! JSON Schema for the send-mail arguments, and validation against it

use anyhow::{bail, Result};
use serde_json::json;

use crate::transport::TransportKind;

/// Argument schema handed to the host for schema-driven tool invocation.
///
/// No `required` list. A missing recipient is left to the caller, which the
/// description tells to ask the user for one. `null` is accepted and read as
/// an empty string.
pub fn input_schema(kind: TransportKind) -> serde_json::Value {
    let (to, subject, body) = match kind {
        TransportKind::Resend => (
            json!({
                "type": ["string", "null"],
                "description": "The recipient's email address",
            }),
            "The subject of the email",
            "The content of the email",
        ),
        TransportKind::Smtp => (
            json!({
                "type": ["string", "null"],
                "description": "Recipient's email address",
                "examples": ["example@example.com"],
            }),
            "Email subject",
            "Email content",
        ),
    };

    json!({
        "type": "object",
        "properties": {
            "to": to,
            "subject": { "type": ["string", "null"], "description": subject },
            "body": { "type": ["string", "null"], "description": body },
        },
    })
}

/// Validate parsed arguments against a schema
pub fn validate_input(input: &serde_json::Value, schema: &serde_json::Value) -> Result<()> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| anyhow::anyhow!("Invalid JSON schema: {e}"))?;

    if let Err(error) = validator.validate(input) {
        bail!("Input validation failed: {}", error);
    }

    Ok(())
}

/// Parse raw argument text into a JSON value. Blank input is an empty object.
pub fn parse_input(input: &str) -> Result<serde_json::Value> {
    if input.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(input).map_err(|e| anyhow::anyhow!("Invalid JSON arguments: {e}"))
}
