//! Line-delimited JSON host on stdin/stdout
//!
//! Request line:  `{"id": ..., "arguments": {...} | "<json text>"}` (`id` optional,
//! any JSON scalar). An object with neither `id` nor `arguments` is taken as
//! the bare arguments. Anything else is answered with a failure result and
//! nothing is sent.
//! Response line: `{"id": "...", "result": "...", "completed_at": "<rfc3339>"}`.
//!
//! Every line runs on its own task; responses are written by a single writer
//! task, so they may come back in a different order than the requests.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{TransportConfig, Vars};
use crate::function::{FunctionDefinition, InvocationContext, SendMailFunction};
use crate::sender::MailSender;
use crate::transport::{self, TransportKind};

/// One invocation read from a request line
#[derive(Debug)]
pub struct JsonInvocation {
    pub id: String,
    arguments: String,
    /// Set when the line itself was unusable
    rejection: Option<String>,
    result: Option<String>,
}

impl JsonInvocation {
    pub fn new(id: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            arguments: arguments.into(),
            rejection: None,
            result: None,
        }
    }

    fn rejected(id: String, reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::new(id, "")
        }
    }

    pub fn from_line(line: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => return Self::rejected(new_id(), format!("Invalid invocation line: {e}")),
        };
        let Value::Object(mut fields) = value else {
            return Self::rejected(new_id(), "Invocation line is not a JSON object");
        };
        if !fields.contains_key("id") && !fields.contains_key("arguments") {
            return Self::new(new_id(), line);
        }

        let id = match fields.remove("id") {
            None | Some(Value::Null) => new_id(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        match fields.remove("arguments") {
            None | Some(Value::Null) => Self::new(id, ""),
            Some(Value::String(s)) => Self::new(id, s),
            Some(args @ Value::Object(_)) => Self::new(id, args.to_string()),
            Some(other) => Self::rejected(
                id,
                format!("arguments must be an object or a JSON string, got {other}"),
            ),
        }
    }

    /// Why the line could not be handed to the function, if it could not
    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn into_response(self) -> InvocationResponse {
        InvocationResponse {
            id: self.id,
            result: self.result.unwrap_or_default(),
            completed_at: Utc::now(),
        }
    }
}

impl InvocationContext for JsonInvocation {
    fn arguments(&self) -> &str {
        &self.arguments
    }

    fn write_result(&mut self, result: String) {
        self.result = Some(result);
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub id: String,
    pub result: String,
    pub completed_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Serve invocations from `input` until EOF, then wait for in-flight ones.
/// Returns the output sink once everything has been written.
pub async fn serve<R, W>(function: Arc<SendMailFunction>, input: R, output: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<InvocationResponse>(128);

    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response).context("Failed to serialize result")?;
            line.push(b'\n');
            output.write_all(&line).await.context("Failed to write result")?;
            output.flush().await.context("Failed to flush result")?;
        }
        Ok::<W, anyhow::Error>(output)
    });

    info!(function = %function.definition().name, "Serving invocations");

    let mut lines = input.lines();
    let mut served = 0u64;
    while let Some(line) = lines.next_line().await.context("Failed to read invocation")? {
        if line.trim().is_empty() {
            continue;
        }
        served += 1;

        let mut invocation = JsonInvocation::from_line(&line);
        let span = info_span!("invocation", id = %invocation.id);
        let function = function.clone();
        let tx = tx.clone();

        tokio::spawn(
            async move {
                match invocation.rejection.take() {
                    Some(reason) => function.reject(&mut invocation, &reason),
                    None => function.handle(&mut invocation).await,
                }
                if tx.send(invocation.into_response()).await.is_err() {
                    debug!("Result writer gone, dropping result");
                }
            }
            .instrument(span),
        );
    }

    drop(tx);
    let output = writer.await.context("Result writer panicked")??;
    info!(served, "Input closed, all invocations reported");
    Ok(output)
}

/// Process entry point shared by the plugin binaries.
///
/// `describe` as the first argument prints the function definition and exits.
/// Otherwise configuration is resolved (a missing Resend API key aborts here,
/// before anything is served) and stdin is served until EOF.
pub async fn run(kind: TransportKind) -> Result<()> {
    if std::env::args().nth(1).as_deref() == Some("describe") {
        let definition = FunctionDefinition::for_transport(kind);
        println!("{}", serde_json::to_string_pretty(&definition)?);
        return Ok(());
    }

    let vars = Vars::from_process().context("Failed to load configuration")?;
    let config = TransportConfig::resolve(kind, &vars).context("Invalid configuration")?;
    let transport = transport::build(config).context("Failed to initialize mail transport")?;
    let function = Arc::new(SendMailFunction::new(MailSender::new(transport)));

    info!(
        function = %function.definition().name,
        tag = function.definition().data_tag,
        "Function ready"
    );

    serve(
        function,
        tokio::io::BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    Ok(())
}
