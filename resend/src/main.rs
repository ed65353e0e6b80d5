//! sfn-send-mail-resend — send-mail function backed by the Resend API
//!
//! Requires `RESEND_API_KEY` in the environment or `.env`; without it the
//! process exits before serving a single invocation.

use anyhow::Result;
use sendmail_core::{host, telemetry, TransportKind};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;
    info!("send-mail-resend v{} starting", env!("CARGO_PKG_VERSION"));

    host::run(TransportKind::Resend).await
}
