//! sfn-send-mail-smtp — send-mail function submitting straight to an SMTP relay
//!
//! Reads `SMTP_HOST`, `SMTP_PORT` and `FROM_EMAIL`. Missing values are not
//! checked at startup; every send fails until they are set.

use anyhow::Result;
use sendmail_core::{host, telemetry, TransportKind};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing()?;
    info!("send-mail-smtp v{} starting", env!("CARGO_PKG_VERSION"));

    host::run(TransportKind::Smtp).await
}
