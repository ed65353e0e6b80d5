//! sendmail-core — an email-sending function for LLM function calling
//!
//! One invocation flows through:
//! read arguments → validate → send (one transport call) → report.
//!
//! The two plugin binaries (`sendmail-resend`, `sendmail-smtp`) share every
//! piece of this crate and differ only in the [`transport::MailTransport`]
//! they construct at startup.

pub mod config;
pub mod function;
pub mod host;
pub mod reporter;
pub mod request;
pub mod schema;
pub mod sender;
pub mod telemetry;
pub mod transport;

pub use config::{ConfigError, ResendConfig, SmtpConfig, TransportConfig, Vars};
pub use function::{FunctionDefinition, InvocationContext, SendMailFunction, DESCRIPTION};
pub use reporter::{FailureDetail, ResultReporter};
pub use request::{ArgumentError, EmailRequest};
pub use sender::{MailSender, SendOutcome};
pub use transport::{Delivery, MailTransport, TransportError, TransportKind};
