//! send-mail — function definition and invocation handling
//!
//! Each invocation reads its arguments, sends once and writes exactly one
//! result back, whatever fails in between.

use serde::Serialize;
use tracing::{debug, warn};

use crate::reporter::{FailureDetail, ResultReporter};
use crate::request::EmailRequest;
use crate::schema;
use crate::sender::{MailSender, SendOutcome};
use crate::transport::TransportKind;

/// Capability description shown to the calling LLM for tool selection
pub const DESCRIPTION: &str = "Generate and send emails. Please provide the recipient's email address, and you should help generate appropriate subject and content. If no recipient address is provided, You should ask to add one. When you generate the subject and content, you should send it through the email sending function.";

/// Host-facing description of a function
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// Data tag the function subscribes to
    pub data_tag: u32,
    pub input_schema: serde_json::Value,
}

impl FunctionDefinition {
    pub fn for_transport(kind: TransportKind) -> Self {
        let (name, data_tag) = match kind {
            TransportKind::Resend => ("send-mail-resend", 0x67),
            TransportKind::Smtp => ("send-mail-smtp", 0x65),
        };
        Self {
            name: name.to_string(),
            description: DESCRIPTION.to_string(),
            data_tag,
            input_schema: schema::input_schema(kind),
        }
    }
}

/// Boundary through which the host hands over arguments and takes the result
pub trait InvocationContext {
    /// Raw tool-call arguments (JSON text)
    fn arguments(&self) -> &str;

    fn write_result(&mut self, result: String);
}

pub struct SendMailFunction {
    definition: FunctionDefinition,
    sender: MailSender,
    reporter: ResultReporter,
}

impl SendMailFunction {
    /// Wire a sender to the reporter matching its transport
    pub fn new(sender: MailSender) -> Self {
        let kind = sender.kind();
        Self {
            definition: FunctionDefinition::for_transport(kind),
            reporter: ResultReporter::new(FailureDetail::from(kind)),
            sender,
        }
    }

    pub fn definition(&self) -> &FunctionDefinition {
        &self.definition
    }

    /// Handle one invocation and write exactly one result back
    pub async fn handle<C: InvocationContext + ?Sized>(&self, ctx: &mut C) {
        let request = match self.read_request(ctx.arguments()) {
            Ok(request) => request,
            Err(reason) => {
                self.reject(ctx, &reason);
                return;
            }
        };
        debug!(function = %self.definition.name, to = %request.to, "Received");

        let outcome = self.send(&request).await;
        ctx.write_result(self.reporter.report(&request, &outcome));
    }

    /// Answer an invocation whose arguments cannot be used, without sending
    pub fn reject<C: InvocationContext + ?Sized>(&self, ctx: &mut C, reason: &str) {
        warn!(function = %self.definition.name, error = %reason, "Rejected arguments");
        ctx.write_result(self.reporter.failure_text(reason));
    }

    /// Send an already-parsed request
    pub async fn send(&self, request: &EmailRequest) -> SendOutcome {
        debug!(function = %self.definition.name, to = %request.to, "Sending");
        self.sender.send(request).await
    }

    fn read_request(&self, raw: &str) -> Result<EmailRequest, String> {
        let value = schema::parse_input(raw).map_err(|e| e.to_string())?;
        schema::validate_input(&value, &self.definition.input_schema)
            .map_err(|e| e.to_string())?;
        EmailRequest::from_value(value).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Delivery, MailTransport, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct StubTransport {
        kind: TransportKind,
        result: Result<Option<String>, String>,
        calls: AtomicUsize,
        delivered: Mutex<Vec<EmailRequest>>,
    }

    #[async_trait]
    impl MailTransport for StubTransport {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        async fn deliver(&self, request: &EmailRequest) -> Result<Delivery, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.delivered.lock().unwrap().push(request.clone());
            match &self.result {
                Ok(id) => Ok(Delivery {
                    message_id: id.clone(),
                }),
                Err(msg) => Err(TransportError::Rejected {
                    status: 422,
                    message: msg.clone(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct TestContext {
        args: String,
        results: Vec<String>,
    }

    impl InvocationContext for TestContext {
        fn arguments(&self) -> &str {
            &self.args
        }

        fn write_result(&mut self, result: String) {
            self.results.push(result);
        }
    }

    fn function(
        kind: TransportKind,
        result: Result<Option<String>, String>,
    ) -> (SendMailFunction, Arc<StubTransport>) {
        let stub = Arc::new(StubTransport {
            kind,
            result,
            calls: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        });
        (SendMailFunction::new(MailSender::new(stub.clone())), stub)
    }

    fn ctx(args: &str) -> TestContext {
        TestContext {
            args: args.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_reports_recipient_and_id() {
        let (f, _) = function(TransportKind::Resend, Ok(Some("abc123".into())));
        let mut c = ctx(r#"{"to":"a@b.com","subject":"Hi","body":"Hello"}"#);
        f.handle(&mut c).await;

        assert_eq!(c.results.len(), 1);
        assert!(c.results[0].contains("a@b.com"));
        assert!(c.results[0].contains("abc123"));
    }

    #[tokio::test]
    async fn test_resend_failure_includes_error() {
        let (f, _) = function(TransportKind::Resend, Err("invalid recipient".into()));
        let mut c = ctx(r#"{"to":"a@b.com","subject":"Hi","body":"Hello"}"#);
        f.handle(&mut c).await;
        assert!(c.results[0].contains("invalid recipient"));
    }

    #[tokio::test]
    async fn test_smtp_failure_is_generic() {
        let (f, _) = function(TransportKind::Smtp, Err("invalid recipient".into()));
        let mut c = ctx(r#"{"to":"a@b.com","subject":"Hi","body":"Hello"}"#);
        f.handle(&mut c).await;
        assert_eq!(c.results, vec![crate::reporter::GENERIC_FAILURE.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_recipient_still_reaches_transport() {
        let (f, stub) = function(TransportKind::Resend, Ok(Some("id".into())));
        let mut c = ctx(r#"{"subject":"Hi"}"#);
        f.handle(&mut c).await;
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.results.len(), 1);
    }

    #[tokio::test]
    async fn test_null_fields_reach_transport_as_empty() {
        let (f, stub) = function(TransportKind::Resend, Ok(Some("id".into())));
        let mut c = ctx(r#"{"to":"a@b.com","subject":null,"body":"Hello"}"#);
        f.handle(&mut c).await;

        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            stub.delivered.lock().unwrap()[0],
            EmailRequest::new("a@b.com", "", "Hello")
        );
        assert_eq!(c.results, vec!["Email has been successfully sent to a@b.com with ID: id"]);
    }

    #[tokio::test]
    async fn test_malformed_arguments_skip_transport() {
        let (f, stub) = function(TransportKind::Resend, Ok(Some("id".into())));
        let mut c = ctx(r#"{"to": 42}"#);
        f.handle(&mut c).await;
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert_eq!(c.results.len(), 1);
        assert!(c.results[0].starts_with("Failed to send email:"));
    }

    #[tokio::test]
    async fn test_each_invocation_sends() {
        let (f, stub) = function(TransportKind::Smtp, Ok(None));
        for _ in 0..3 {
            let mut c = ctx(r#"{"to":"a@b.com","subject":"Hi","body":"Hello"}"#);
            f.handle(&mut c).await;
            assert_eq!(c.results, vec!["Email has been successfully sent to a@b.com"]);
        }
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_definitions() {
        let resend = FunctionDefinition::for_transport(TransportKind::Resend);
        assert_eq!(resend.name, "send-mail-resend");
        assert_eq!(resend.data_tag, 0x67);
        assert_eq!(resend.description, DESCRIPTION);

        let smtp = FunctionDefinition::for_transport(TransportKind::Smtp);
        assert_eq!(smtp.name, "send-mail-smtp");
        assert_eq!(smtp.data_tag, 0x65);
        assert!(smtp.input_schema["properties"]["to"].is_object());
    }
}
