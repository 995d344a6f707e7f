//! # Relay Core
//!
//! Core traits and types for the smsrelay pipeline.
//!
//! A relay request flows through four stages, each represented here by a
//! type or a trait so the stages can be implemented (and stubbed) independently:
//! - inbound parsing produces an [`InboundMessage`]
//! - a [`ReplyGenerator`] turns the text into a [`GeneratedReply`]
//! - an [`OutboundFormatter`] encodes the reply into a [`GatewayRequest`]
//! - an [`SmsGateway`] submits it, and the formatter maps the answer to a [`DeliveryOutcome`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_core::{GeneratedReply, OutboundFormatter, SmsGateway};
//!
//! let request = formatter.format("+27001", &GeneratedReply::new("Hi there"));
//! let reply = gateway.submit(request).await?;
//! formatter.interpret(reply).into_result()?;
//! ```

pub mod xml;

use std::fmt;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Longest message body the gateway accepts.
pub const MAX_SMS_CHARS: usize = 480;

/// Reply text relayed when the completion provider gives nothing usable.
pub const FALLBACK_REPLY: &str = "Error in processing response.";

/// Gateway action reported for an accepted message.
pub const ENQUEUED: &str = "enqueued";

/// Errors that can occur while relaying a callback
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Missing or malformed inbound fields
    #[error("{0}")]
    Validation(String),
    /// Completion provider unreachable or returned an error
    #[error("upstream generation error: {0}")]
    UpstreamGeneration(String),
    /// SMS gateway answered with a non-200 status
    #[error("gateway transport error: HTTP {status}")]
    GatewayTransport { status: u16 },
    /// SMS gateway answered 200 but rejected the message
    #[error("{0}")]
    GatewayApplication(String),
    /// Anything else
    #[error("{0}")]
    Internal(String),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub const OK: HttpStatus = HttpStatus(200);
    pub const BAD_REQUEST: HttpStatus = HttpStatus(400);
    pub const INTERNAL_SERVER_ERROR: HttpStatus = HttpStatus(500);
    pub const BAD_GATEWAY: HttpStatus = HttpStatus(502);

    pub fn from_u16(code: u16) -> Self {
        HttpStatus(code)
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

/// Generic response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    pub fn json(status: HttpStatus, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string()),
            content_type: "application/json".to_string(),
        }
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    pub fn html(body: &str) -> Self {
        Self {
            status: HttpStatus::OK,
            body: body.to_string(),
            content_type: "text/html; charset=utf-8".to_string(),
        }
    }
}

/// Returns the first `max` characters of `text`.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fresh user reference for correlating a send with later delivery reports.
pub fn new_userref() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalized inbound message, whatever callback shape it arrived in.
#[derive(Debug, Clone, Serialize)]
pub struct InboundMessage {
    pub from: String,
    pub to: Option<String>,
    pub text: String,
    /// Timestamp as reported by the gateway, unparsed.
    pub timestamp: Option<String>,
    #[serde(skip)]
    pub received_at: OffsetDateTime,
}

impl InboundMessage {
    pub fn new(from: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
            text: text.into(),
            timestamp: None,
            received_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_to(mut self, to: Option<String>) -> Self {
        self.to = to;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Text produced by the reply generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub text: String,
    /// Set when the text is [`FALLBACK_REPLY`] rather than model output.
    pub degraded: bool,
}

impl GeneratedReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            degraded: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_REPLY.to_string(),
            degraded: true,
        }
    }

    /// The text as it may be transmitted.
    pub fn truncated(&self) -> &str {
        truncate_chars(&self.text, MAX_SMS_CHARS)
    }
}

/// Outbound SMS, ready to be encoded for a gateway shape.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundSmsRequest {
    pub to: String,
    pub message: String,
    pub ems: bool,
    pub userref: String,
}

impl OutboundSmsRequest {
    pub fn new(to: impl Into<String>, reply: &GeneratedReply, ems: bool) -> Self {
        Self {
            to: to.into(),
            message: reply.truncated().to_string(),
            ems,
            userref: new_userref(),
        }
    }
}

/// Gateway account credentials.
///
/// `Debug` never prints the secret values.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Base64 of `username:password`.
    pub fn encoded(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }

    /// Value for an `Authorization` header.
    pub fn basic_auth_header(&self) -> String {
        format!("Basic {}", self.encoded())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMethod {
    Get,
    Post,
}

/// Lightweight header representation to avoid tying the core to any HTTP client.
pub type Headers = Vec<(String, String)>;

/// Transport-neutral request to the SMS gateway.
#[derive(Clone)]
pub struct GatewayRequest {
    pub method: GatewayMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Headers,
    pub body: Option<String>,
    pub userref: String,
}

impl GatewayRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for GatewayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("GatewayRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("body", &self.body)
            .field("userref", &self.userref)
            .finish()
    }
}

/// Raw answer from the SMS gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: String,
}

/// Normalized result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Enqueued { raw: String },
    /// HTTP 200, but the gateway refused the message.
    Rejected { error: String, raw: String },
    /// Non-200 HTTP status.
    TransportFailed { status: u16, raw: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Enqueued { .. })
    }

    pub fn into_result(self) -> Result<(), RelayError> {
        match self {
            DeliveryOutcome::Enqueued { .. } => Ok(()),
            DeliveryOutcome::Rejected { error, .. } => Err(RelayError::GatewayApplication(error)),
            DeliveryOutcome::TransportFailed { status, .. } => {
                Err(RelayError::GatewayTransport { status })
            }
        }
    }
}

/// Delivery status callback from the gateway.
///
/// Fields arrive as the gateway's `FN`, `TN`, `SC`, `ST`, `RF` and `TS` query keys.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DeliveryReport {
    pub from: Option<String>,
    pub to: Option<String>,
    pub success_code: Option<String>,
    pub status_code: Option<String>,
    pub reference: Option<String>,
    pub timestamp: Option<String>,
}

impl DeliveryReport {
    /// Query names of absent or empty fields.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("FN", &self.from),
            ("TN", &self.to),
            ("SC", &self.success_code),
            ("ST", &self.status_code),
            ("RF", &self.reference),
            ("TS", &self.timestamp),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }
}

/// Turns inbound text into reply text.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Returns `Err(RelayError::UpstreamGeneration)` when the provider could not be
    /// reached or answered with an error; a reachable provider with an unusable
    /// payload yields [`GeneratedReply::fallback`].
    async fn generate(&self, text: &str) -> Result<GeneratedReply, RelayError>;
}

/// Encodes replies for one gateway call shape and reads that shape's answers.
pub trait OutboundFormatter: Send + Sync {
    /// Stable shape key, e.g. "xml" or "json".
    fn shape(&self) -> &'static str;

    fn format(&self, recipient: &str, reply: &GeneratedReply) -> GatewayRequest;

    fn interpret(&self, reply: GatewayReply) -> DeliveryOutcome;
}

/// Sends a built request to the SMS gateway, once.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn submit(&self, request: GatewayRequest) -> Result<GatewayReply, RelayError>;
}
