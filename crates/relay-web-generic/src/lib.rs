pub mod inbound;
mod query;
pub mod report;

use std::sync::Arc;

use relay_core::{
    GeneratedReply, HttpStatus, OutboundFormatter, RelayError, ReplyGenerator, SmsGateway,
    WebhookResponse,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

pub use inbound::{parse_inbound, InboundShape};
pub use report::DeliveryReportPolicy;

/// Framework-agnostic processor that runs the relay pipeline for one callback
#[derive(Clone)]
pub struct RelayProcessor {
    generator: Arc<dyn ReplyGenerator>,
    formatter: Arc<dyn OutboundFormatter>,
    gateway: Arc<dyn SmsGateway>,
    reports: DeliveryReportPolicy,
}

impl RelayProcessor {
    pub fn new(
        generator: Arc<dyn ReplyGenerator>,
        formatter: Arc<dyn OutboundFormatter>,
        gateway: Arc<dyn SmsGateway>,
    ) -> Self {
        Self {
            generator,
            formatter,
            gateway,
            reports: DeliveryReportPolicy::default(),
        }
    }

    pub fn with_report_policy(mut self, policy: DeliveryReportPolicy) -> Self {
        self.reports = policy;
        self
    }

    /// Process an inbound SMS callback and return a framework-agnostic response
    #[tracing::instrument(name = "relay", skip_all, fields(shape = ?shape, outbound = self.formatter.shape()))]
    pub async fn process_inbound(
        &self,
        shape: InboundShape,
        query: &str,
        body: &[u8],
    ) -> WebhookResponse {
        match self.relay(shape, query, body).await {
            Ok(()) => WebhookResponse::json(
                HttpStatus::OK,
                &json!({ "success": true, "message": "SMS enqueued for delivery" }),
            ),
            Err(e) => self.error_to_response(e),
        }
    }

    /// Log a delivery status callback
    pub fn process_delivery_report(&self, query: &str) -> WebhookResponse {
        report::receive(self.reports, query)
    }

    async fn relay(&self, shape: InboundShape, query: &str, body: &[u8]) -> Result<(), RelayError> {
        let inbound = parse_inbound(shape, query, body)?;
        debug!(from = %inbound.from, chars = inbound.text.chars().count(), "inbound message");

        let reply = self.generate_reply(&inbound.text).await;

        let request = self.formatter.format(&inbound.from, &reply);
        let userref = request.userref.clone();
        let answer = self.gateway.submit(request).await?;
        let outcome = self.formatter.interpret(answer);
        info!(
            userref = %userref,
            enqueued = outcome.is_success(),
            degraded = reply.degraded,
            "reply submitted to gateway"
        );
        outcome.into_result()
    }

    /// A failed generation still produces a reply: the fallback text is relayed.
    async fn generate_reply(&self, text: &str) -> GeneratedReply {
        match self.generator.generate(text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "reply generation failed, relaying fallback text");
                GeneratedReply::fallback()
            }
        }
    }

    fn error_to_response(&self, error: RelayError) -> WebhookResponse {
        match error {
            RelayError::Validation(msg) => WebhookResponse::error(HttpStatus::BAD_REQUEST, &msg),
            RelayError::UpstreamGeneration(msg) => WebhookResponse::json(
                HttpStatus::BAD_GATEWAY,
                &json!({ "success": false, "error": msg }),
            ),
            RelayError::GatewayTransport { status } => {
                warn!(status, "gateway refused the request");
                WebhookResponse::json(
                    HttpStatus::from_u16(status),
                    &json!({ "success": false, "error": "Failed to send SMS" }),
                )
            }
            RelayError::GatewayApplication(msg) => {
                warn!(error = %msg, "gateway rejected the message");
                WebhookResponse::json(HttpStatus::OK, &json!({ "success": false, "error": msg }))
            }
            RelayError::Internal(msg) => {
                error!(error = %msg, "relay failed");
                WebhookResponse::error(HttpStatus::INTERNAL_SERVER_ERROR, &msg)
            }
        }
    }
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}
