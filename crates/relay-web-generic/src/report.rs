//! Delivery report receiver. Reports are logged, nothing else.

use relay_core::{DeliveryReport, HttpStatus, WebhookResponse};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::query::QueryParams;

/// Whether a report must carry all six fields to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReportPolicy {
    pub require_all_fields: bool,
}

impl Default for DeliveryReportPolicy {
    fn default() -> Self {
        Self {
            require_all_fields: true,
        }
    }
}

pub(crate) fn receive(policy: DeliveryReportPolicy, query: &str) -> WebhookResponse {
    let report = match QueryParams::parse(query) {
        Ok(params) => DeliveryReport {
            from: params.first("FN"),
            to: params.first("TN"),
            success_code: params.first("SC"),
            status_code: params.first("ST"),
            reference: params.first("RF"),
            timestamp: params.first("TS"),
        },
        Err(e) => {
            warn!(error = %e, "undecodable delivery report query");
            return WebhookResponse::error(HttpStatus::BAD_REQUEST, "Malformed query string");
        }
    };

    let missing = report.missing_fields();
    if policy.require_all_fields && !missing.is_empty() {
        warn!(missing = ?missing, "delivery report rejected");
        return WebhookResponse::error(HttpStatus::BAD_REQUEST, "Missing parameters");
    }

    match log_report(&report, &missing) {
        Ok(()) => WebhookResponse::json(
            HttpStatus::OK,
            &json!({ "message": "Delivery report received" }),
        ),
        Err(e) => {
            error!(error = %e, "error processing delivery report");
            WebhookResponse::error(
                HttpStatus::INTERNAL_SERVER_ERROR,
                "Error processing delivery report",
            )
        }
    }
}

fn log_report(report: &DeliveryReport, missing: &[&str]) -> Result<(), String> {
    let received_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| e.to_string())?;
    let rendered = serde_json::to_string(report).map_err(|e| e.to_string())?;

    info!(
        from = report.from.as_deref().unwrap_or_default(),
        to = report.to.as_deref().unwrap_or_default(),
        success_code = report.success_code.as_deref().unwrap_or_default(),
        status_code = report.status_code.as_deref().unwrap_or_default(),
        reference = report.reference.as_deref().unwrap_or_default(),
        timestamp = report.timestamp.as_deref().unwrap_or_default(),
        partial = !missing.is_empty(),
        received_at = %received_at,
        report = %rendered,
        "Delivery report received"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "FN=27001&TN=31337&SC=1&ST=DELIVRD&RF=abc123&TS=20240501100000";

    fn body(response: &WebhookResponse) -> serde_json::Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn accepts_complete_report() {
        let response = receive(DeliveryReportPolicy::default(), FULL);
        assert_eq!(response.status, HttpStatus::OK);
        assert_eq!(body(&response)["message"], "Delivery report received");
    }

    #[test]
    fn strict_policy_rejects_partial_report() {
        let response = receive(DeliveryReportPolicy::default(), "FN=27001&TN=31337");
        assert_eq!(response.status, HttpStatus::BAD_REQUEST);
        assert_eq!(body(&response)["error"], "Missing parameters");
    }

    #[test]
    fn relaxed_policy_accepts_partial_report() {
        let policy = DeliveryReportPolicy {
            require_all_fields: false,
        };
        let response = receive(policy, "FN=27001");
        assert_eq!(response.status, HttpStatus::OK);

        let response = receive(policy, "");
        assert_eq!(response.status, HttpStatus::OK);
    }

    #[test]
    fn repeated_keys_keep_first_value() {
        let response = receive(DeliveryReportPolicy::default(), &format!("{}&FN=99999", FULL));
        assert_eq!(response.status, HttpStatus::OK);
        assert_eq!(body(&response)["message"], "Delivery report received");
    }
}
