use relay_core::{
    Credentials, DeliveryOutcome, GatewayMethod, GatewayReply, GatewayRequest, GeneratedReply,
    OutboundFormatter, OutboundSmsRequest, ENQUEUED,
};
use serde_json::{json, Value};

use crate::{endpoint, rejection_text, UNRECOGNISED_RESPONSE};

const USER_AGENT: &str = concat!("smsrelay/", env!("CARGO_PKG_VERSION"));

/// Shape B: JSON POST, JSON answer.
#[derive(Debug, Clone)]
pub struct JsonRestFormatter {
    url: String,
    credentials: Credentials,
    ems: bool,
}

impl JsonRestFormatter {
    pub fn new(base_url: &str, credentials: Credentials, ems: bool) -> Self {
        Self {
            url: endpoint(base_url, "json/send/"),
            credentials,
            ems,
        }
    }
}

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| value.get(*key).and_then(Value::as_str))
}

impl OutboundFormatter for JsonRestFormatter {
    fn shape(&self) -> &'static str {
        "json"
    }

    fn format(&self, recipient: &str, reply: &GeneratedReply) -> GatewayRequest {
        let sms = OutboundSmsRequest::new(recipient, reply, self.ems);
        let body = json!({
            "to": sms.to,
            "message": sms.message,
            "ems": u8::from(sms.ems),
            "userref": sms.userref,
        });
        GatewayRequest {
            method: GatewayMethod::Post,
            url: self.url.clone(),
            query: Vec::new(),
            headers: vec![
                (
                    "authorization".to_string(),
                    self.credentials.basic_auth_header(),
                ),
                ("content-type".to_string(), "application/json".to_string()),
                ("user-agent".to_string(), USER_AGENT.to_string()),
                ("accept".to_string(), "application/json".to_string()),
                ("accept-encoding".to_string(), "identity".to_string()),
                ("connection".to_string(), "keep-alive".to_string()),
            ],
            body: Some(body.to_string()),
            userref: sms.userref,
        }
    }

    fn interpret(&self, reply: GatewayReply) -> DeliveryOutcome {
        if reply.status != 200 {
            return DeliveryOutcome::TransportFailed {
                status: reply.status,
                raw: reply.body,
            };
        }

        let parsed: Value = match serde_json::from_str(&reply.body) {
            Ok(value) => value,
            Err(_) => {
                return DeliveryOutcome::Rejected {
                    error: UNRECOGNISED_RESPONSE.to_string(),
                    raw: reply.body,
                }
            }
        };

        match str_field(&parsed, &["action", "status"]) {
            Some(ENQUEUED) => DeliveryOutcome::Enqueued { raw: reply.body },
            action => DeliveryOutcome::Rejected {
                error: rejection_text(str_field(&parsed, &["error", "message"]), action),
                raw: reply.body,
            },
        }
    }
}
