use relay_core::{
    xml, Credentials, DeliveryOutcome, GatewayMethod, GatewayReply, GatewayRequest,
    GeneratedReply, OutboundFormatter, OutboundSmsRequest, ENQUEUED,
};

use crate::{endpoint, rejection_text, UNRECOGNISED_RESPONSE};

/// Shape A: query-string GET, XML answer.
#[derive(Debug, Clone)]
pub struct XmlQueryFormatter {
    url: String,
    credentials: Credentials,
    ems: bool,
}

impl XmlQueryFormatter {
    pub fn new(base_url: &str, credentials: Credentials, ems: bool) -> Self {
        Self {
            url: endpoint(base_url, "xml/send/"),
            credentials,
            ems,
        }
    }
}

impl OutboundFormatter for XmlQueryFormatter {
    fn shape(&self) -> &'static str {
        "xml"
    }

    fn format(&self, recipient: &str, reply: &GeneratedReply) -> GatewayRequest {
        let sms = OutboundSmsRequest::new(recipient, reply, self.ems);
        GatewayRequest {
            method: GatewayMethod::Get,
            url: self.url.clone(),
            query: vec![
                ("number".to_string(), sms.to),
                ("message".to_string(), sms.message),
                ("ems".to_string(), if sms.ems { "1" } else { "0" }.to_string()),
                ("userref".to_string(), sms.userref.clone()),
            ],
            headers: vec![(
                "authorization".to_string(),
                self.credentials.basic_auth_header(),
            )],
            body: None,
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

        // <action>enqueued</action> on success, <error> otherwise
        let fields = match xml::element_texts(reply.body.as_bytes(), &["action", "error"]) {
            Ok(fields) => fields,
            Err(_) => {
                return DeliveryOutcome::Rejected {
                    error: UNRECOGNISED_RESPONSE.to_string(),
                    raw: reply.body,
                }
            }
        };

        let field = |name: &str| fields.get(name).map(|value| value.trim());
        match field("action") {
            Some(ENQUEUED) => DeliveryOutcome::Enqueued { raw: reply.body },
            action => DeliveryOutcome::Rejected {
                error: rejection_text(field("error"), action),
                raw: reply.body,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> XmlQueryFormatter {
        XmlQueryFormatter::new("https://gw.example", Credentials::new("user", "pass"), true)
    }

    fn ok(body: &str) -> GatewayReply {
        GatewayReply {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn builds_get_with_query_and_basic_auth() {
        let request = formatter().format("+27001", &GeneratedReply::new("Hi there"));
        assert_eq!(request.method, GatewayMethod::Get);
        assert_eq!(request.url, "https://gw.example/xml/send/");
        assert_eq!(request.query_param("number"), Some("+27001"));
        assert_eq!(request.query_param("message"), Some("Hi there"));
        assert_eq!(request.query_param("ems"), Some("1"));
        assert_eq!(request.query_param("userref"), Some(request.userref.as_str()));
        assert_eq!(request.header("authorization"), Some("Basic dXNlcjpwYXNz"));
        assert!(request.body.is_none());
    }

    #[test]
    fn message_is_hard_truncated() {
        let text = format!("{} tail words", "w".repeat(478));
        let request = formatter().format("+27001", &GeneratedReply::new(text.clone()));
        let sent = request.query_param("message").unwrap();
        assert_eq!(sent.chars().count(), 480);
        assert!(text.starts_with(sent));
    }

    #[test]
    fn ems_flag_can_be_disabled() {
        let formatter = XmlQueryFormatter::new("https://gw", Credentials::new("u", "p"), false);
        let request = formatter.format("+27001", &GeneratedReply::new("x"));
        assert_eq!(request.query_param("ems"), Some("0"));
    }

    #[test]
    fn interprets_enqueued() {
        let outcome = formatter().interpret(ok("<sms><action>enqueued</action></sms>"));
        assert!(outcome.is_success());
    }

    #[test]
    fn interprets_pretty_printed_answer() {
        let outcome = formatter().interpret(ok("<sms>\n  <action>\n    enqueued\n  </action>\n</sms>\n"));
        assert!(outcome.is_success());

        match formatter().interpret(ok("<sms>\n  <error> No credits </error>\n</sms>")) {
            DeliveryOutcome::Rejected { error, .. } => assert_eq!(error, "No credits"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn interprets_gateway_error_text() {
        let outcome = formatter().interpret(ok(
            "<sms><action>failed</action><error>Insufficient credits</error></sms>",
        ));
        assert_eq!(
            outcome,
            DeliveryOutcome::Rejected {
                error: "Insufficient credits".into(),
                raw: "<sms><action>failed</action><error>Insufficient credits</error></sms>".into(),
            }
        );
    }

    #[test]
    fn interprets_action_without_error_text() {
        match formatter().interpret(ok("<sms><action>rejected</action></sms>")) {
            DeliveryOutcome::Rejected { error, .. } => assert_eq!(error, "gateway action: rejected"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unreadable_body_is_rejected() {
        match formatter().interpret(ok("<sms><action>enqueued")) {
            DeliveryOutcome::Rejected { error, .. } => assert_eq!(error, UNRECOGNISED_RESPONSE),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn non_200_is_transport_failure() {
        let outcome = formatter().interpret(GatewayReply {
            status: 503,
            body: "unavailable".into(),
        });
        assert!(matches!(outcome, DeliveryOutcome::TransportFailed { status: 503, .. }));
    }
}
