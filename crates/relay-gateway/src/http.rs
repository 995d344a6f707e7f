use std::time::Duration;

use async_trait::async_trait;
use relay_core::{GatewayMethod, GatewayReply, GatewayRequest, RelayError, SmsGateway};
use tracing::debug;

/// Delivery submitter: one HTTP attempt per request, bounded by a timeout.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Internal(format!("gateway client: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl SmsGateway for HttpGateway {
    async fn submit(&self, request: GatewayRequest) -> Result<GatewayReply, RelayError> {
        let mut builder = match request.method {
            GatewayMethod::Get => self.http.get(&request.url),
            GatewayMethod::Post => self.http.post(&request.url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        debug!(url = %request.url, userref = %request.userref, "submitting SMS to gateway");
        let res = builder.send().await.map_err(|e| {
            RelayError::Internal(format!("gateway request failed: {}", e.without_url()))
        })?;

        let status = res.status().as_u16();
        let body = if res.status().is_success() {
            res.text().await.map_err(|e| {
                RelayError::Internal(format!("gateway response unreadable: {}", e.without_url()))
            })?
        } else {
            res.text().await.unwrap_or_default()
        };
        debug!(status, userref = %request.userref, "gateway answered");

        Ok(GatewayReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonRestFormatter, XmlQueryFormatter};
    use relay_core::{Credentials, GeneratedReply, OutboundFormatter};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway() -> HttpGateway {
        HttpGateway::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn submits_xml_shape_as_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/xml/send/"))
            .and(query_param("number", "+27001"))
            .and(query_param("message", "Hi there, friend"))
            .and(query_param("ems", "1"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<sms><action>enqueued</action></sms>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let formatter = XmlQueryFormatter::new(&server.uri(), Credentials::new("user", "pass"), true);
        let request = formatter.format("+27001", &GeneratedReply::new("Hi there, friend"));
        let reply = gateway().submit(request).await.unwrap();

        assert_eq!(reply.status, 200);
        assert!(formatter.interpret(reply).is_success());
    }

    #[tokio::test]
    async fn submits_json_shape_as_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/json/send/"))
            .and(header("content-type", "application/json"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .and(body_partial_json(json!({ "to": "+27001", "message": "Hi", "ems": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "action": "enqueued" })))
            .expect(1)
            .mount(&server)
            .await;

        let formatter =
            JsonRestFormatter::new(&server.uri(), Credentials::new("user", "pass"), true);
        let request = formatter.format("+27001", &GeneratedReply::new("Hi"));
        let reply = gateway().submit(request).await.unwrap();
        assert!(formatter.interpret(reply).is_success());
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let formatter = XmlQueryFormatter::new(&server.uri(), Credentials::new("u", "p"), true);
        let reply = gateway()
            .submit(formatter.format("+27001", &GeneratedReply::new("x")))
            .await
            .unwrap();
        assert_eq!(reply.status, 503);
        assert_eq!(reply.body, "maintenance");
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<sms><action>enqueued</action></sms>")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let formatter = XmlQueryFormatter::new(&server.uri(), Credentials::new("u", "p"), true);
        let err = HttpGateway::new(Duration::from_millis(50))
            .unwrap()
            .submit(formatter.format("+27001", &GeneratedReply::new("x")))
            .await
            .unwrap_err();
        match err {
            RelayError::Internal(message) => {
                assert!(message.starts_with("gateway request failed"));
                assert!(!message.contains(&server.uri()));
                assert!(!message.contains("/xml/send/"));
                assert!(!message.contains("userref"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_gateway_is_internal_error() {
        let formatter =
            XmlQueryFormatter::new("http://127.0.0.1:1", Credentials::new("u", "p"), true);
        let err = gateway()
            .submit(formatter.format("+27001", &GeneratedReply::new("x")))
            .await
            .unwrap_err();
        match err {
            RelayError::Internal(message) => assert!(!message.contains("message=x")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
