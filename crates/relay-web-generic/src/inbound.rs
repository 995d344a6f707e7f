//! Inbound adapter: turns the gateway's callback shapes into an [`InboundMessage`].

use relay_core::{xml, InboundMessage, RelayError};

use crate::query::QueryParams;

pub const MISSING_PARAMETERS: &str = "Some parameters are missing!";

/// How an inbound SMS callback carries its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundShape {
    /// `?from=..&incoming_message=..`
    ShortCode,
    /// `?FN=..&TN=..&MS=..&TS=..`
    GatewayQuery,
    /// `<message><sender>..</sender><content>..</content></message>`
    XmlBody,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn decode_query(query: &str) -> Result<QueryParams, RelayError> {
    QueryParams::parse(query)
        .map_err(|e| RelayError::Validation(format!("malformed query string: {}", e)))
}

fn required(from: Option<String>, text: Option<String>) -> Result<(String, String), RelayError> {
    match (present(from), present(text)) {
        (Some(from), Some(text)) => Ok((from, text)),
        _ => Err(RelayError::Validation(MISSING_PARAMETERS.to_string())),
    }
}

/// Extracts sender and text from a callback. No side effects.
pub fn parse_inbound(
    shape: InboundShape,
    query: &str,
    body: &[u8],
) -> Result<InboundMessage, RelayError> {
    match shape {
        InboundShape::ShortCode => {
            let params = decode_query(query)?;
            let (from, text) = required(params.first("from"), params.first("incoming_message"))?;
            Ok(InboundMessage::new(from, text))
        }
        InboundShape::GatewayQuery => {
            let params = decode_query(query)?;
            let (from, text) = required(params.first("FN"), params.first("MS"))?;
            Ok(InboundMessage::new(from, text)
                .with_to(present(params.first("TN")))
                .with_timestamp(present(params.first("TS"))))
        }
        InboundShape::XmlBody => {
            let mut fields = xml::element_texts(body, &["sender", "content"])
                .map_err(|e| RelayError::Validation(e.to_string()))?;
            let (from, text) = required(fields.remove("sender"), fields.remove("content"))?;
            Ok(InboundMessage::new(from, text))
        }
    }
}
