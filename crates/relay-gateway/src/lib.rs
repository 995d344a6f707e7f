//! # Relay Gateway
//!
//! Outbound side of the relay: encodes replies for the SMS gateway and submits them.
//!
//! The gateway accepts sends in two shapes, each an [`OutboundFormatter`]:
//! - [`XmlQueryFormatter`]: `GET /xml/send/?number=..&message=..`, XML answer
//! - [`JsonRestFormatter`]: `POST /json/send/` with a JSON body, JSON answer
//!
//! [`HttpGateway`] performs the single HTTP attempt for either shape.
//!
//! ## Example
//!
//! ```rust,ignore
//! use relay_gateway::{formatter_for, GatewayShape, HttpGateway};
//!
//! let formatter = formatter_for(GatewayShape::Xml, base_url, credentials, true);
//! let gateway = HttpGateway::new(Duration::from_secs(5))?;
//! ```

mod http;
mod json_rest;
mod xml_query;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use relay_core::{Credentials, OutboundFormatter};
use serde::{Deserialize, Serialize};

pub use http::HttpGateway;
pub use json_rest::JsonRestFormatter;
pub use xml_query::XmlQueryFormatter;

pub const DEFAULT_BASE_URL: &str = "https://qa-sms.umsg.co.za";

/// Error text used when a 200 answer cannot be read.
pub const UNRECOGNISED_RESPONSE: &str = "Unrecognised gateway response";

/// Named gateway call shape, chosen by deployment configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayShape {
    #[default]
    Xml,
    Json,
}

impl GatewayShape {
    pub fn as_str(self) -> &'static str {
        match self {
            GatewayShape::Xml => "xml",
            GatewayShape::Json => "json",
        }
    }
}

impl fmt::Display for GatewayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(GatewayShape::Xml),
            "json" => Ok(GatewayShape::Json),
            other => Err(format!("unknown gateway shape: {}", other)),
        }
    }
}

/// Builds the formatter for `shape`.
pub fn formatter_for(
    shape: GatewayShape,
    base_url: &str,
    credentials: Credentials,
    ems: bool,
) -> Arc<dyn OutboundFormatter> {
    match shape {
        GatewayShape::Xml => Arc::new(XmlQueryFormatter::new(base_url, credentials, ems)),
        GatewayShape::Json => Arc::new(JsonRestFormatter::new(base_url, credentials, ems)),
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Error text for a refused send: the gateway's own text when it gave one.
fn rejection_text(error: Option<&str>, action: Option<&str>) -> String {
    match (error, action) {
        (Some(error), _) if !error.is_empty() => error.to_string(),
        (_, Some(action)) if !action.is_empty() => format!("gateway action: {}", action),
        _ => UNRECOGNISED_RESPONSE.to_string(),
    }
}
