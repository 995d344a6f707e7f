//! # SMS Relay
//!
//! Webhook relay between an SMS gateway and a chat-completion API.
//!
//! ## Features
//!
//! - **Inbound callbacks**: short-code queries, gateway queries and XML bodies
//! - **Generated replies**: OpenAI-compatible chat completions, capped at 480 characters
//! - **Two gateway shapes**: XML/query-string GET or JSON POST, chosen by configuration
//! - **Delivery reports**: logged, with configurable field enforcement
//! - **Configuration**: layered files plus environment variables
//! - **Observability**: structured logging via `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smsrelay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     config.validate()?;
//!     let app = smsrelay::app::build_app(&config)?;
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:81").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use smsrelay::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("Gateway shape: {}", config.gateway.shape);
//! ```

pub mod app;
pub mod config;
pub mod telemetry;

pub use config::*;

/// Common imports for SMS Relay usage
pub mod prelude {
    pub use crate::config::{
        AppConfig, CompletionConfig, DeliveryReportConfig, GatewayConfig, LoggingConfig,
        ServerConfig,
    };
    pub use relay_core::*;
    pub use relay_gateway::GatewayShape;
    pub use relay_web_generic::{InboundShape, RelayProcessor};
}
