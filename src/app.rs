//! Wires configuration into the relay pipeline and its HTTP routes.

use std::sync::Arc;

use axum::Router;
use relay_core::RelayError;
use relay_gateway::{HttpGateway, formatter_for};
use relay_openai::OpenAiGenerator;
use relay_web_axum::{AppState, router};
use relay_web_generic::{DeliveryReportPolicy, RelayProcessor};

use crate::config::AppConfig;

pub fn build_processor(config: &AppConfig) -> Result<RelayProcessor, RelayError> {
    let generator = OpenAiGenerator::new(config.completion.settings())?;
    let formatter = formatter_for(
        config.gateway.shape,
        &config.gateway.base_url,
        config.gateway.credentials(),
        config.gateway.ems,
    );
    let gateway = HttpGateway::new(config.gateway.timeout())?;

    Ok(
        RelayProcessor::new(Arc::new(generator), formatter, Arc::new(gateway)).with_report_policy(
            DeliveryReportPolicy {
                require_all_fields: config.delivery_report.require_all_fields,
            },
        ),
    )
}

pub fn build_app(config: &AppConfig) -> Result<Router, RelayError> {
    let processor = build_processor(config)?;
    Ok(router(AppState { processor }))
}
