use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use bytes::Bytes;
use relay_core::WebhookResponse;
use relay_web_generic::{InboundShape, RelayProcessor, ResponseConverter};

const LANDING_PAGE: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub processor: RelayProcessor,
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = axum::response::Response;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            [(header::CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// All relay routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/health", get(health))
        .route("/process_shortcode", get(process_shortcode))
        .route(
            "/process_incoming_message",
            get(process_incoming_message_query).post(process_incoming_message_xml),
        )
        .route("/delivery_report", get(delivery_report))
        .with_state(state)
}

/// GET /
pub async fn landing() -> impl IntoResponse {
    AxumResponseConverter::from_webhook_response(WebhookResponse::html(LANDING_PAGE))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /process_shortcode?from=..&incoming_message=..
pub async fn process_shortcode(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let response = state
        .processor
        .process_inbound(InboundShape::ShortCode, query.as_deref().unwrap_or_default(), &[])
        .await;
    AxumResponseConverter::from_webhook_response(response)
}

/// GET /process_incoming_message?FN=..&TN=..&MS=..&TS=..
pub async fn process_incoming_message_query(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let response = state
        .processor
        .process_inbound(
            InboundShape::GatewayQuery,
            query.as_deref().unwrap_or_default(),
            &[],
        )
        .await;
    AxumResponseConverter::from_webhook_response(response)
}

/// POST /process_incoming_message with an XML body
pub async fn process_incoming_message_xml(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    let response = state
        .processor
        .process_inbound(InboundShape::XmlBody, "", &body)
        .await;
    AxumResponseConverter::from_webhook_response(response)
}

/// GET /delivery_report?FN=..&TN=..&SC=..&ST=..&RF=..&TS=..
pub async fn delivery_report(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let response = state
        .processor
        .process_delivery_report(query.as_deref().unwrap_or_default());
    AxumResponseConverter::from_webhook_response(response)
}
