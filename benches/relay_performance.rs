use std::sync::Arc;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relay_core::*;
use relay_gateway::{GatewayShape, formatter_for};
use relay_web_generic::{InboundShape, RelayProcessor, parse_inbound};
use tokio::runtime::Runtime;

struct EchoGenerator;

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, text: &str) -> Result<GeneratedReply, RelayError> {
        Ok(GeneratedReply::new(text))
    }
}

struct EnqueuingGateway;

#[async_trait]
impl SmsGateway for EnqueuingGateway {
    async fn submit(&self, _request: GatewayRequest) -> Result<GatewayReply, RelayError> {
        Ok(GatewayReply {
            status: 200,
            body: "<sms><action>enqueued</action></sms>".to_string(),
        })
    }
}

fn benchmark_inbound_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound_parsing");

    for size in [16, 160, 1600] {
        let text = "x".repeat(size);
        let query = format!("FN=27001&TN=31337&MS={}&TS=20240501100000", text);
        let xml = format!(
            "<message><sender>27001</sender><content>{}</content></message>",
            text
        );

        group.bench_with_input(BenchmarkId::new("gateway_query", size), &query, |b, query| {
            b.iter(|| black_box(parse_inbound(InboundShape::GatewayQuery, query, b"")))
        });
        group.bench_with_input(BenchmarkId::new("xml_body", size), &xml, |b, xml| {
            b.iter(|| black_box(parse_inbound(InboundShape::XmlBody, "", xml.as_bytes())))
        });
    }
    group.finish();
}

fn benchmark_outbound_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("outbound_formatting");
    let reply = GeneratedReply::new("y".repeat(900));

    for shape in [GatewayShape::Xml, GatewayShape::Json] {
        let formatter = formatter_for(
            shape,
            "https://gw.example",
            Credentials::new("user", "pass"),
            true,
        );
        let answer = match shape {
            GatewayShape::Xml => "<sms><action>enqueued</action></sms>",
            GatewayShape::Json => r#"{"action":"enqueued"}"#,
        };

        group.bench_function(BenchmarkId::new("format", shape), |b| {
            b.iter(|| black_box(formatter.format("27001", &reply)))
        });
        group.bench_function(BenchmarkId::new("interpret", shape), |b| {
            b.iter(|| {
                black_box(formatter.interpret(GatewayReply {
                    status: 200,
                    body: answer.to_string(),
                }))
            })
        });
    }
    group.finish();
}

fn benchmark_pipeline(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let processor = RelayProcessor::new(
        Arc::new(EchoGenerator),
        formatter_for(
            GatewayShape::Xml,
            "https://gw.example",
            Credentials::new("user", "pass"),
            true,
        ),
        Arc::new(EnqueuingGateway),
    );

    c.bench_function("process_inbound", |b| {
        b.iter(|| {
            rt.block_on(processor.process_inbound(
                InboundShape::ShortCode,
                "from=27001&incoming_message=Hello+there",
                b"",
            ))
        })
    });
}

criterion_group!(
    benches,
    benchmark_inbound_parsing,
    benchmark_outbound_formatting,
    benchmark_pipeline
);
criterion_main!(benches);
