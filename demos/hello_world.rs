//! Hello world with the console exporters enabled.
//!
//! Root spans are dropped by the distro's sampler, so the demo continues a
//! trace an upstream caller would have propagated.
//!
//! Run with: cargo run --example hello_world

use opentelemetry::baggage::BaggageExt;
use opentelemetry::trace::{TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue, global};
use std::collections::HashMap;
use tgt_opentelemetry::{OptionsBuilder, Protocol, SdkError};

fn main() -> Result<(), SdkError> {
    // Debug prints exported traces and metrics to stdout.
    let _guard = OptionsBuilder::new()
        .debug(true)
        .service_name("otel-rust-example")
        .exporter_protocol(Protocol::HttpProtobuf)
        .build()?;

    let incoming = HashMap::from([(
        "traceparent".to_string(),
        "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".to_string(),
    )]);
    let parent = global::get_text_map_propagator(|propagator| propagator.extract(&incoming));
    let _parent = parent.attach();

    println!("{}", hello_world());
    Ok(())
}

fn hello_world() -> &'static str {
    let tracer = global::tracer("hello_world_tracer");
    let sheep = global::meter("hello_world_meter").u64_counter("sheep").build();

    let _baggage = Context::current()
        .with_baggage(vec![KeyValue::new("baggy", "important_value")])
        .attach();

    tracer.in_span("hello", |_cx| {
        let _children = Context::current()
            .with_baggage(vec![KeyValue::new(
                "for_the_children",
                "another_important_value",
            )])
            .attach();

        tracer.in_span("world", |cx| {
            cx.span()
                .set_attribute(KeyValue::new("message", "hello world!"));
            tracing::info!("Hello World");
        });
    });

    sheep.add(1, &[KeyValue::new("app.route", "/")]);
    "Hello World"
}
