//! OpenTelemetry provider lifecycle management.
//!
//! The [`OtelGuard`] owns the tracer and meter providers built from
//! [`ResolvedOptions`]. When dropped, it flushes pending data and shuts the
//! providers down.

use crate::config::Protocol;
use crate::env::Environment;
use crate::error::SdkError;
use crate::options::ResolvedOptions;
use crate::resource::create_resource;
use crate::sampler::configure_sampler;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const TARGET: &str = "otel_lifecycle";

/// Guard that manages OpenTelemetry provider lifecycle.
///
/// On drop, flushes pending telemetry and shuts down providers.
/// Use [`shutdown()`](Self::shutdown) for explicit error handling.
pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl OtelGuard {
    /// Builds and installs the providers described by `options`.
    ///
    /// This is typically called by [`OptionsBuilder::build`](super::OptionsBuilder::build)
    /// or [`configure_opentelemetry`](super::configure_opentelemetry).
    pub(crate) fn from_options(
        options: &ResolvedOptions,
        env: &impl Environment,
        init_tracing_subscriber: bool,
    ) -> Result<Self, SdkError> {
        let resource = create_resource(options, env);

        let tracer_provider = if options.traces_disabled() {
            None
        } else {
            Some(build_tracer_provider(options, resource.clone())?)
        };

        let meter_provider = if options.metrics_disabled() {
            None
        } else {
            Some(build_meter_provider(options, resource)?)
        };

        if let Some(ref provider) = tracer_provider {
            opentelemetry::global::set_tracer_provider(provider.clone());
        }
        if let Some(ref provider) = meter_provider {
            opentelemetry::global::set_meter_provider(provider.clone());
        }

        let propagator = TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]);
        opentelemetry::global::set_text_map_propagator(propagator);

        if init_tracing_subscriber {
            init_subscriber(&tracer_provider, options)?;
        }

        tracing::info!(
            target: TARGET,
            service_name = options.service_name(),
            deployment = %options.deployment(),
            "Configured OpenTelemetry using the Target distro"
        );
        tracing::debug!(target: TARGET, ?options, "Resolved options");

        if tracer_provider.is_some() {
            tracing::info!(target: TARGET, endpoint = options.traces_endpoint(), "started traces");
        } else {
            tracing::info!(target: TARGET, "traces disabled via TRACES_DISABLED environment variable");
        }
        if meter_provider.is_some() {
            tracing::info!(target: TARGET, endpoint = options.metrics_endpoint(), "started metrics");
        } else {
            tracing::info!(target: TARGET, "metrics disabled via METRICS_DISABLED environment variable");
        }

        Ok(Self {
            tracer_provider,
            meter_provider,
        })
    }

    /// Returns the tracer provider if configured.
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    /// Returns the meter provider if configured.
    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    /// Flushes all configured providers. Errors are logged but not returned.
    pub fn flush(&self) {
        if let Some(provider) = &self.tracer_provider
            && let Err(e) = provider.force_flush()
        {
            tracing::error!(target: TARGET, error = %e, "Failed to flush tracer provider");
        }

        if let Some(provider) = &self.meter_provider
            && let Err(e) = provider.force_flush()
        {
            tracing::error!(target: TARGET, error = %e, "Failed to flush meter provider");
        }
    }

    /// Shuts down all configured providers, returning the first error if any.
    pub fn shutdown(mut self) -> Result<(), SdkError> {
        if let Some(provider) = self.tracer_provider.take() {
            provider.force_flush().map_err(SdkError::Flush)?;
            provider.shutdown().map_err(SdkError::Shutdown)?;
        }

        if let Some(provider) = self.meter_provider.take() {
            provider.force_flush().map_err(SdkError::Flush)?;
            provider.shutdown().map_err(SdkError::Shutdown)?;
        }

        Ok(())
    }
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            let _ = provider.force_flush();
            if let Err(e) = provider.shutdown() {
                tracing::error!(target: TARGET, error = %e, "Failed to shut down tracer provider");
            }
        }

        if let Some(provider) = self.meter_provider.take() {
            let _ = provider.force_flush();
            if let Err(e) = provider.shutdown() {
                tracing::error!(target: TARGET, error = %e, "Failed to shut down meter provider");
            }
        }
    }
}

macro_rules! build_exporter {
    ($exporter_type:ident, $protocol:expr, $endpoint:expr, $error_variant:ident) => {{
        match $protocol {
            Protocol::HttpProtobuf => opentelemetry_otlp::$exporter_type::builder()
                .with_http()
                .with_endpoint($endpoint)
                .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
                .build()
                .map_err(SdkError::$error_variant)?,
        }
    }};
}

fn build_tracer_provider(
    options: &ResolvedOptions,
    resource: Resource,
) -> Result<SdkTracerProvider, SdkError> {
    let exporter = build_exporter!(
        SpanExporter,
        options.traces_protocol(),
        options.traces_endpoint(),
        TraceExporter
    );

    let mut builder = SdkTracerProvider::builder()
        .with_sampler(configure_sampler())
        .with_resource(resource)
        .with_span_processor(BatchSpanProcessor::builder(exporter).build());

    if options.debug() {
        builder = builder.with_simple_exporter(opentelemetry_stdout::SpanExporter::default());
    }

    Ok(builder.build())
}

fn build_meter_provider(
    options: &ResolvedOptions,
    resource: Resource,
) -> Result<SdkMeterProvider, SdkError> {
    let builder = SdkMeterProvider::builder().with_resource(resource);

    let builder = if options.debug() {
        builder.with_periodic_exporter(opentelemetry_stdout::MetricExporter::default())
    } else {
        let exporter = build_exporter!(
            MetricExporter,
            options.metrics_protocol(),
            options.metrics_endpoint(),
            MetricExporter
        );
        builder.with_periodic_exporter(exporter)
    };

    Ok(builder.build())
}

/// Level filter for the installed subscriber, taken from the resolved log level only.
fn build_filter(options: &ResolvedOptions) -> EnvFilter {
    EnvFilter::default().add_directive(options.log_level().level_filter().into())
}

fn init_subscriber(
    tracer_provider: &Option<SdkTracerProvider>,
    options: &ResolvedOptions,
) -> Result<(), SdkError> {
    let filter = build_filter(options);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .without_time();

    let registry = tracing_subscriber::registry().with(filter).with(fmt_layer);

    match tracer_provider {
        Some(tp) => {
            let tracer = tp.tracer(options.service_name().to_string());
            let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            registry.with(telemetry_layer).try_init()?;
        }
        None => {
            registry.try_init()?;
        }
    }

    Ok(())
}
