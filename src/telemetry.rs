use crate::config::{LogFormat, TelemetryConfig};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{KeyValue, global};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    logs::SdkLoggerProvider,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::SdkTracerProvider,
};
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use std::fmt;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "userbase-server";

struct Providers {
    tracer: SdkTracerProvider,
    meter: SdkMeterProvider,
    logger: SdkLoggerProvider,
}

/// Keeps the OTLP providers alive; call [`TelemetryGuard::shutdown`] before exit to flush them.
#[derive(Default)]
pub struct TelemetryGuard {
    providers: Option<Providers>,
}

impl fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryGuard").field("otlp", &self.providers.is_some()).finish()
    }
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        let Some(providers) = self.providers else {
            return;
        };
        if let Err(e) = providers.tracer.shutdown() {
            tracing::warn!(error = %e, "Failed to flush traces");
        }
        if let Err(e) = providers.meter.shutdown() {
            tracing::warn!(error = %e, "Failed to flush metrics");
        }
        if let Err(e) = providers.logger.shutdown() {
            tracing::warn!(error = %e, "Failed to flush logs");
        }
    }
}

/// Installs the global tracing subscriber, exporting over OTLP when an endpoint is configured.
///
/// # Errors
/// Returns an error if an exporter cannot be built or a subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into())
        .add_directive("sqlx=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("h2=warn".parse()?)
        .add_directive("tonic=warn".parse()?);

    let providers = config.otlp_endpoint.as_deref().map(init_providers).transpose()?;

    let trace_layer = providers.as_ref().map(|p| OpenTelemetryLayer::new(p.tracer.tracer(SERVICE_NAME)));
    let log_layer = providers.as_ref().map(|p| OpenTelemetryTracingBridge::new(&p.logger));

    // Option<Layer> implements Layer, so disabled export costs nothing.
    let registry = Registry::default().with(filter).with(trace_layer).with(log_layer);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init()?,
    }

    Ok(TelemetryGuard { providers })
}

fn init_providers(endpoint: &str) -> anyhow::Result<Providers> {
    let resource = Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_attribute(KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")))
        .build();

    global::set_text_map_propagator(TraceContextPropagator::new());

    let span_exporter = opentelemetry_otlp::SpanExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
    let tracer = SdkTracerProvider::builder().with_resource(resource.clone()).with_batch_exporter(span_exporter).build();
    global::set_tracer_provider(tracer.clone());

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
    let meter = SdkMeterProvider::builder()
        .with_resource(resource.clone())
        .with_reader(PeriodicReader::builder(metric_exporter).build())
        .build();
    global::set_meter_provider(meter.clone());

    let log_exporter = opentelemetry_otlp::LogExporter::builder().with_tonic().with_endpoint(endpoint).build()?;
    let logger = SdkLoggerProvider::builder().with_resource(resource).with_batch_exporter(log_exporter).build();

    Ok(Providers { tracer, meter, logger })
}
