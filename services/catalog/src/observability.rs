//! Logging, tracing and metrics for the catalog.
//!
//! # Purpose
//! One entry point, [`init_observability`], sets up everything the process
//! reports through:
//! - `tracing` output filtered by `RUST_LOG` (default `info`);
//! - span export over OTLP, only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set;
//! - the W3C `traceparent` propagator used by the request span in `app.rs`;
//! - a Prometheus recorder, rendered by [`serve_metrics`] on its own port.
//!
//! # Key invariants and assumptions
//! - Every piece installs at most once per process; later calls return the
//!   handle from the first.
//! - Counter names below are the only metric names the catalog emits.
use crate::config::Environment;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{Context, KeyValue, global};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::net::SocketAddr;
use std::sync::{Once, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Listing creates, updates and deletes; labels `kind`, `op`.
pub const LISTING_CHANGES: &str = "luxe_listing_changes_total";
/// Upload attempts per image; labels `backend`, `result`.
pub const MEDIA_UPLOADS: &str = "luxe_media_uploads_total";
/// Image deletions that failed during listing cleanup; label `backend`.
pub const MEDIA_DELETE_FAILURES: &str = "luxe_media_delete_failures_total";
/// Credential resolutions; label `channel`.
pub const AUTH_OUTCOMES: &str = "luxe_auth_outcomes_total";
/// Password sign-in attempts; label `result`.
pub const LOGIN_ATTEMPTS: &str = "luxe_login_attempts_total";

const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

static SUBSCRIBER: Once = Once::new();
static PROPAGATOR: Once = Once::new();
static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_observability(service_name: &str, environment: Environment) -> PrometheusHandle {
    SUBSCRIBER.call_once(|| install_subscriber(service_name, environment));
    let handle = RECORDER.get_or_init(install_recorder).clone();
    metrics::describe_counter!(LISTING_CHANGES, "Listing mutations by kind and operation");
    metrics::describe_counter!(MEDIA_UPLOADS, "Image uploads by backend and result");
    metrics::describe_counter!(
        MEDIA_DELETE_FAILURES,
        "Image deletions that failed while removing a listing"
    );
    metrics::describe_counter!(AUTH_OUTCOMES, "Credential resolutions by channel");
    metrics::describe_counter!(LOGIN_ATTEMPTS, "Password sign-in attempts by result");
    handle
}

fn install_subscriber(service_name: &str, environment: Environment) {
    install_propagator();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer().with_target(!environment.is_production());
    let otel = otlp_provider(service_name, environment).map(|provider| {
        let tracer = provider.tracer(service_name.to_string());
        global::set_tracer_provider(provider);
        tracing_opentelemetry::layer().with_tracer(tracer)
    });
    // `Option<Layer>` is itself a layer; `None` adds nothing.
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .with(otel)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {err}");
    }
}

fn install_propagator() {
    PROPAGATOR.call_once(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

fn otlp_provider(service_name: &str, environment: Environment) -> Option<SdkTracerProvider> {
    std::env::var_os(OTLP_ENDPOINT_ENV)?;
    let exporter = match opentelemetry_otlp::SpanExporter::builder().with_tonic().build() {
        Ok(exporter) => exporter,
        Err(err) => {
            eprintln!("otlp exporter disabled: {err}");
            return None;
        }
    };
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(
                Resource::builder_empty()
                    .with_attributes(service_resource(service_name, environment))
                    .build(),
            )
            .build(),
    )
}

fn service_resource(service_name: &str, environment: Environment) -> Vec<KeyValue> {
    let environment = if environment.is_production() {
        "production"
    } else {
        "development"
    };
    let mut attributes = vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", environment),
    ];
    let instance = ["LUXE_INSTANCE_ID", "HOSTNAME"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok().filter(|value| !value.is_empty()));
    if let Some(instance) = instance {
        attributes.push(KeyValue::new("service.instance.id", instance));
    }
    attributes
}

fn install_recorder() -> PrometheusHandle {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if let Err(err) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %err, "global metrics recorder already set; /metrics will be empty");
    }
    handle
}

/// Parent context for an inbound request, from its `traceparent` header.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> Context {
    install_propagator();
    global::get_text_map_propagator(|propagator| propagator.extract(&InboundHeaders(headers)))
}

struct InboundHeaders<'a>(&'a axum::http::HeaderMap);

impl Extractor for InboundHeaders<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.to_str().ok()
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(axum::http::HeaderName::as_str).collect()
    }
}

fn metrics_router(handle: PrometheusHandle) -> axum::Router {
    axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

/// Serve `GET /metrics` on `addr` until the task is dropped.
pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics listener started");
    axum::serve(listener, metrics_router(handle)).await
}
