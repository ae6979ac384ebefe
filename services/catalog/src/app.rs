//! Router and shared state for the catalog API.
//!
//! # Purpose
//! [`AppState`] carries the store, media backend and credential resolver into
//! every handler; [`build_router`] mounts the management, public, upload and
//! docs routes on top of it.
//!
//! # Notes
//! Middleware, outermost first: trace span (with W3C parent context), CORS,
//! request timeout (408).
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::Authenticator;
use crate::media::MediaStore;
use crate::media::memory::InMemoryMediaStore;
use crate::observability;
use crate::store::CatalogStore;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

/// Router-level settings that do not belong to any handler.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Allowed CORS origins; empty means any origin without credentials.
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub media: Arc<dyn MediaStore>,
    /// Set when `media` is the in-process backend, so `/media` can serve it.
    pub local_media: Option<Arc<InMemoryMediaStore>>,
    pub auth: Arc<Authenticator>,
    pub max_upload_bytes: usize,
    pub http: HttpSettings,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(crate::auth::resolver::SESSION_DATA_HEADER),
        ])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });
    let upload_limit = api::upload::upload_body_limit(state.max_upload_bytes);
    let cors = cors_layer(&state.http.cors_origins);
    let timeout = TimeoutLayer::new(state.http.request_timeout);

    Router::new()
        .route(
            "/api/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/api/auth/login", axum::routing::post(api::auth::login))
        .route("/api/auth/logout", axum::routing::post(api::auth::logout))
        .route("/api/auth/whoami", axum::routing::get(api::auth::whoami))
        .route(
            "/api/properties",
            axum::routing::get(api::properties::list_properties)
                .post(api::properties::create_property),
        )
        .route(
            "/api/properties/:id",
            axum::routing::get(api::properties::get_property)
                .put(api::properties::update_property)
                .delete(api::properties::delete_property),
        )
        .route(
            "/api/cars",
            axum::routing::get(api::cars::list_cars).post(api::cars::create_car),
        )
        .route(
            "/api/cars/:id",
            axum::routing::get(api::cars::get_car)
                .put(api::cars::update_car)
                .delete(api::cars::delete_car),
        )
        .route(
            "/api/public/properties",
            axum::routing::get(api::public::list_public_properties),
        )
        .route(
            "/api/public/properties/:id",
            axum::routing::get(api::public::get_public_property),
        )
        .route(
            "/api/public/cars",
            axum::routing::get(api::public::list_public_cars),
        )
        .route(
            "/api/public/cars/:id",
            axum::routing::get(api::public::get_public_car),
        )
        .route(
            "/api/upload",
            axum::routing::post(api::upload::upload_images)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/stats", axum::routing::get(api::stats::get_stats))
        .route(
            "/media/:folder/:file",
            axum::routing::get(api::upload::serve_local_media),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .layer(timeout)
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}
