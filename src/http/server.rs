//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (tracing, request ID, timeout, concurrency, CORS)
//! - Dispatch requests through the selected profile's table
//! - Forward matched requests to their backend origin
//! - Serve the browser client for requests no rule matches
//! - Observability (metrics, correlation IDs)

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower::ServiceExt;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{loader, validation, ConfigError, CorsConfig, GatewayConfig, ValidationError};
use crate::http::forward::Forwarder;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::DispatchTable;

type StaticFiles = ServeDir<ServeFile>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<DispatchTable>,
    pub forwarder: Forwarder,
    pub static_files: Option<StaticFiles>,
    /// Bounds in-flight requests; excess requests wait for a slot.
    pub request_limit: Arc<Semaphore>,
}

/// HTTP server for the console gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    profile: String,
}

impl GatewayServer {
    /// Create a server for `config`, using `profile` instead of
    /// `proxy.profile` when given.
    pub fn new(config: GatewayConfig, profile: Option<&str>) -> Result<Self, ConfigError> {
        let (profile, table) = loader::dispatch_table(&config, profile)?;
        Self::with_table(config, profile, table)
    }

    /// Create a server around an already compiled table.
    pub fn with_table(
        config: GatewayConfig,
        profile: String,
        table: DispatchTable,
    ) -> Result<Self, ConfigError> {
        let cors = cors_layer(&config.proxy.cors)
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        tracing::info!(
            profile = %profile,
            rules = table.len(),
            static_dir = ?config.proxy.static_dir,
            "Dispatch table ready"
        );
        for rule in table.rules() {
            tracing::debug!(
                prefix = %rule.prefix(),
                target = %rule.target(),
                rewrite = ?rule.rewrite(),
                "Dispatch rule"
            );
        }

        let state = AppState {
            table: Arc::new(table),
            forwarder: Forwarder::new(&config.timeouts),
            static_files: config.proxy.static_dir.as_deref().map(static_files),
            request_limit: Arc::new(Semaphore::new(config.listener.max_connections)),
        };

        let router = Self::build_router(&config, state, cors);
        Ok(Self { router, config, profile })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState, cors: Option<CorsLayer>) -> Router {
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ));

        let router = match cors {
            Some(cors) => router.layer(cors),
            None => router,
        };

        router
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            profile = %self.profile,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Name of the active dispatch profile.
    pub fn profile(&self) -> &str {
        &self.profile
    }
}

fn static_files(dir: &Path) -> StaticFiles {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

fn cors_layer(config: &CorsConfig) -> Result<Option<CorsLayer>, ValidationError> {
    if !config.enabled {
        return Ok(None);
    }
    let origin = match validation::cors_origin(config)? {
        Some(value) => AllowOrigin::exact(value),
        None => AllowOrigin::from(Any),
    };
    Ok(Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
    ))
}

/// Main gateway handler.
/// Looks up the dispatch rule, rewrites, and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    // Held until the response head is ready.
    let _permit = match state.request_limit.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let route = match state.table.lookup(&path) {
        Ok(route) => route,
        Err(e) => {
            let response = match &state.static_files {
                Some(files) => serve_static(files.clone(), request).await,
                None => {
                    tracing::warn!(request_id = %request_id, path = %path, "No dispatch rule matched");
                    e.into_response()
                }
            };
            metrics::record_request(&method, response.status().as_u16(), metrics::NO_RULE, start_time);
            return response;
        }
    };

    let forwarded = match route.rewrite_request(request) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "Cannot dispatch request");
            metrics::record_request(&method, e.status_code().as_u16(), route.rule.prefix(), start_time);
            return e.into_response();
        }
    };

    let rule = route.rule;

    tracing::debug!(
        request_id = %request_id,
        rule = %rule.prefix(),
        upstream = %forwarded.uri(),
        "Forwarding request"
    );

    match state.forwarder.forward(forwarded).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), rule.prefix(), start_time);
            response
        }
        Err(e) if e.is_forwarding_failure() => {
            tracing::error!(
                request_id = %request_id,
                rule = %rule.prefix(),
                origin = %rule.target(),
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method, e.status_code().as_u16(), rule.prefix(), start_time);
            e.into_response()
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, rule = %rule.prefix(), error = %e, "Forwarding rejected");
            metrics::record_request(&method, e.status_code().as_u16(), rule.prefix(), start_time);
            e.into_response()
        }
    }
}

async fn serve_static(files: StaticFiles, request: Request<Body>) -> Response {
    let result: Result<_, Infallible> = files.oneshot(request).await;
    match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
