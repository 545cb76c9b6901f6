//! HTTP server setup and the routing handler.
//!
//! # Responsibilities
//! - Build every pipeline component once from the validated config
//! - Create the Axum Router with all handlers and middleware
//! - Dispatch each request through resolve → headers → follow → relay
//! - Translate every failure into a client response

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;

use crate::config::{RelayMode, RouterConfig};
use crate::directory::DirectoryClient;
use crate::error::{RouterError, RouterResult};
use crate::http::request::{propagate_request_id_layer, request_id_of, set_request_id_layer};
use crate::http::response::relay;
use crate::observability::metrics;
use crate::routing::{RequestContext, SlugResolver};
use crate::security::OutboundHeaders;
use crate::upstream::{self, RedirectFollower, UpstreamRequest};

/// Application state injected into handlers. Immutable and shared.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<SlugResolver>,
    pub outbound: Arc<OutboundHeaders>,
    pub follower: Arc<RedirectFollower>,
    pub relay_mode: RelayMode,
    pub original_path_header: Option<HeaderName>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &RouterConfig) -> RouterResult<Self> {
        let relay_mode = config.upstream.relay_mode.ok_or_else(|| {
            RouterError::Internal("upstream.relay_mode must be set".to_string())
        })?;

        let original_path_header = match config.listener.original_path_header.as_str() {
            "" => None,
            name => Some(HeaderName::from_bytes(name.as_bytes()).map_err(RouterError::internal)?),
        };

        let directory = DirectoryClient::new(&config.directory, &config.timeouts)?;

        Ok(Self {
            resolver: Arc::new(SlugResolver::new(directory)),
            outbound: Arc::new(OutboundHeaders::from_config(&config.upstream)?),
            follower: Arc::new(RedirectFollower::new(&config.timeouts)?),
            relay_mode,
            original_path_header,
            max_body_bytes: config.upstream.max_body_bytes,
        })
    }
}

/// HTTP server for the slug router.
pub struct RouterServer {
    router: Router,
    config: RouterConfig,
}

impl RouterServer {
    /// Create a new server. Fails if the config cannot produce a pipeline.
    pub fn new(config: RouterConfig) -> RouterResult<Self> {
        let state = AppState::from_config(&config)?;

        tracing::info!(
            header_policy = state.outbound.policy_name(),
            relay_mode = ?state.relay_mode,
            "Routing pipeline ready"
        );

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(route_handler))
            .route("/{*path}", any(route_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Entry point for every inbound request.
async fn route_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id_of(&request);
    let method = request.method().to_string();

    let span = tracing::info_span!("route", request_id = %request_id);
    let response = match route(&state, request).instrument(span).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

async fn route(state: &AppState, request: Request<Body>) -> RouterResult<Response> {
    let (parts, body) = request.into_parts();
    let ctx = RequestContext::from_parts(
        &parts.method,
        &parts.uri,
        &parts.headers,
        state.original_path_header.as_ref(),
    );

    if ctx.is_favicon_probe() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let mapping = state.resolver.resolve(&ctx).await?;
    let target_url = upstream::target_url(&mapping, &ctx)?;

    let body = axum::body::to_bytes(body, state.max_body_bytes)
        .await
        .map_err(|e| RouterError::Internal(format!("reading request body failed: {}", e)))?;

    let request = UpstreamRequest {
        method: ctx.method.clone(),
        headers: state.outbound.build(&ctx.headers),
        body,
    };

    tracing::debug!(slug = %mapping.slug, target = %target_url, "Proxying request");
    let outcome = state.follower.follow(request, target_url).await?;
    relay(state.relay_mode, outcome).await
}
