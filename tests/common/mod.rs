//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use slug_router::config::{RelayMode, RouterConfig};
use slug_router::{RouterServer, Shutdown};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Headers of every request the mock directory received.
pub type SeenHeaders = Arc<Mutex<Vec<HeaderMap>>>;

#[derive(Clone)]
struct DirectoryState {
    routes: Arc<HashMap<String, String>>,
    seen: SeenHeaders,
}

async fn projects(
    State(state): State<DirectoryState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.seen.lock().unwrap().push(headers);

    let slug = params
        .get("slug")
        .and_then(|filter| filter.strip_prefix("eq."))
        .unwrap_or_default();
    let field = params.get("select").cloned().unwrap_or_default();

    match state.routes.get(slug) {
        Some(origin) => {
            let mut record = Map::new();
            record.insert(field, Value::String(origin.clone()));
            Json(Value::Array(vec![Value::Object(record)]))
        }
        None => Json(json!([])),
    }
}

/// Start a mock directory mapping slugs to origins.
pub async fn start_directory(routes: &[(&str, String)]) -> (SocketAddr, SeenHeaders) {
    let seen = SeenHeaders::default();
    let state = DirectoryState {
        routes: Arc::new(
            routes
                .iter()
                .map(|(slug, origin)| (slug.to_string(), origin.clone()))
                .collect(),
        ),
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/rest/v1/projects", get(projects))
        .with_state(state);
    (spawn_app(app).await, seen)
}

/// Start the router against `directory`, letting the test adjust the config.
pub async fn start_router<F>(directory: SocketAddr, configure: F) -> (SocketAddr, Shutdown)
where
    F: FnOnce(&mut RouterConfig),
{
    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.directory.base_url = format!("http://{}", directory);
    config.directory.api_key = "anon-key".into();
    config.upstream.relay_mode = Some(RelayMode::Strict);
    configure(&mut config);

    let server = RouterServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never follows redirects itself.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
