mod context;
mod docs;
mod errors;
mod execution;
mod gateway;
mod rooms;
mod schemas;
mod serialized;

pub mod logging;

use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::routing::get;
use codedeck_collab::{Collab, MemoryRegistry, PgRegistry};
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use context::ServerContext;

use crate::{execution::ExecutionClient, gateway::Gateway};

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Starts the codedeck server
pub async fn run_server() {
    let port = env::var("CODEDECK_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let collab = match env::var("CODEDECK_DATABASE_URL") {
        Ok(url) => {
            let registry = PgRegistry::new(&url).await.expect("registry connects");
            Arc::new(Collab::new(registry))
        }
        Err(_) => {
            warn!("CODEDECK_DATABASE_URL is not set, rooms will not survive a restart");
            Arc::new(Collab::new(MemoryRegistry::new()))
        }
    };

    let context = ServerContext {
        collab,
        gateway: Gateway::new(),
        executor: Arc::new(ExecutionClient::from_env()),
    };

    tokio::spawn(gateway::forward_events(context.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/rooms", rooms::router())
        .route("/gateway", get(gateway::websocket));

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("Listening on port {}", port);

    axum::serve(listener, root_router.into_make_service())
        .await
        .unwrap();
}
