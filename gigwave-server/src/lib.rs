use std::{
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
    thread,
};

use axum::routing::get;
use context::ServerContext;
use gigwave_collab::Collab;
use log::{info, warn};
use sse::ServerSentEvents;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod auth;
mod catalog;
mod context;
mod docs;
mod errors;
mod gigs;
mod schemas;
mod serialized;
mod sse;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

pub type Router = axum::Router<ServerContext>;

/// Starts the gigwave server, returning once it stops listening
pub async fn run_server(collab: Arc<Collab>, port: u16) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let sse = ServerSentEvents::new();
    forward_events(&collab, &sse);

    let context = ServerContext { collab, sse };

    let version_one_router = Router::new()
        .nest("/gigs", gigs::router())
        .nest("/playlists", catalog::playlist_router())
        .nest("/artists", catalog::artist_router())
        .nest("/me", gigs::me_router())
        .nest("/events", sse::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, root_router).await
}

/// Relays collab events to every event stream
fn forward_events(collab: &Collab, sse: &Arc<ServerSentEvents>) {
    let receiver = collab.events();
    let sse = Arc::downgrade(sse);

    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(sse) = sse.upgrade() else {
                break;
            };

            sse.broadcast(event.into());
        }

        warn!("Stopped forwarding events");
    });
}
