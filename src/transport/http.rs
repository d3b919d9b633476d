use std::convert::Infallible;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::broker::BrokerHandle;
use crate::broker::message::EventKind;
use crate::session;
use crate::utils::error::Error;

/// Encoded frames a session may queue ahead of the HTTP writer. This only
/// smooths bursts toward one client; the broker-side slow-consumer bound is
/// the subscriber's inbound queue.
const FRAME_BUFFER: usize = 16;

/// Shared state handed to the request handlers.
#[derive(Clone)]
pub struct AppState {
    pub broker: BrokerHandle,
    pub heartbeat: Duration,
}

/// Builds the router: publish and subscribe share one path, split by verb.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/infocenter/{room}",
            get(subscribe_handler).post(publish_handler),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Binds the listen address and serves requests until process shutdown.
pub async fn start_http_server(addr: &str, state: AppState) -> Result<(), Error> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!("infocenter listening on http://{}", addr);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// `POST /infocenter/{room}`: publish the raw request body into the room.
pub(crate) async fn publish_handler(
    State(state): State<AppState>,
    Path(room): Path<String>,
    body: String,
) -> StatusCode {
    state.broker.publish(&room, EventKind::Message, body);
    StatusCode::NO_CONTENT
}

/// `GET /infocenter/{room}`: subscribe and stream events until the session
/// ends.
///
/// The subscription is fully registered before the response is produced, so
/// a publish that races the tail of this request is either delivered or
/// predates the subscription; there is no window in between. The response
/// body pulls from the session's frame channel, and dropping the body (the
/// client hanging up) closes that channel, which the session observes.
pub(crate) async fn subscribe_handler(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Response {
    let subscription = match state.broker.subscribe(&room).await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!(room = %room, "subscribe failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let (frames_tx, frames_rx) = mpsc::channel::<String>(FRAME_BUFFER);
    tokio::spawn(session::stream::run(
        subscription,
        state.broker.clone(),
        state.heartbeat,
        frames_tx,
    ));

    // One frame per body chunk keeps the push character of the stream: each
    // event is flushed to the socket as soon as the session emits it.
    let body = Body::from_stream(ReceiverStream::new(frames_rx).map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
