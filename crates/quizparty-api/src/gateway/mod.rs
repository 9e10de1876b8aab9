//! WebSocket transport gateway.
//!
//! Each connection gets an id, a bounded outbound queue registered with the
//! [`ConnectionHub`](crate::hub::ConnectionHub), and a rate limiter. Inbound
//! frames are rate-limited, parsed and validated here, then dispatched to
//! the engine; refusals go back to the sender only.

pub mod protocol;
pub mod rate_limit;
pub mod validation;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use quizparty_session::domain::player::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use self::protocol::GatewayMessage;
use self::rate_limit::SlidingWindowLimiter;
use crate::error::ApiError;
use crate::hub::Outbound;
use crate::state::AppState;

const OUTBOUND_BUFFER: usize = 256;

/// GET /ws
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[instrument(skip_all, fields(connection = %connection))]
async fn serve_connection(socket: WebSocket, state: AppState, connection: ConnectionId) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut queued) = mpsc::channel::<String>(OUTBOUND_BUFFER);
    state.hub.register(connection, outbound.clone()).await;
    info!("Connection opened");

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = queued.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut limiter = SlidingWindowLimiter::per_minute(recv_state.config.rate_limit_per_minute);
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    handle_frame(&recv_state, connection, &outbound, &mut limiter, text.as_str())
                        .await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.unregister(connection).await;
    state.engine.disconnect(connection).await;
    info!("Connection closed");
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    serve_connection(socket, state, ConnectionId::new()).await;
}

async fn handle_frame(
    state: &AppState,
    connection: ConnectionId,
    outbound: &Outbound,
    limiter: &mut SlidingWindowLimiter,
    frame: &str,
) {
    if !limiter.try_acquire(state.clock.now()) {
        warn!(connection = %connection, "Rate limit exceeded, dropping event");
        reply(
            outbound,
            &GatewayMessage::RateLimited {
                message: "too many events, slow down".to_owned(),
            },
        );
        return;
    }

    let command = match protocol::parse(frame) {
        Ok(command) => command,
        Err(rejection) => {
            debug!(connection = %connection, event = ?rejection.event, error = %rejection.error, "Rejected inbound event");
            reply(
                outbound,
                &GatewayMessage::refusal(&rejection.error, rejection.is_join()),
            );
            return;
        }
    };

    let is_join = command.is_join();
    match state.engine.dispatch(connection, command).await {
        Ok(()) => {}
        Err(ApiError::Domain(error)) => {
            reply(outbound, &GatewayMessage::refusal(&error, is_join));
        }
        Err(error @ ApiError::EngineUnavailable) => {
            reply(
                outbound,
                &GatewayMessage::Error {
                    kind: error.code(),
                    message: error.to_string(),
                },
            );
        }
    }
}

fn reply(outbound: &Outbound, message: &GatewayMessage) {
    if outbound.try_send(message.to_frame()).is_err() {
        debug!("Reply dropped, outbound queue unavailable");
    }
}

/// Returns the WebSocket router.
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
