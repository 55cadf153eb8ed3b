//! HTTP/WebSocket bridge between a browser GUI and the client.
//!
//! - `GET /startup`: startup configuration
//! - `GET /ports`: WebSocket carrying the GUI message ports, one session per
//!   connection
//! - `POST /attestation/verify`: check a payment attestation signature

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

use crate::attestation;
use crate::bootstrap::ClientRuntime;
use crate::ports::{GuiRequest, PortSender, StartupConfig};
use crate::session::Session;
use crate::validation::parse_address;

/// Buffered inbound requests per GUI before the socket reader waits
const REQUEST_BUFFER: usize = 32;

pub fn router(runtime: ClientRuntime) -> Router {
    Router::new()
        .route("/startup", get(startup))
        .route("/ports", get(ports_ws_handler))
        .route("/attestation/verify", post(verify_attestation))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(runtime)
}

async fn startup(State(runtime): State<ClientRuntime>) -> Json<StartupConfig> {
    Json(runtime.startup_config())
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub signer: Option<String>,
    pub error: Option<String>,
}

async fn verify_attestation(Json(req): Json<VerifyRequest>) -> Json<VerifyResponse> {
    let rejected = |error: String| VerifyResponse {
        valid: false,
        signer: None,
        error: Some(error),
    };

    let Some(claimed) = parse_address(&req.address) else {
        return Json(rejected(format!("invalid address `{}`", req.address)));
    };
    let signature = match hex::decode(req.signature.trim_start_matches("0x")) {
        Ok(bytes) => bytes,
        Err(e) => return Json(rejected(format!("signature is not hex: {}", e))),
    };

    match attestation::recover_signer(&req.message, &signature) {
        Ok(signer) => Json(VerifyResponse {
            valid: signer == claimed,
            signer: Some(signer.to_checksum(None)),
            error: None,
        }),
        Err(e) => Json(rejected(e.to_string())),
    }
}

async fn ports_ws_handler(
    ws: WebSocketUpgrade,
    State(runtime): State<ClientRuntime>,
) -> impl IntoResponse {
    tracing::info!("GUI port connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, runtime))
}

/// Bridge one socket to one [`Session`].
async fn handle_socket(socket: WebSocket, runtime: ClientRuntime) {
    tracing::info!("GUI connected");

    let (mut sender, mut receiver) = socket.split();
    let (events, mut event_rx) = PortSender::channel();
    let (request_tx, request_rx) = mpsc::channel::<GuiRequest>(REQUEST_BUFFER);

    let session = tokio::spawn(Session::new(runtime, events).run(request_rx));

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!(port = event.port(), "failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                tracing::debug!("GUI socket send failed");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GuiRequest>(&text) {
                    Ok(request) => {
                        if request_tx.send(request).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, frame = %text, "ignoring malformed GUI message"),
                },
                Message::Close(_) => {
                    tracing::info!("GUI closed the socket");
                    break;
                }
                // axum answers pings itself
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }
    session.abort();

    tracing::info!("GUI disconnected");
}
