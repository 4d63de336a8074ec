//! Alert sink over WebSocket.
//!
//! `GET /api/v1/ws/alerts` upgrades to a socket that receives every
//! [`AlertEvent`] as a JSON text frame, in emission order. Lagging clients
//! skip to the newest alert; inbound frames other than ping/close are ignored.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::controller::AppState;
use crate::domain::AlertEvent;

pub async fn ws_alerts(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let alerts = state.controller.subscribe_alerts();
    ws.on_upgrade(move |socket| stream_alerts(socket, alerts))
}

fn encode(alert: &AlertEvent) -> Option<Message> {
    match serde_json::to_string(alert) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            warn!(error = %e, "dropping unserializable alert");
            None
        }
    }
}

async fn stream_alerts(mut socket: WebSocket, mut alerts: broadcast::Receiver<AlertEvent>) {
    debug!("alert stream opened");

    let reason = loop {
        tokio::select! {
            next = alerts.recv() => match next {
                Ok(alert) => {
                    let Some(frame) = encode(&alert) else { continue };
                    if socket.send(frame).await.is_err() {
                        break "send failed";
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "alert stream lagging");
                }
                Err(RecvError::Closed) => break "alert channel closed",
            },
            inbound = socket.recv() => match inbound {
                None | Some(Ok(Message::Close(_))) => break "client closed",
                Some(Err(_)) => break "socket error",
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break "pong failed";
                    }
                }
                Some(Ok(_)) => {}
            },
        }
    };

    debug!(reason, "alert stream closed");
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::controller::AppState;
    use crate::domain::{AlertEvent, Severity};
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    #[tokio::test]
    async fn test_alert_stream_forwards_alerts_as_json() {
        let mut cfg = Config::default();
        cfg.simulation.random_seed = Some(3);
        let state = AppState::new(cfg.clone()).unwrap();
        let app = crate::api::router(state.clone(), &cfg);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws/alerts"))
            .await
            .unwrap();

        let mut received = None;
        for _ in 0..100 {
            state.controller.set_setpoint(2.5).unwrap();
            match tokio::time::timeout(Duration::from_millis(50), socket.next()).await {
                Ok(Some(Ok(WsMessage::Text(text)))) => {
                    received = Some(serde_json::from_str::<AlertEvent>(&text).unwrap());
                    break;
                }
                Ok(other) => panic!("unexpected frame: {other:?}"),
                Err(_) => continue,
            }
        }

        let alert = received.expect("alert delivered over the socket");
        assert_eq!(alert.message, "Setpoint changed to 2.5°C");
        assert_eq!(alert.severity, Severity::Success);
    }
}
