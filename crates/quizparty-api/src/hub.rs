//! Outbound fan-out from the engine to open WebSocket connections.

use std::collections::HashMap;
use std::sync::Arc;

use quizparty_session::domain::events::Envelope;
use quizparty_session::domain::player::ConnectionId;
use tokio::sync::RwLock;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Serialized frames waiting to be written to one connection.
pub type Outbound = Sender<String>;

/// Registry of writable connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionHub {
    connections: Arc<RwLock<HashMap<ConnectionId, Outbound>>>,
}

impl ConnectionHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: ConnectionId, outbound: Outbound) {
        self.connections.write().await.insert(connection, outbound);
    }

    pub async fn unregister(&self, connection: ConnectionId) {
        self.connections.write().await.remove(&connection);
    }

    /// Delivers each envelope, in order, to its recipients. Frames for
    /// closed or saturated connections are dropped.
    pub async fn deliver(&self, envelopes: Vec<Envelope>) {
        if envelopes.is_empty() {
            return;
        }
        let connections = self.connections.read().await;
        for envelope in envelopes {
            let frame = match serde_json::to_string(&envelope.event) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, event = envelope.event.name(), "Failed to serialize event");
                    continue;
                }
            };
            for recipient in envelope.recipients {
                let Some(outbound) = connections.get(&recipient) else {
                    continue;
                };
                match outbound.try_send(frame.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        warn!(connection = %recipient, event = envelope.event.name(), "Outbound queue full, dropping event");
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(connection = %recipient, "Connection closed before delivery");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use quizparty_session::domain::events::{CloseReason, SessionEvent};
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn test_deliver_reaches_only_registered_recipients() {
        // Arrange
        let hub = ConnectionHub::new();
        let (tx, mut rx) = mpsc::channel(8);
        let registered = ConnectionId::new();
        hub.register(registered, tx).await;

        // Act
        hub.deliver(vec![Envelope {
            recipients: vec![registered, ConnectionId::new()],
            event: SessionEvent::SessionClosed {
                reason: CloseReason::Idle,
            },
        }])
        .await;

        // Assert
        let frame = rx.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["event"], "session-closed");
        assert_eq!(json["data"]["reason"], "idle");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let hub = ConnectionHub::new();
        let (tx, mut rx) = mpsc::channel(8);
        let connection = ConnectionId::new();
        hub.register(connection, tx).await;

        hub.unregister(connection).await;
        hub.deliver(vec![Envelope {
            recipients: vec![connection],
            event: SessionEvent::HostDisconnected {},
        }])
        .await;

        assert!(rx.try_recv().is_err());
    }
}
