use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::status::{ClientEvent, ConnectionStatus};

/// Buffered events per subscriber before slow receivers start lagging.
const EVENT_BUFFER_SIZE: usize = 64;

/// Owns the connection status of one client and fans out change
/// notifications.
///
/// Reaching the backend only notifies on a transition, while every failure
/// to reach it notifies, so indicators can show each failed attempt.
#[derive(Debug)]
pub struct ConnectionMonitor {
    status: watch::Sender<ConnectionStatus>,
    events: broadcast::Sender<ClientEvent>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Unknown);
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { status, events }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that always holds the current status.
    pub fn watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn mark_connected(&self) {
        let previous = self.status.send_replace(ConnectionStatus::Connected);
        if previous != ConnectionStatus::Connected {
            info!(from = %previous, "Backend reachable");
            self.emit(ClientEvent::ConnectivityChanged(ConnectionStatus::Connected));
        }
    }

    pub fn mark_disconnected(&self) {
        let previous = self.status.send_replace(ConnectionStatus::Disconnected);
        if previous != ConnectionStatus::Disconnected {
            warn!(from = %previous, "Backend unreachable");
        }
        self.emit(ClientEvent::ConnectivityChanged(ConnectionStatus::Disconnected));
    }

    pub fn mark_error(&self) {
        let previous = self.status.send_replace(ConnectionStatus::Error);
        if previous != ConnectionStatus::Error {
            warn!(from = %previous, "Backend reports an internal failure");
            self.emit(ClientEvent::ConnectivityChanged(ConnectionStatus::Error));
        }
    }

    pub fn login_required(&self) {
        self.emit(ClientEvent::LoginRequired);
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is fine; the status is still readable.
        if self.events.send(event).is_err() {
            debug!(?event, "No subscribers for client event");
        }
    }
}
