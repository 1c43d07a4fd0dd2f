use serde::{Deserialize, Serialize};

/// Last known reachability of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// The most recent request or health check reached the backend.
    Connected,
    /// Retries were exhausted or the health check could not reach the backend.
    Disconnected,
    /// The backend answered but reported a failure of its own (for example
    /// its database is down).
    Error,
    /// Nothing has been attempted yet.
    #[default]
    Unknown,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Short label for status indicators
    pub fn indicator(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "online",
            ConnectionStatus::Disconnected => "offline",
            ConnectionStatus::Error => "degraded",
            ConnectionStatus::Unknown => "checking",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Error => write!(f, "Error"),
            ConnectionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Notifications delivered to subscribers of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    ConnectivityChanged(ConnectionStatus),
    /// Stored credentials were rejected or are missing; show a login prompt.
    LoginRequired,
}
