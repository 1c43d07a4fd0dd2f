//! Backend connectivity tracking.
//!
//! - `ConnectionStatus`: last known reachability (`Connected`, `Disconnected`,
//!   `Error`, `Unknown`)
//! - `ConnectionMonitor`: owns the status and notifies subscribers
//! - `HealthMonitor`: handle to the periodic `/health` poll started by
//!   `ApiClient::start_health_monitor`

pub mod health;
pub mod monitor;
pub mod status;

pub use health::HealthMonitor;
pub use monitor::ConnectionMonitor;
pub use status::{ClientEvent, ConnectionStatus};
