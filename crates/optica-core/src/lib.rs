//! Client library for the Optica storefront and admin backend.
//!
//! The `ApiClient` talks to the catalog REST API with retries, a short-lived
//! response cache and connectivity tracking. When the backend cannot be
//! reached, reads fall back to stale cache entries and then to an offline
//! snapshot kept on disk.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod connection;
pub mod models;
pub mod snapshot;

pub use api::{ApiClient, ApiError, ResponseSource, Sourced};
pub use auth::{CredentialStore, Session, SessionData};
pub use config::{ClientConfig, ClientTuning, Config};
pub use connection::{ClientEvent, ConnectionStatus, HealthMonitor};
pub use snapshot::{OfflineSnapshot, SnapshotStore};
