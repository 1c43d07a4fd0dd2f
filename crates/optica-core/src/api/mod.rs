//! REST client for the catalog backend.
//!
//! - `client`: `ApiClient` and its request pipeline (retries, timeouts,
//!   response cache, stale and offline fallbacks, connection status)
//! - `catalog`: typed endpoints (products, appointments, settings, analytics)
//! - `transport`: the HTTP seam and its reqwest implementation
//! - `classify`: backend error bodies and the "database not available" payloads
//!
//! Admin endpoints use a bearer token obtained from `/admin/login`. A
//! rejected token clears the session and emits `ClientEvent::LoginRequired`.

pub mod catalog;
pub mod classify;
pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, AuthMode, ClientBuilder, RequestOptions, ResponseSource, Sourced};
pub use error::ApiError;
pub use transport::{
    FilePart, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody, ReqwestTransport,
    Transport, TransportError,
};
