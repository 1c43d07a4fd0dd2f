//! In-memory response caching.
//!
//! This module provides the `ResponseCache` the API client consults before
//! issuing GET requests. Entries are keyed by method, endpoint and body and
//! expire after the configured cache timeout (5 minutes by default).

pub mod response;

pub use response::{CacheLookup, CachedResponse, ResponseCache};
