//! Request pipeline for the catalog backend.
//!
//! `ApiClient` wraps every call in the same policy: fresh-cache short
//! circuit for reads, a bounded timeout per attempt, exponential backoff on
//! transient failures, and a degraded answer (stale cache, then offline
//! snapshot) for reads once retries are exhausted. The typed endpoint
//! methods live in `catalog.rs`.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::auth::{Session, SessionData};
use crate::cache::{CacheLookup, ResponseCache};
use crate::config::ClientConfig;
use crate::connection::{ClientEvent, ConnectionMonitor, ConnectionStatus, HealthMonitor};
use crate::models::HealthReport;
use crate::snapshot::SnapshotStore;

use super::classify;
use super::transport::{
    HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody, ReqwestTransport, Transport,
};
use super::ApiError;

pub(crate) const HEALTH_ENDPOINT: &str = "/health";

/// Whether a request carries the admin bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    None,
    /// Attach the token when logged in, send anonymously otherwise
    Optional,
    /// Fail with `SessionRequired` when not logged in
    Required,
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
    pub auth: AuthMode,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: HttpMethod::Get,
            body: RequestBody::Empty,
            headers: Vec::new(),
            auth: AuthMode::None,
        }
    }

    pub fn json(method: HttpMethod, body: Value) -> Self {
        Self {
            method,
            body: RequestBody::Json(body),
            ..Self::get()
        }
    }

    pub fn post(body: Value) -> Self {
        Self::json(HttpMethod::Post, body)
    }

    pub fn delete() -> Self {
        Self {
            method: HttpMethod::Delete,
            ..Self::get()
        }
    }

    pub fn multipart(method: HttpMethod, form: MultipartForm) -> Self {
        Self {
            method,
            body: RequestBody::Multipart(form),
            ..Self::get()
        }
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// GET-like requests are cached and may be answered from fallbacks.
    pub fn is_read(&self) -> bool {
        self.method == HttpMethod::Get
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    /// Fresh entry from the response cache
    Cache,
    /// Expired cache entry served because the backend was unreachable
    StaleCache,
    /// Offline snapshot served because the backend was unreachable
    Snapshot,
    /// Empty payload substituted because the backend's database is down
    Synthetic,
}

impl ResponseSource {
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            ResponseSource::StaleCache | ResponseSource::Snapshot | ResponseSource::Synthetic
        )
    }
}

#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub data: T,
    pub source: ResponseSource,
}

impl<T> Sourced<T> {
    pub fn new(data: T, source: ResponseSource) -> Self {
        Self { data, source }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            data: f(self.data),
            source: self.source,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Sourced<U>, E> {
        Ok(Sourced {
            data: f(self.data)?,
            source: self.source,
        })
    }
}

/// How a request gave up.
enum Failure {
    /// Not worth retrying (4xx, auth, database down, bad payload)
    Immediate(ApiError),
    /// Transient failure that survived every retry
    Exhausted(ApiError),
}

struct Inner<T> {
    transport: T,
    config: ClientConfig,
    cache: Mutex<ResponseCache>,
    session: Mutex<Session>,
    monitor: ConnectionMonitor,
    snapshot: Option<SnapshotStore>,
}

/// API client for the catalog backend.
///
/// Construct one per application and hand out clones: every clone shares
/// the same cache, session and connection status.
pub struct ApiClient<T: Transport = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub struct ClientBuilder {
    config: ClientConfig,
    session: Session,
    snapshot: Option<SnapshotStore>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: Session::in_memory(),
            snapshot: None,
        }
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn snapshot_store(mut self, store: SnapshotStore) -> Self {
        self.snapshot = Some(store);
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> ApiClient<T> {
        debug!(base_url = %self.config.base_url, "Building API client");
        let cache = ResponseCache::with_limits(
            self.config.cache_timeout,
            self.config.stale_retention,
            self.config.cache_max_entries,
        );
        ApiClient {
            inner: Arc::new(Inner {
                transport,
                config: self.config,
                cache: Mutex::new(cache),
                session: Mutex::new(self.session),
                monitor: ConnectionMonitor::new(),
                snapshot: self.snapshot,
            }),
        }
    }

    pub fn build_default(self) -> Result<ApiClient, ApiError> {
        let transport = ReqwestTransport::new()?;
        Ok(self.build(transport))
    }
}

impl ApiClient {
    /// Create a client over reqwest with an in-memory session
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        ClientBuilder::new(config).build_default()
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ===== Connection status =====

    pub fn connection_status(&self) -> ConnectionStatus {
        self.inner.monitor.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status().is_connected()
    }

    /// The last attempt to reach the backend failed.
    pub fn is_offline(&self) -> bool {
        self.connection_status() == ConnectionStatus::Disconnected
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.monitor.subscribe()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.monitor.watch()
    }

    pub fn snapshot_store(&self) -> Option<&SnapshotStore> {
        self.inner.snapshot.as_ref()
    }

    // ===== Session =====

    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.lock().await.is_valid()
    }

    pub async fn username(&self) -> Option<String> {
        self.inner.session.lock().await.username().map(str::to_string)
    }

    pub(crate) async fn store_session(&self, data: SessionData) {
        let mut session = self.inner.session.lock().await;
        session.update(data);
        if let Err(e) = session.save() {
            warn!(error = %e, "Failed to save session");
        }
    }

    pub(crate) async fn clear_session(&self) {
        if let Err(e) = self.inner.session.lock().await.clear() {
            warn!(error = %e, "Failed to clear session");
        }
    }

    async fn force_logout(&self, endpoint: &str) {
        warn!(endpoint, "Credentials rejected, clearing session");
        self.clear_session().await;
        self.inner.monitor.login_required();
    }

    // ===== Cache management =====

    /// Fresh cached value for `key`; expired entries are evicted.
    pub async fn get_from_cache(&self, key: &str) -> Option<Value> {
        self.inner.cache.lock().await.get(key)
    }

    pub async fn set_cache(&self, key: impl Into<String>, value: Value) {
        self.inner.cache.lock().await.set(key, value);
    }

    pub async fn clear_cache(&self) {
        self.inner.cache.lock().await.clear();
    }

    // ===== Requests =====

    /// Issue a request and return the parsed payload.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.request_sourced(endpoint, options).await.map(|s| s.data)
    }

    /// Like `request`, also reporting where the payload came from.
    pub async fn request_sourced(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Sourced<Value>, ApiError> {
        let is_read = options.is_read();
        let key = ResponseCache::key(options.method, endpoint, &options.body.cache_fragment());

        if is_read && !self.is_offline() {
            if let CacheLookup::Fresh(payload) = self.inner.cache.lock().await.lookup(&key) {
                debug!(endpoint, "Serving from cache");
                return Ok(Sourced::new(payload, ResponseSource::Cache));
            }
        }

        match self.execute_with_retry(endpoint, &options).await {
            Ok(payload) => {
                if is_read {
                    self.inner.cache.lock().await.set(key, payload.clone());
                }
                self.inner.monitor.mark_connected();
                Ok(Sourced::new(payload, ResponseSource::Network))
            }
            Err(Failure::Exhausted(err)) => {
                self.inner.monitor.mark_disconnected();
                if is_read {
                    if let Some(fallback) = self.read_fallback(endpoint, &key).await {
                        warn!(endpoint, source = ?fallback.source, error = %err, "Backend unreachable, serving fallback");
                        return Ok(fallback);
                    }
                }
                Err(err)
            }
            Err(Failure::Immediate(err)) => {
                if err.is_auth_failure() {
                    self.force_logout(endpoint).await;
                }
                match &err {
                    ApiError::DatabaseUnavailable(message) => {
                        self.inner.monitor.mark_error();
                        if is_read {
                            warn!(endpoint, message = %message, "Backend database unavailable, returning empty result");
                            return Ok(Sourced::new(
                                classify::synthetic_empty(endpoint),
                                ResponseSource::Synthetic,
                            ));
                        }
                    }
                    // Never left the machine
                    ApiError::SessionRequired | ApiError::InvalidRequest(_) => {}
                    _ => self.inner.monitor.mark_connected(),
                }
                Err(err)
            }
        }
    }

    async fn execute_with_retry(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Value, Failure> {
        let config = &self.inner.config;
        let request = self
            .build_request(endpoint, options)
            .await
            .map_err(Failure::Immediate)?;

        let mut attempt: u32 = 0;
        loop {
            let error = match self.attempt(request.clone()).await {
                Ok(payload) => return Ok(payload),
                Err(e) => e,
            };

            if !error.is_retryable() {
                debug!(method = %request.method, endpoint, error = %error, "Request failed, not retrying");
                return Err(Failure::Immediate(error));
            }
            if attempt >= config.max_retries {
                warn!(method = %request.method, endpoint, attempts = attempt + 1, error = %error, "Request failed after retries");
                return Err(Failure::Exhausted(error));
            }

            let delay = config.retry_delay_for(attempt);
            warn!(
                method = %request.method,
                endpoint,
                retry = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Request failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn build_request(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        headers.extend(options.headers.iter().cloned());

        if options.auth != AuthMode::None {
            let token = self.inner.session.lock().await.token().map(str::to_string);
            match token {
                Some(token) => headers.push(("Authorization".to_string(), format!("Bearer {}", token))),
                None if options.auth == AuthMode::Required => return Err(ApiError::SessionRequired),
                None => {}
            }
        }

        Ok(HttpRequest {
            method: options.method,
            url: self.inner.config.url_for(endpoint),
            headers,
            body: options.body.clone(),
        })
    }

    /// One bounded round-trip.
    async fn attempt(&self, request: HttpRequest) -> Result<Value, ApiError> {
        let timeout = self.inner.config.timeout;
        let response = match tokio::time::timeout(timeout, self.inner.transport.send(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(ApiError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };
        parse_response(response, self.inner.config.legacy_error_markers)
    }

    /// Stale cache first, then the offline snapshot.
    async fn read_fallback(&self, endpoint: &str, key: &str) -> Option<Sourced<Value>> {
        if let Some(stale) = self.inner.cache.lock().await.get_stale(key) {
            return Some(Sourced::new(stale, ResponseSource::StaleCache));
        }

        let store = self.inner.snapshot.as_ref()?;
        match store.load() {
            Ok(Some(snapshot)) => snapshot
                .response_for(endpoint)
                .map(|payload| Sourced::new(payload, ResponseSource::Snapshot)),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load offline snapshot");
                None
            }
        }
    }

    // ===== Health =====

    /// Probe `/health` once, bypassing retries and the cache.
    pub async fn health_check(&self) -> Result<HealthReport, ApiError> {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: self.inner.config.url_for(HEALTH_ENDPOINT),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: RequestBody::Empty,
        };
        let timeout = self.inner.config.health_check_timeout;
        let monitor = &self.inner.monitor;

        let response = match tokio::time::timeout(timeout, self.inner.transport.send(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!(error = %e, "Health check could not reach backend");
                monitor.mark_disconnected();
                return Err(e.into());
            }
            Err(_) => {
                debug!("Health check timed out");
                monitor.mark_disconnected();
                return Err(ApiError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };

        if !response.is_success() {
            debug!(status = response.status, "Health check failed");
            monitor.mark_disconnected();
            return Err(ApiError::from_response(
                response.status,
                &response.body,
                self.inner.config.legacy_error_markers,
            ));
        }

        // A reachable backend with an unexpected body still counts as up
        let report: HealthReport = serde_json::from_str(&response.body).unwrap_or_default();
        if report.database_down() {
            monitor.mark_error();
        } else {
            monitor.mark_connected();
        }
        Ok(report)
    }

    /// Re-probe the backend now instead of waiting for the next tick.
    pub async fn reconnect(&self) -> ConnectionStatus {
        info!("Reconnecting to backend");
        if let Err(e) = self.health_check().await {
            debug!(error = %e, "Reconnect attempt failed");
        }
        self.connection_status()
    }

    /// Poll `/health` every `health_check_interval`, starting immediately.
    pub fn start_health_monitor(&self) -> HealthMonitor {
        let client = self.clone();
        let period = self.inner.config.health_check_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = client.health_check().await {
                    debug!(error = %e, "Periodic health check failed");
                }
            }
        });
        info!(interval_secs = period.as_secs(), "Health monitor started");
        HealthMonitor::from_handle(handle)
    }
}

fn parse_response(response: HttpResponse, legacy_markers: bool) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_response(
            response.status,
            &response.body,
            legacy_markers,
        ));
    }
    if response.body.trim().is_empty() {
        return Ok(json!({"success": true}));
    }
    serde_json::from_str(&response.body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
}
