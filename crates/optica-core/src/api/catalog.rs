//! Typed endpoints of the catalog backend.

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::SessionData;
use crate::models::{
    AckResponse, AnalyticsStats, Appointment, AppointmentResponse, AppointmentStatus,
    AppointmentsResponse, ImageUpload, LoginResponse, NewAppointment, Product, ProductDraft,
    ProductFilter, ProductResponse, ProductsResponse, Settings, SettingsResponse, StatsResponse,
    VisitorEvent,
};
use crate::snapshot::OfflineSnapshot;

use super::client::{ApiClient, AuthMode, RequestOptions, ResponseSource, Sourced};
use super::transport::{FilePart, HttpMethod, MultipartForm, Transport};
use super::ApiError;

const LOGIN_ENDPOINT: &str = "/admin/login";
const PRODUCTS_ENDPOINT: &str = "/products";
const APPOINTMENTS_ENDPOINT: &str = "/appointments";
const SETTINGS_ENDPOINT: &str = "/admin/settings";
const VISIT_ENDPOINT: &str = "/analytics/visit";
const STATS_ENDPOINT: &str = "/analytics/stats";

impl<T: Transport> ApiClient<T> {
    // ===== Admin session =====

    /// Authenticate and keep the returned bearer token for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionData, ApiError> {
        let body = json!({"username": username, "password": password});
        let payload = self.request(LOGIN_ENDPOINT, RequestOptions::post(body)).await?;
        let response: LoginResponse = decode(payload, "login")?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("No token in login response".to_string()))?;
        let name = response
            .admin
            .map(|a| a.username)
            .unwrap_or_else(|| username.to_string());

        let data = SessionData::new(token, name);
        self.store_session(data.clone()).await;
        info!(username = %data.username, "Logged in");
        Ok(data)
    }

    /// Drop the session and everything cached under it.
    pub async fn logout(&self) {
        self.clear_session().await;
        self.clear_cache().await;
        info!("Logged out");
    }

    // ===== Products =====

    pub async fn get_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Sourced<Vec<Product>>, ApiError> {
        let endpoint = format!("{}{}", PRODUCTS_ENDPOINT, filter.to_query());
        let payload = self.request_sourced(&endpoint, RequestOptions::get()).await?;
        payload.try_map(|p| decode::<ProductsResponse>(p, "products").map(|r| r.products))
    }

    /// `None` when the backend (or a synthetic empty answer) has no such product.
    pub async fn get_product(&self, id: &str) -> Result<Sourced<Option<Product>>, ApiError> {
        let endpoint = product_path(id)?;
        let payload = self.request_sourced(&endpoint, RequestOptions::get()).await?;
        payload.try_map(|p| decode::<ProductResponse>(p, "product").map(|r| r.product))
    }

    pub async fn create_product(
        &self,
        draft: &ProductDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Product, ApiError> {
        if draft.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(ApiError::InvalidRequest("product name is required".to_string()));
        }
        let options = product_write(HttpMethod::Post, draft, images)?;
        let payload = self.request(PRODUCTS_ENDPOINT, options).await?;
        let response: ProductResponse = decode(payload, "product")?;
        let product = response
            .product
            .ok_or_else(|| ApiError::InvalidResponse("Create returned no product".to_string()))?;
        let recorded = product.clone();
        self.record_offline(move |snapshot| snapshot.upsert_product(recorded))
            .await;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: &str,
        draft: &ProductDraft,
        images: Vec<ImageUpload>,
    ) -> Result<Product, ApiError> {
        let endpoint = product_path(id)?;
        let options = product_write(HttpMethod::Put, draft, images)?;
        let payload = self.request(&endpoint, options).await?;
        let response: ProductResponse = decode(payload, "product")?;
        let product = response
            .product
            .ok_or_else(|| ApiError::InvalidResponse("Update returned no product".to_string()))?;
        let recorded = product.clone();
        self.record_offline(move |snapshot| snapshot.upsert_product(recorded))
            .await;
        Ok(product)
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = product_path(id)?;
        let options = RequestOptions::delete().with_auth(AuthMode::Required);
        let payload = self.request(&endpoint, options).await?;
        decode::<AckResponse>(payload, "delete")?;
        let id = id.to_string();
        self.record_offline(move |snapshot| {
            snapshot.remove_product(&id);
        })
        .await;
        Ok(())
    }

    // ===== Appointments =====

    pub async fn get_appointments(&self) -> Result<Sourced<Vec<Appointment>>, ApiError> {
        let options = RequestOptions::get().with_auth(AuthMode::Required);
        let payload = self.request_sourced(APPOINTMENTS_ENDPOINT, options).await?;
        payload.try_map(|p| {
            decode::<AppointmentsResponse>(p, "appointments").map(|r| r.appointments)
        })
    }

    /// Book from the storefront. Invalid bookings fail before any request.
    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ApiError> {
        appointment.validate().map_err(ApiError::InvalidRequest)?;
        let body = to_body(appointment)?;
        let payload = self
            .request(APPOINTMENTS_ENDPOINT, RequestOptions::post(body))
            .await?;
        let response: AppointmentResponse = decode(payload, "appointment")?;
        let appointment = response
            .appointment
            .ok_or_else(|| ApiError::InvalidResponse("Booking returned no appointment".to_string()))?;
        let recorded = appointment.clone();
        self.record_offline(move |snapshot| snapshot.upsert_appointment(recorded))
            .await;
        Ok(appointment)
    }

    pub async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        validate_id(id)?;
        let endpoint = format!("{}/{}/status", APPOINTMENTS_ENDPOINT, id);
        let options = RequestOptions::json(HttpMethod::Patch, json!({"status": status.as_str()}))
            .with_auth(AuthMode::Required);
        let payload = self.request(&endpoint, options).await?;
        let response: AppointmentResponse = decode(payload, "appointment")?;
        let appointment = response
            .appointment
            .ok_or_else(|| ApiError::InvalidResponse("Update returned no appointment".to_string()))?;
        let recorded = appointment.clone();
        self.record_offline(move |snapshot| snapshot.upsert_appointment(recorded))
            .await;
        Ok(appointment)
    }

    // ===== Settings =====

    pub async fn get_settings(&self) -> Result<Sourced<Settings>, ApiError> {
        let options = RequestOptions::get().with_auth(AuthMode::Optional);
        let payload = self.request_sourced(SETTINGS_ENDPOINT, options).await?;
        payload.try_map(|p| decode::<SettingsResponse>(p, "settings").map(|r| r.settings))
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<Settings, ApiError> {
        let body = to_body(settings)?;
        let options =
            RequestOptions::json(HttpMethod::Put, body).with_auth(AuthMode::Required);
        let payload = self.request(SETTINGS_ENDPOINT, options).await?;
        let saved = decode::<SettingsResponse>(payload, "settings")?.settings;
        let recorded = saved.clone();
        self.record_offline(move |snapshot| snapshot.settings = recorded)
            .await;
        Ok(saved)
    }

    // ===== Analytics =====

    pub async fn track_visitor(&self, event: &VisitorEvent) -> Result<(), ApiError> {
        let body = to_body(event)?;
        let payload = self.request(VISIT_ENDPOINT, RequestOptions::post(body)).await?;
        decode::<AckResponse>(payload, "visit").map(|_| ())
    }

    pub async fn get_analytics_stats(&self) -> Result<Sourced<AnalyticsStats>, ApiError> {
        let options = RequestOptions::get().with_auth(AuthMode::Required);
        let payload = self.request_sourced(STATS_ENDPOINT, options).await?;
        payload.try_map(|p| decode::<StatsResponse>(p, "stats").map(|r| r.stats))
    }

    // ===== Offline snapshot =====

    /// Refresh the offline snapshot from the backend.
    ///
    /// Sections that could only be answered from a fallback keep their
    /// previous contents. Fails when no section could be refreshed.
    pub async fn sync_snapshot(&self) -> anyhow::Result<OfflineSnapshot> {
        let store = self
            .snapshot_store()
            .ok_or_else(|| anyhow!("No offline snapshot store configured"))?;

        let mut snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => OfflineSnapshot::default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable offline snapshot");
                OfflineSnapshot::default()
            }
        };

        let filter = ProductFilter::default();
        let (products, appointments, settings, stats) = futures::join!(
            self.get_products(&filter),
            self.get_appointments(),
            self.get_settings(),
            self.get_analytics_stats(),
        );

        let mut refreshed = 0;
        if let Some(products) = fresh(products, "products") {
            snapshot.products = products;
            refreshed += 1;
        }
        if let Some(appointments) = fresh(appointments, "appointments") {
            snapshot.appointments = appointments;
            refreshed += 1;
        }
        if let Some(settings) = fresh(settings, "settings") {
            snapshot.settings = settings;
            refreshed += 1;
        }
        if let Some(stats) = fresh(stats, "analytics") {
            snapshot.analytics = stats;
            refreshed += 1;
        }

        if refreshed == 0 {
            anyhow::bail!("Backend unreachable, offline snapshot left unchanged");
        }

        snapshot.touch();
        store.save(&snapshot)?;
        info!(
            sections = refreshed,
            products = snapshot.products.len(),
            "Offline snapshot updated"
        );
        Ok(snapshot)
    }

    /// Mirror a confirmed write into an existing offline snapshot. A missing
    /// snapshot is left for `sync_snapshot` to create in full. The load and
    /// save (and the key derivation for a sealed file) run on the blocking
    /// pool.
    async fn record_offline<F>(&self, apply: F)
    where
        F: FnOnce(&mut OfflineSnapshot) + Send + 'static,
    {
        let Some(store) = self.snapshot_store().cloned() else {
            return;
        };
        let written = tokio::task::spawn_blocking(move || match store.load() {
            Ok(Some(mut snapshot)) => {
                apply(&mut snapshot);
                if let Err(e) = store.save(&snapshot) {
                    warn!(error = %e, "Failed to record write in offline snapshot");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Offline snapshot unreadable, write not recorded"),
        })
        .await;
        if let Err(e) = written {
            warn!(error = %e, "Offline snapshot update did not finish");
        }
    }
}

/// Decode a backend envelope, turning `"success": false` into `Rejected`.
fn decode<R: DeserializeOwned>(payload: Value, what: &str) -> Result<R, ApiError> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request rejected")
            .to_string();
        return Err(ApiError::Rejected(message));
    }
    serde_json::from_value(payload)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {} response: {}", what, e)))
}

fn to_body<S: serde::Serialize>(value: &S) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

/// Ids are interpolated into paths, so only plain tokens are accepted.
fn validate_id(id: &str) -> Result<(), ApiError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!("invalid id '{}'", id)))
    }
}

fn product_path(id: &str) -> Result<String, ApiError> {
    validate_id(id)?;
    Ok(format!("{}/{}", PRODUCTS_ENDPOINT, id))
}

fn product_write(
    method: HttpMethod,
    draft: &ProductDraft,
    images: Vec<ImageUpload>,
) -> Result<RequestOptions, ApiError> {
    let body = to_body(draft)?;
    let options = if images.is_empty() {
        RequestOptions::json(method, body)
    } else {
        let files = images
            .into_iter()
            .map(|image| FilePart {
                field: "images".to_string(),
                file_name: image.file_name,
                content_type: image.content_type,
                bytes: image.bytes,
            })
            .collect();
        let form = MultipartForm {
            fields: vec![("data".to_string(), body.to_string())],
            files,
        };
        RequestOptions::multipart(method, form)
    };
    Ok(options.with_auth(AuthMode::Required))
}

/// Data worth persisting: answered by the backend, directly or via a fresh cache hit.
fn fresh<D>(result: Result<Sourced<D>, ApiError>, section: &str) -> Option<D> {
    match result {
        Ok(sourced) if matches!(sourced.source, ResponseSource::Network | ResponseSource::Cache) => {
            Some(sourced.data)
        }
        Ok(sourced) => {
            debug!(section, source = ?sourced.source, "Skipping degraded data for snapshot");
            None
        }
        Err(e) => {
            warn!(section, error = %e, "Failed to refresh snapshot section");
            None
        }
    }
}
