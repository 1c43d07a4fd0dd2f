mod support;

use std::time::Duration;

use optica_core::api::{ClientBuilder, HttpMethod, RequestBody, RequestOptions};
use optica_core::models::{ImageUpload, NewAppointment, ProductDraft, ProductFilter, VisitorEvent};
use optica_core::snapshot::OfflineSnapshot;
use optica_core::{
    ApiError, ClientEvent, ConnectionStatus, ResponseSource, Session, SessionData, SnapshotStore,
};
use serde_json::json;
use tokio::sync::broadcast;

use support::{client, config, scratch_dir, Reply, ScriptedTransport};

fn products_body() -> serde_json::Value {
    json!({
        "success": true,
        "products": [
            {"_id": "p1", "name": "Aviator Classic", "price": 349.0, "category": "sunglasses"},
            {"_id": "p2", "name": "Round Titanium", "price": 520.0, "category": "eyeglasses"}
        ],
        "total": 2
    })
}

fn booking() -> NewAppointment {
    NewAppointment {
        name: "Maria Souza".to_string(),
        phone: "+55 11 98765-4321".to_string(),
        date: "2026-11-03".to_string(),
        time: Some("14:30".to_string()),
        ..Default::default()
    }
}

fn logged_in_session() -> Session {
    let mut session = Session::in_memory();
    session.update(SessionData::new("tok-123", "admin"));
    session
}

fn drain(rx: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn fresh_cache_answers_without_network() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(products_body()));
    let api = client(&transport);

    let first = api.get_products(&ProductFilter::default()).await.unwrap();
    let second = api.get_products(&ProductFilter::default()).await.unwrap();

    assert_eq!(first.source, ResponseSource::Network);
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(second.data.len(), 2);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(
        transport.last_request().unwrap().url,
        "http://shop.test/api/products"
    );
}

#[tokio::test(start_paused = true)]
async fn cache_entry_expires_after_ttl() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(products_body()));
    transport.push(Reply::ok(products_body()));
    let api = client(&transport);

    api.get_products(&ProductFilter::default()).await.unwrap();
    tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;
    let again = api.get_products(&ProductFilter::default()).await.unwrap();

    assert_eq!(again.source, ResponseSource::Network);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn clear_cache_forces_refetch() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(products_body()));
    transport.push(Reply::ok(products_body()));
    let api = client(&transport);

    api.get_products(&ProductFilter::default()).await.unwrap();
    assert!(api.get_from_cache("GET:/products:").await.is_some());

    api.clear_cache().await;
    assert!(api.get_from_cache("GET:/products:").await.is_none());

    api.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(404, json!({"success": false, "message": "Product not found"})));
    transport.push(Reply::json(429, json!({"success": false, "message": "Slow down"})));
    let api = client(&transport);

    let err = api.get_product("missing1").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "Product not found"));
    assert_eq!(transport.call_count(), 1);

    let err = api
        .request("/products", RequestOptions::post(json!({"name": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ClientError { status: 429, .. }));
    assert_eq!(transport.call_count(), 2);
    assert_eq!(api.connection_status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn server_errors_retry_with_exponential_backoff() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::json(500, json!({"success": false, "message": "boom"})));
    let api = client(&transport);

    let err = api
        .request("/analytics/visit", RequestOptions::post(json!({"page": "/"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ServerError { status: 500, .. }));
    assert_eq!(transport.call_count(), 4);
    assert_eq!(transport.gaps_ms(), vec![1000, 2000, 4000]);
    assert_eq!(api.connection_status(), ConnectionStatus::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn hung_attempts_time_out_and_retry() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::Hang);
    let api = client(&transport);

    let err = api
        .request("/analytics/visit", RequestOptions::post(json!({"page": "/"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Timeout { timeout_ms: 10_000 }));
    assert_eq!(transport.call_count(), 4);
    // Each gap is the 10s attempt bound plus the backoff delay
    assert_eq!(transport.gaps_ms(), vec![11_000, 12_000, 14_000]);
}

#[tokio::test(start_paused = true)]
async fn recovers_when_a_retry_succeeds() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::NetworkError);
    transport.push(Reply::json(502, json!({"message": "bad gateway"})));
    transport.push(Reply::ok(products_body()));
    let api = client(&transport);

    let products = api.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(products.source, ResponseSource::Network);
    assert_eq!(transport.call_count(), 3);
    assert_eq!(api.connection_status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn exhausted_get_falls_back_to_stale_cache() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(products_body()));
    let api = client(&transport);

    api.get_products(&ProductFilter::default()).await.unwrap();
    tokio::time::advance(Duration::from_secs(10 * 60)).await;

    let stale = api.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(stale.source, ResponseSource::StaleCache);
    assert_eq!(stale.data[0].name, "Aviator Classic");
    assert_eq!(transport.call_count(), 1 + 4);
    assert!(api.is_offline());
}

fn search(term: String) -> ProductFilter {
    ProductFilter {
        search: Some(term),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn stale_fallback_ends_after_retention_window() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::ok(products_body()));
    let api = client(&transport);

    for i in 0..50 {
        api.get_products(&search(format!("q{}", i))).await.unwrap();
    }
    tokio::time::advance(Duration::from_secs(60 * 60)).await;
    for i in 50..100 {
        api.get_products(&search(format!("q{}", i))).await.unwrap();
    }
    tokio::time::advance(Duration::from_secs(10 * 60)).await;

    transport.otherwise(Reply::NetworkError);
    let recent = api.get_products(&search("q99".to_string())).await.unwrap();
    assert_eq!(recent.source, ResponseSource::StaleCache);

    let retired = api.get_products(&search("q0".to_string())).await;
    assert!(matches!(retired, Err(ApiError::Network(_))));
}

#[tokio::test(start_paused = true)]
async fn cache_holds_at_most_the_configured_entries() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::ok(products_body()));
    let mut config = config();
    config.cache_max_entries = 4;
    let api = ClientBuilder::new(config).build(transport.clone());

    for i in 0..6 {
        api.get_products(&search(format!("q{}", i))).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
    }

    assert!(api.get_from_cache("GET:/products?search=q0:").await.is_none());
    assert!(api.get_from_cache("GET:/products?search=q1:").await.is_none());
    for i in 2..6 {
        let key = format!("GET:/products?search=q{}:", i);
        assert!(api.get_from_cache(&key).await.is_some(), "{} evicted", key);
    }
}

#[tokio::test(start_paused = true)]
async fn offline_reads_probe_network_before_cache() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(products_body()));
    let api = client(&transport);

    api.get_products(&ProductFilter::default()).await.unwrap();
    // A failed write leaves the client offline
    let _ = api
        .request("/analytics/visit", RequestOptions::post(json!({"page": "/"})))
        .await;
    assert!(api.is_offline());
    let before = transport.call_count();

    let again = api.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(again.source, ResponseSource::StaleCache);
    assert_eq!(transport.call_count(), before + 4);
}

#[tokio::test(start_paused = true)]
async fn exhausted_get_without_cache_uses_offline_snapshot() {
    let dir = scratch_dir("snapshot-fallback");
    let store = SnapshotStore::new(&dir);
    let snapshot: OfflineSnapshot = serde_json::from_value(json!({
        "products": [{"_id": "s1", "name": "Cat Eye Tortoise", "price": 280.0}],
        "saved_at": "2026-10-01T12:00:00Z"
    }))
    .unwrap();
    store.save(&snapshot).unwrap();

    let transport = ScriptedTransport::new();
    let api = ClientBuilder::new(config())
        .snapshot_store(store)
        .build(transport.clone());

    let products = api.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(products.source, ResponseSource::Snapshot);
    assert_eq!(products.data.len(), 1);
    assert_eq!(products.data[0].id, "s1");

    // Endpoints the snapshot does not cover still fail
    let err = api.request("/health/deep", RequestOptions::get()).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test(start_paused = true)]
async fn exhausted_get_without_fallback_propagates_error() {
    let transport = ScriptedTransport::new();
    let api = client(&transport);

    let err = api.get_products(&ProductFilter::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn database_outage_on_settings_returns_synthetic_empty() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(
        500,
        json!({"success": false, "message": "MongoServerSelectionError: connect ECONNREFUSED 127.0.0.1:27017"}),
    ));
    let api = client(&transport);
    let mut status = api.watch_status();

    let payload = api
        .request("/admin/settings", RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(
        payload,
        json!({"success": true, "settings": {}, "message": "Database not available"})
    );
    assert_eq!(transport.call_count(), 1);
    assert_eq!(api.connection_status(), ConnectionStatus::Error);
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), ConnectionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn structured_database_code_degrades_typed_reads() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(
        503,
        json!({"success": false, "error": {"code": "DATABASE_UNAVAILABLE", "message": "store offline"}}),
    ));
    let api = client(&transport);

    let products = api.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(products.source, ResponseSource::Synthetic);
    assert!(products.data.is_empty());

    // Synthetic payloads are not cached
    assert!(api.get_from_cache("GET:/products:").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn database_outage_on_write_is_an_error() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(
        500,
        json!({"success": false, "code": "DATABASE_UNAVAILABLE", "message": "store offline"}),
    ));
    let api = client(&transport);

    let err = api.create_appointment(&booking()).await.unwrap_err();
    assert!(matches!(err, ApiError::DatabaseUnavailable(_)));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_booking_fails_after_four_attempts() {
    let transport = ScriptedTransport::new();
    let api = client(&transport);

    let err = api.create_appointment(&booking()).await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(transport.call_count(), 4);
    let request = transport.last_request().unwrap();
    assert_eq!(request.url, "http://shop.test/api/appointments");
    assert!(request.header("Authorization").is_none());
}

#[tokio::test(start_paused = true)]
async fn invalid_booking_never_reaches_backend() {
    let transport = ScriptedTransport::new();
    let api = client(&transport);

    let mut bad = booking();
    bad.phone = "123".to_string();
    let err = api.create_appointment(&bad).await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_token_forces_logout() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(401, json!({"success": false, "message": "jwt expired"})));
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());
    let mut events = api.subscribe();

    let err = api.get_appointments().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(
        transport.last_request().unwrap().header("Authorization"),
        Some("Bearer tok-123")
    );
    assert!(!api.is_authenticated().await);
    assert!(drain(&mut events).contains(&ClientEvent::LoginRequired));
}

#[tokio::test(start_paused = true)]
async fn forbidden_also_forces_logout() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(403, json!({"success": false, "message": "not an admin"})));
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());
    let mut events = api.subscribe();

    let err = api.delete_product("p1").await.unwrap_err();
    assert!(matches!(err, ApiError::AccessDenied(ref m) if m == "not an admin"));
    assert!(!api.is_authenticated().await);
    assert!(drain(&mut events).contains(&ClientEvent::LoginRequired));
}

#[tokio::test(start_paused = true)]
async fn rejected_token_mentioning_the_database_still_logs_out() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(
        401,
        json!({"success": false, "message": "MongoDB session lookup failed"}),
    ));
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());
    let mut events = api.subscribe();

    let err = api.get_appointments().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(transport.call_count(), 1);
    assert!(!api.is_authenticated().await);
    assert!(drain(&mut events).contains(&ClientEvent::LoginRequired));
}

#[tokio::test(start_paused = true)]
async fn admin_read_without_session_asks_for_login() {
    let transport = ScriptedTransport::new();
    let api = client(&transport);
    let mut events = api.subscribe();

    let err = api.get_analytics_stats().await.unwrap_err();

    assert!(matches!(err, ApiError::SessionRequired));
    assert_eq!(transport.call_count(), 0);
    assert_eq!(drain(&mut events), vec![ClientEvent::LoginRequired]);
    assert_eq!(api.connection_status(), ConnectionStatus::Unknown);
}

#[tokio::test(start_paused = true)]
async fn login_token_is_sent_on_admin_writes() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(json!({
        "success": true,
        "token": "jwt-abc",
        "admin": {"username": "ana"}
    })));
    transport.push(Reply::ok(json!({
        "success": true,
        "settings": {"storeName": "Ótica Visão", "phone": "11 3333-4444"}
    })));
    let api = client(&transport);

    let session = api.login("ana", "segredo").await.unwrap();
    assert_eq!(session.username, "ana");
    assert!(api.is_authenticated().await);

    let login = &transport.calls()[0].request;
    assert_eq!(login.url, "http://shop.test/api/admin/login");
    assert!(login.header("Authorization").is_none());

    let settings = optica_core::models::Settings {
        store_name: Some("Ótica Visão".to_string()),
        ..Default::default()
    };
    let saved = api.update_settings(&settings).await.unwrap();
    assert_eq!(saved.display_name(), "Ótica Visão");
    assert_eq!(
        transport.last_request().unwrap().header("Authorization"),
        Some("Bearer jwt-abc")
    );

    api.logout().await;
    assert!(!api.is_authenticated().await);
}

#[tokio::test(start_paused = true)]
async fn unsuccessful_envelope_is_rejected() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(json!({"success": false, "message": "Horário indisponível"})));
    let api = client(&transport);

    let err = api.create_appointment(&booking()).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(ref m) if m == "Horário indisponível"));
}

#[tokio::test(start_paused = true)]
async fn health_check_tracks_status_transitions() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(json!({"status": "ok", "database": "connected"})));
    transport.push(Reply::NetworkError);
    transport.push(Reply::ok(json!({"status": "degraded", "database": "disconnected"})));
    transport.push(Reply::json(503, json!({"message": "maintenance"})));
    transport.push(Reply::Status(200, String::new()));
    let api = client(&transport);
    let mut events = api.subscribe();

    let report = api.health_check().await.unwrap();
    assert!(!report.database_down());
    assert!(api.is_connected());

    assert!(api.health_check().await.is_err());
    assert_eq!(api.connection_status(), ConnectionStatus::Disconnected);

    assert!(api.health_check().await.unwrap().database_down());
    assert_eq!(api.connection_status(), ConnectionStatus::Error);

    assert!(api.health_check().await.is_err());
    assert_eq!(api.connection_status(), ConnectionStatus::Disconnected);

    assert_eq!(api.reconnect().await, ConnectionStatus::Connected);

    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::ConnectivityChanged(ConnectionStatus::Connected),
            ClientEvent::ConnectivityChanged(ConnectionStatus::Disconnected),
            ClientEvent::ConnectivityChanged(ConnectionStatus::Error),
            ClientEvent::ConnectivityChanged(ConnectionStatus::Disconnected),
            ClientEvent::ConnectivityChanged(ConnectionStatus::Connected),
        ]
    );
    assert!(transport
        .calls()
        .iter()
        .all(|c| c.request.url == "http://shop.test/api/health"));
}

#[tokio::test(start_paused = true)]
async fn every_failed_health_check_reports_disconnected() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::json(503, json!({"message": "maintenance"})));
    let api = client(&transport);
    let mut events = api.subscribe();

    assert!(api.health_check().await.is_err());
    assert!(api.health_check().await.is_err());

    assert_eq!(api.connection_status(), ConnectionStatus::Disconnected);
    assert!(api.is_offline());
    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::ConnectivityChanged(ConnectionStatus::Disconnected),
            ClientEvent::ConnectivityChanged(ConnectionStatus::Disconnected),
        ]
    );
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn hung_health_check_times_out_quickly() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::Hang);
    let api = client(&transport);

    let started = tokio::time::Instant::now();
    let err = api.health_check().await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout { timeout_ms: 5_000 }));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    assert_eq!(transport.call_count(), 1);
    assert!(api.is_offline());
}

#[tokio::test(start_paused = true)]
async fn health_monitor_polls_until_stopped() {
    let transport = ScriptedTransport::new();
    transport.otherwise(Reply::ok(json!({"status": "ok"})));
    let api = client(&transport);

    let monitor = api.start_health_monitor();
    assert!(monitor.is_running());

    // Ticks at 0s, 30s and 60s
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(transport.call_count(), 3);
    assert!(api.is_connected());

    monitor.stop();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn product_with_images_is_sent_as_multipart() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::json(
        201,
        json!({"success": true, "product": {"_id": "p7", "name": "Cat Eye", "price": 410.0}}),
    ));
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());

    let draft = ProductDraft {
        name: Some("Cat Eye".to_string()),
        price: Some(410.0),
        ..Default::default()
    };
    let images = vec![ImageUpload::new("front.png", vec![0x89, b'P', b'N', b'G'])];
    let product = api.create_product(&draft, images).await.unwrap();
    assert_eq!(product.id, "p7");

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert!(request.url.ends_with("/api/products"));
    assert_eq!(request.header("Authorization"), Some("Bearer tok-123"));
    let RequestBody::Multipart(form) = request.body else {
        panic!("expected a multipart body");
    };
    assert_eq!(form.fields[0].0, "data");
    let data: serde_json::Value = serde_json::from_str(&form.fields[0].1).unwrap();
    assert_eq!(data["name"], "Cat Eye");
    assert_eq!(form.files.len(), 1);
    assert_eq!(form.files[0].field, "images");
    assert_eq!(form.files[0].content_type, "image/png");
}

#[tokio::test(start_paused = true)]
async fn unnamed_product_is_rejected_locally() {
    let transport = ScriptedTransport::new();
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());

    let err = api
        .create_product(&ProductDraft::default(), Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn visits_are_tracked_without_credentials() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(json!({"success": true})));
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());

    api.track_visitor(&VisitorEvent::page_view("/catalogo"))
        .await
        .unwrap();

    let request = transport.last_request().unwrap();
    assert!(request.url.ends_with("/api/analytics/visit"));
    assert!(request.header("Authorization").is_none());
    let RequestBody::Json(body) = request.body else {
        panic!("expected a JSON body");
    };
    assert_eq!(body["page"], "/catalogo");
}

#[tokio::test(start_paused = true)]
async fn primed_cache_entry_is_served() {
    let transport = ScriptedTransport::new();
    let api = client(&transport);

    api.set_cache(
        "GET:/admin/settings:",
        json!({"success": true, "settings": {"storeName": "Ótica Primavera"}}),
    )
    .await;

    let settings = api.get_settings().await.unwrap();
    assert_eq!(settings.source, ResponseSource::Cache);
    assert_eq!(settings.data.display_name(), "Ótica Primavera");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn product_update_without_images_is_json() {
    let transport = ScriptedTransport::new();
    transport.push(Reply::ok(
        json!({"success": true, "product": {"_id": "p1", "name": "Aviator Classic", "price": 299.0}}),
    ));
    let api = ClientBuilder::new(config())
        .session(logged_in_session())
        .build(transport.clone());

    let draft = ProductDraft {
        price: Some(299.0),
        ..Default::default()
    };
    let product = api.update_product("p1", &draft, Vec::new()).await.unwrap();
    assert_eq!(product.price, 299.0);

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Put);
    assert!(request.url.ends_with("/api/products/p1"));
    assert_eq!(request.body, RequestBody::Json(json!({"price": 299.0})));
}
