//! Offline snapshot of the catalog.
//!
//! The whole client-visible state (products, appointments, settings,
//! analytics) is written as one document after every admin mutation and
//! read back by the API client when the backend cannot be reached.
//! Nothing ties the snapshot to the backend store; the two can drift.

pub mod crypto;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{AnalyticsStats, Appointment, Product, ProductFilter, Settings};

pub use store::SnapshotStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineSnapshot {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub analytics: AnalyticsStats,
    pub saved_at: DateTime<Utc>,
}

impl Default for OfflineSnapshot {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            appointments: Vec::new(),
            settings: Settings::default(),
            analytics: AnalyticsStats::default(),
            saved_at: Utc::now(),
        }
    }
}

impl OfflineSnapshot {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    /// Render the payload the backend would have returned for a GET of
    /// `endpoint`, or `None` for endpoints the snapshot does not cover.
    pub fn response_for(&self, endpoint: &str) -> Option<Value> {
        let (path, query) = endpoint.split_once('?').unwrap_or((endpoint, ""));
        let path = path.trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let payload = match segments.as_slice() {
            ["products"] => {
                let filter = ProductFilter::from_query(query);
                let listed: Vec<&Product> =
                    self.products.iter().filter(|p| filter.matches(p)).collect();
                json!({
                    "success": true,
                    "total": listed.len(),
                    "products": listed,
                })
            }
            ["products", id] => {
                let product = self.products.iter().find(|p| p.id == *id)?;
                json!({"success": true, "product": product})
            }
            ["appointments"] | ["admin", "appointments"] => json!({
                "success": true,
                "appointments": self.appointments,
            }),
            ["settings"] | ["admin", "settings"] => json!({
                "success": true,
                "settings": self.settings,
            }),
            ["analytics", "stats"] | ["admin", "stats"] => json!({
                "success": true,
                "stats": self.analytics,
            }),
            _ => return None,
        };

        let mut payload = payload;
        if let Value::Object(ref mut map) = payload {
            map.insert("offline".to_string(), Value::Bool(true));
        }
        Some(payload)
    }

    pub fn upsert_product(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    pub fn remove_product(&mut self, id: &str) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        self.products.len() != before
    }

    pub fn upsert_appointment(&mut self, appointment: Appointment) {
        match self.appointments.iter_mut().find(|a| a.id == appointment.id) {
            Some(existing) => *existing = appointment,
            None => self.appointments.push(appointment),
        }
    }

    pub fn touch(&mut self) {
        self.saved_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn product(id: &str, name: &str) -> Product {
        serde_json::from_value(json!({"_id": id, "name": name, "price": 10.0})).unwrap()
    }

    fn snapshot() -> OfflineSnapshot {
        OfflineSnapshot {
            products: vec![product("p1", "Round"), product("p2", "Square")],
            ..Default::default()
        }
    }

    #[test]
    fn test_products_view() {
        let view = snapshot().response_for("/products").unwrap();
        assert_eq!(view["success"], true);
        assert_eq!(view["offline"], true);
        assert_eq!(view["total"], 2);
        assert_eq!(view["products"][1]["name"], "Square");
    }

    #[test]
    fn test_products_view_applies_query_filter() {
        let mut snap = snapshot();
        snap.products[1].featured = true;

        let view = snap.response_for("/products?featured=true").unwrap();
        assert_eq!(view["total"], 1);
        assert_eq!(view["products"][0]["_id"], "p2");

        let view = snap.response_for("/products?search=round").unwrap();
        assert_eq!(view["total"], 1);
        assert_eq!(view["products"][0]["_id"], "p1");

        let view = snap.response_for("/products?category=sunglasses").unwrap();
        assert_eq!(view["total"], 0);
        assert_eq!(view["products"], json!([]));
    }

    #[test]
    fn test_single_product_view() {
        let snap = snapshot();
        assert_eq!(snap.response_for("/products/p2").unwrap()["product"]["_id"], "p2");
        assert!(snap.response_for("/products/missing").is_none());
    }

    #[test]
    fn test_settings_and_stats_views() {
        let snap = snapshot();
        assert_eq!(snap.response_for("/admin/settings").unwrap()["settings"], json!({}));
        assert_eq!(
            snap.response_for("/analytics/stats").unwrap()["stats"]["totalVisitors"],
            0
        );
        assert!(snap.response_for("/health").is_none());
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut snap = snapshot();
        snap.upsert_product(product("p1", "Round XL"));
        snap.upsert_product(product("p3", "Oval"));
        assert_eq!(snap.products.len(), 3);
        assert_eq!(snap.products[0].name, "Round XL");

        assert!(snap.remove_product("p2"));
        assert!(!snap.remove_product("p2"));
        assert_eq!(snap.products.len(), 2);
    }

    #[test]
    fn test_age_display() {
        let mut snap = OfflineSnapshot::default();
        assert_eq!(snap.age_display(), "just now");

        snap.saved_at = Utc::now() - Duration::minutes(95);
        assert_eq!(snap.age_display(), "2h ago");

        snap.saved_at = Utc::now() - Duration::hours(30);
        assert_eq!(snap.age_display(), "1d ago");

        // Future timestamps from clock skew
        snap.saved_at = Utc::now() + Duration::minutes(10);
        assert_eq!(snap.age_display(), "just now");
    }
}
