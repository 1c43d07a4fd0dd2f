use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A storefront page view reported to the backend.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorEvent {
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl VisitorEvent {
    pub fn page_view(page: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            referrer: None,
            user_agent: None,
            session_id: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageCount {
    pub page: String,
    #[serde(default)]
    pub count: u64,
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsStats {
    #[serde(rename = "totalVisitors", default)]
    pub total_visitors: u64,
    #[serde(rename = "uniqueVisitors", default)]
    pub unique_visitors: u64,
    #[serde(rename = "todayVisitors", default)]
    pub today_visitors: u64,
    #[serde(rename = "pageViews", default)]
    pub page_views: u64,
    #[serde(rename = "topPages", default)]
    pub top_pages: Vec<PageCount>,
    #[cfg_attr(feature = "ts", ts(skip))]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of the backend's `/health` endpoint.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[cfg_attr(feature = "ts", ts(skip))]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthReport {
    /// The API answered but reports its own storage as down.
    pub fn database_down(&self) -> bool {
        matches!(
            self.database.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("disconnected" | "down" | "error" | "unavailable")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_tolerate_missing_fields() {
        let stats: AnalyticsStats =
            serde_json::from_str(r#"{"totalVisitors":120,"topPages":[{"page":"/"}]}"#).unwrap();
        assert_eq!(stats.total_visitors, 120);
        assert_eq!(stats.today_visitors, 0);
        assert_eq!(stats.top_pages[0].count, 0);
    }

    #[test]
    fn test_health_database_down() {
        let up: HealthReport =
            serde_json::from_str(r#"{"status":"ok","database":"connected"}"#).unwrap();
        assert!(!up.database_down());

        let down: HealthReport =
            serde_json::from_str(r#"{"status":"degraded","database":"Disconnected"}"#).unwrap();
        assert!(down.database_down());

        assert!(!HealthReport::default().database_down());
    }

    #[test]
    fn test_visitor_event_serializes_camel_case() {
        let mut event = VisitorEvent::page_view("/catalogo");
        event.session_id = Some("s-1".to_string());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["page"], "/catalogo");
        assert_eq!(value["sessionId"], "s-1");
        assert!(value.get("referrer").is_none());
    }
}
