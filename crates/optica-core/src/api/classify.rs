//! Classification of backend-reported failures.
//!
//! The backend reports errors as `{"success": false, "error": {"code", "message"}}`
//! (or with `code`/`message` at the top level). The code is a closed set and
//! decides how the client reacts. Older deployments send only a free-text
//! message; for those, a fixed list of driver error markers is recognised
//! as "database unavailable" when legacy matching is enabled.

use serde_json::{Map, Value};

/// Message carried by the synthetic empty payload.
pub const DATABASE_UNAVAILABLE_MESSAGE: &str = "Database not available";

/// Substrings the old backend leaked from its database driver when the
/// store was unreachable. Matched case-insensitively.
const LEGACY_DATABASE_MARKERS: &[&str] = &[
    "mongodb",
    "mongonetworkerror",
    "mongoserverselectionerror",
    "econnrefused",
    "erefused",
    "buffering timed out",
    "database not available",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    DatabaseUnavailable,
    ValidationFailed,
    NotFound,
    Unauthorized,
    Internal,
}

impl BackendErrorKind {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "DATABASE_UNAVAILABLE" | "DB_UNAVAILABLE" => Some(Self::DatabaseUnavailable),
            "VALIDATION_FAILED" | "VALIDATION_ERROR" => Some(Self::ValidationFailed),
            "NOT_FOUND" => Some(Self::NotFound),
            "UNAUTHORIZED" | "FORBIDDEN" => Some(Self::Unauthorized),
            "INTERNAL" | "INTERNAL_ERROR" => Some(Self::Internal),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::DatabaseUnavailable => "DATABASE_UNAVAILABLE",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal => "INTERNAL",
        }
    }
}

/// The error fields pulled out of a failure body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportedError {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ReportedError {
    /// Resolve the kind. A present code always decides, even if unknown;
    /// marker matching only runs for code-less bodies.
    pub fn kind(&self, legacy_markers: bool, raw_body: &str) -> Option<BackendErrorKind> {
        if let Some(ref code) = self.code {
            return BackendErrorKind::from_code(code);
        }
        if legacy_markers && has_legacy_marker(raw_body) {
            return Some(BackendErrorKind::DatabaseUnavailable);
        }
        None
    }
}

pub fn parse_error_body(body: &str) -> ReportedError {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return ReportedError::default(),
    };

    let top_code = value.get("code").and_then(Value::as_str).map(str::to_string);
    let top_message = value.get("message").and_then(Value::as_str).map(str::to_string);

    match value.get("error") {
        Some(Value::Object(err)) => ReportedError {
            code: err
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(top_code),
            message: err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(top_message),
        },
        Some(Value::String(msg)) => ReportedError {
            code: top_code,
            message: top_message.or_else(|| Some(msg.clone())),
        },
        _ => ReportedError {
            code: top_code,
            message: top_message,
        },
    }
}

fn has_legacy_marker(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    LEGACY_DATABASE_MARKERS.iter().any(|m| lower.contains(m))
}

/// The payload a GET degrades to when the backend's database is down:
/// `{"success": true, <field>: <empty>, "message": "Database not available"}`,
/// where the field follows what the endpoint normally returns.
pub fn synthetic_empty(endpoint: &str) -> Value {
    let path = endpoint.split('?').next().unwrap_or(endpoint).trim_end_matches('/');
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let last = segments.next().unwrap_or_default();
    let parent = segments.next().unwrap_or_default();

    let (field, empty) = match (parent, last) {
        (_, "products") => ("products", Value::Array(Vec::new())),
        (_, "appointments") => ("appointments", Value::Array(Vec::new())),
        (_, "settings") => ("settings", Value::Object(Map::new())),
        (_, "stats") => ("stats", Value::Object(Map::new())),
        ("products", _) => ("product", Value::Null),
        ("appointments", _) => ("appointment", Value::Null),
        _ => ("data", Value::Null),
    };

    let mut payload = Map::new();
    payload.insert("success".to_string(), Value::Bool(true));
    payload.insert(field.to_string(), empty);
    payload.insert(
        "message".to_string(),
        Value::String(DATABASE_UNAVAILABLE_MESSAGE.to_string()),
    );
    Value::Object(payload)
}
