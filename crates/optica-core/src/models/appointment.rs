use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "completed" | "done" => Some(Self::Completed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the appointment still needs attention from the store.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Requested day, `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[cfg_attr(feature = "ts", ts(skip))]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Appointment {
    pub fn requested_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// "Mar 04, 2026 @ 10:30", or the raw date if it does not parse
    pub fn slot_display(&self) -> String {
        let day = match self.requested_date() {
            Some(d) => d.format("%b %d, %Y").to_string(),
            None if self.date.is_empty() => "TBD".to_string(),
            None => self.date.clone(),
        };
        match self.time.as_deref() {
            Some(t) if !t.is_empty() => format!("{} @ {}", day, t),
            _ => day,
        }
    }
}

/// Booking request submitted from the storefront.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAppointment {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Minimum digits for a phone number to be reachable by the store.
const MIN_PHONE_DIGITS: usize = 7;

impl NewAppointment {
    /// Check the fields the backend rejects, so obviously bad bookings fail
    /// before leaving the machine.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        let digits = self.phone.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < MIN_PHONE_DIGITS {
            return Err(format!("phone number '{}' is too short", self.phone));
        }
        if NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err() {
            return Err(format!("date '{}' is not YYYY-MM-DD", self.date));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> NewAppointment {
        NewAppointment {
            name: "Ana Souza".to_string(),
            phone: "+55 (11) 98765-4321".to_string(),
            date: "2026-03-04".to_string(),
            time: Some("10:30".to_string()),
            service: Some("Eye exam".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(AppointmentStatus::from_str("Confirmed"), Some(AppointmentStatus::Confirmed));
        assert_eq!(AppointmentStatus::from_str("canceled"), Some(AppointmentStatus::Cancelled));
        assert_eq!(AppointmentStatus::from_str("maybe"), None);
        assert!(AppointmentStatus::Pending.is_open());
        assert!(!AppointmentStatus::Completed.is_open());
    }

    #[test]
    fn test_appointment_defaults_to_pending() {
        let json = r#"{"_id":"a1","name":"Ana","phone":"11987654321","date":"2026-03-04"}"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
        assert_eq!(appt.slot_display(), "Mar 04, 2026");
    }

    #[test]
    fn test_slot_display_with_time_and_bad_date() {
        let json = r#"{"_id":"a1","name":"Ana","date":"next week","time":"09:00","status":"confirmed"}"#;
        let appt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appt.slot_display(), "next week @ 09:00");
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn test_validate_booking() {
        assert!(booking().validate().is_ok());

        let mut missing_name = booking();
        missing_name.name = "  ".to_string();
        assert!(missing_name.validate().is_err());

        let mut short_phone = booking();
        short_phone.phone = "123".to_string();
        assert!(short_phone.validate().is_err());

        let mut bad_date = booking();
        bad_date.date = "04/03/2026".to_string();
        assert!(bad_date.validate().is_err());
    }
}
