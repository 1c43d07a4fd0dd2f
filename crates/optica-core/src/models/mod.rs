//! Data models for catalog entities.
//!
//! This module contains the payloads the client exchanges with the backend:
//!
//! - `Product`, `ProductDraft`, `ImageUpload`, `ProductFilter`: the eyewear catalog
//! - `Appointment`, `NewAppointment`, `AppointmentStatus`: exam and fitting bookings
//! - `Settings`: store contact details and opening hours
//! - `VisitorEvent`, `AnalyticsStats`, `HealthReport`: analytics and health
//! - `envelope`: the `{"success": ..}` wrappers around each of the above

pub mod analytics;
pub mod appointment;
pub mod envelope;
pub mod product;
pub mod settings;

pub use analytics::{AnalyticsStats, HealthReport, PageCount, VisitorEvent};
pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use envelope::{
    AckResponse, AdminProfile, AppointmentResponse, AppointmentsResponse, LoginResponse,
    ProductResponse, ProductsResponse, SettingsResponse, StatsResponse,
};
pub use product::{ImageUpload, Product, ProductCategory, ProductDraft, ProductFilter};
pub use settings::{OpeningHours, Settings};
