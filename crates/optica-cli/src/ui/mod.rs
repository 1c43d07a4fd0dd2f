//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title and status bars, overlays
//! - `input`: keyboard handling
//! - `styles`: colors and text styles
//! - `tabs`: content of the catalog, bookings and store tabs

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
