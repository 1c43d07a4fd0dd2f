use ratatui::style::{Color, Modifier, Style};

use optica_core::models::AppointmentStatus;
use optica_core::ConnectionStatus;

// Studio palette
pub const TEAL: Color = Color::Rgb(38, 166, 154);
pub const LEAF: Color = Color::Rgb(102, 187, 106);
pub const AMBER: Color = Color::Rgb(255, 179, 0);
pub const CORAL: Color = Color::Rgb(229, 83, 75);
pub const SLATE: Color = Color::Rgb(120, 124, 132);
pub const INK: Color = Color::Rgb(36, 48, 56);
pub const PAPER: Color = Color::Rgb(236, 236, 232);

pub fn title_style() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(INK).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(PAPER)
}

pub fn muted_style() -> Style {
    Style::default().fg(SLATE)
}

pub fn highlight_style() -> Style {
    Style::default().fg(AMBER)
}

pub fn success_style() -> Style {
    Style::default().fg(LEAF)
}

pub fn error_style() -> Style {
    Style::default().fg(CORAL)
}

pub fn active_tab_style() -> Style {
    title_style().add_modifier(Modifier::UNDERLINED)
}

pub fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { TEAL } else { SLATE })
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(24, 30, 36)).fg(PAPER)
}

pub fn help_key_style() -> Style {
    highlight_style().add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    list_item_style()
}

pub fn connection_style(status: ConnectionStatus) -> Style {
    let style = match status {
        ConnectionStatus::Connected => success_style(),
        ConnectionStatus::Disconnected => error_style(),
        ConnectionStatus::Error => highlight_style(),
        ConnectionStatus::Unknown => return muted_style(),
    };
    style.add_modifier(Modifier::BOLD)
}

pub fn appointment_status_style(status: AppointmentStatus) -> Style {
    match status {
        AppointmentStatus::Pending => highlight_style(),
        AppointmentStatus::Confirmed => success_style(),
        AppointmentStatus::Completed => muted_style(),
        AppointmentStatus::Cancelled => error_style(),
    }
}
