use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use optica_core::models::Appointment;

use crate::app::{next_status, App};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_booking_table(frame, app, chunks[0]);
    render_booking_detail(frame, app.selected_appointment(), chunks[1]);
}

fn render_booking_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Name"),
        Cell::from("When"),
        Cell::from("Service"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .appointments
        .iter()
        .enumerate()
        .map(|(i, appointment)| {
            let style = if i == app.appointment_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(appointment.name.clone()),
                Cell::from(appointment.slot_display()),
                Cell::from(appointment.service.clone().unwrap_or_default()),
                Cell::from(Span::styled(
                    appointment.status.as_str(),
                    styles::appointment_status_style(appointment.status),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(30), // Name
        Constraint::Length(22),     // When
        Constraint::Fill(1),        // Service
        Constraint::Length(10),     // Status
    ];

    let open = app.appointments.iter().filter(|a| a.status.is_open()).count();
    let title = format!(" Bookings ({} open / {}) ", open, app.appointments.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.appointments.is_empty() {
        state.select(Some(app.appointment_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<9}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

fn render_booking_detail(frame: &mut Frame, appointment: Option<&Appointment>, area: Rect) {
    let block = Block::default()
        .title(" Booking ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(appointment) = appointment else {
        let empty = Paragraph::new(Span::styled(" No bookings", styles::muted_style())).block(block);
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(appointment.name.clone(), styles::title_style())),
        Line::from(""),
        detail_row("Phone", appointment.phone.clone()),
    ];
    if let Some(ref email) = appointment.email {
        lines.push(detail_row("Email", email.clone()));
    }
    lines.push(detail_row("When", appointment.slot_display()));
    if let Some(ref service) = appointment.service {
        lines.push(detail_row("Service", service.clone()));
    }
    lines.push(Line::from(vec![
        Span::styled(format!("{:<9}", "Status"), styles::muted_style()),
        Span::styled(
            appointment.status.as_str(),
            styles::appointment_status_style(appointment.status),
        ),
        Span::styled(
            format!("  [s] → {}", next_status(appointment.status).as_str()),
            styles::muted_style(),
        ),
    ]));
    if let Some(ref message) = appointment.message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message.clone(),
            styles::help_desc_style(),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
