use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use optica_core::models::{AnalyticsStats, Settings};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_settings(frame, &app.settings, chunks[0]);
    render_stats(frame, app.stats.as_ref(), chunks[1]);
}

fn field(label: &'static str, value: Option<&str>) -> Line<'static> {
    let value = match value {
        Some(v) if !v.is_empty() => Span::styled(v.to_string(), styles::list_item_style()),
        _ => Span::styled("-", styles::muted_style()),
    };
    Line::from(vec![
        Span::styled(format!("  {:<11}", label), styles::muted_style()),
        value,
    ])
}

fn render_settings(frame: &mut Frame, settings: &Settings, area: Rect) {
    let block = Block::default()
        .title(" Store Settings ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if settings.is_empty() {
        let empty = Paragraph::new(Span::styled(
            " Nothing configured yet",
            styles::muted_style(),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let hours = settings.hours.clone().unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled(
            format!("  {}", settings.display_name()),
            styles::title_style(),
        )),
        Line::from(""),
        field("Phone", settings.phone.as_deref()),
        field("WhatsApp", settings.whatsapp_number.as_deref()),
        field("Email", settings.email.as_deref()),
        field("Address", settings.address.as_deref()),
        Line::from(""),
        Line::from(Span::styled(" Hours", styles::highlight_style())),
        field("Weekdays", hours.weekdays.as_deref()),
        field("Saturday", hours.saturday.as_deref()),
        field("Sunday", hours.sunday.as_deref()),
        Line::from(""),
        field("Instagram", settings.instagram.as_deref()),
        field("Facebook", settings.facebook.as_deref()),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_stats(frame: &mut Frame, stats: Option<&AnalyticsStats>, area: Rect) {
    let block = Block::default()
        .title(" Visitors ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(stats) = stats else {
        let empty = Paragraph::new(Span::styled(
            " Log in to see visitor statistics",
            styles::muted_style(),
        ))
        .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let count = |label: &'static str, n: u64| {
        Line::from(vec![
            Span::styled(format!("  {:<13}", label), styles::muted_style()),
            Span::styled(format!("{:>8}", n), styles::highlight_style()),
        ])
    };

    let mut lines = vec![
        count("Total", stats.total_visitors),
        count("Unique", stats.unique_visitors),
        count("Today", stats.today_visitors),
        count("Page views", stats.page_views),
    ];

    if !stats.top_pages.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" Top pages", styles::highlight_style())));
        for page in stats.top_pages.iter().take(8) {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:>6}  ", page.count), styles::muted_style()),
                Span::styled(page.page.clone(), styles::list_item_style()),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
