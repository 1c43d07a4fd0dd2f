use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use optica_core::models::Product;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_product_table(frame, app, chunks[0]);
    render_product_detail(frame, app.selected_product(), chunks[1]);
}

fn render_product_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Brand"),
        Cell::from("Category"),
        Cell::from("Price"),
        Cell::from("Stock"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .products
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let style = if i == app.product_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let name = if product.featured {
                format!("★ {}", product.name)
            } else {
                product.name.clone()
            };
            let stock = if product.in_stock { "yes" } else { "no" };

            Row::new(vec![
                Cell::from(name),
                Cell::from(product.brand.clone().unwrap_or_default()),
                Cell::from(product.category.map(|c| c.to_string()).unwrap_or_default()),
                Cell::from(format!("{:>10}", product.price_display())),
                Cell::from(stock),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(38), // Name
        Constraint::Fill(2),        // Brand
        Constraint::Fill(2),        // Category
        Constraint::Length(10),     // Price
        Constraint::Length(5),      // Stock
    ];

    let title = format!(" Catalog ({}) ", app.products.len());
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
    if !app.products.is_empty() {
        state.select(Some(app.product_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::styled(value, styles::list_item_style()),
    ])
}

fn render_product_detail(frame: &mut Frame, product: Option<&Product>, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(product) = product else {
        let empty = Paragraph::new(Span::styled(" No products", styles::muted_style())).block(block);
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(product.name.clone(), styles::title_style())),
        Line::from(""),
        detail_row("ID", product.id.clone()),
    ];
    if let Some(ref brand) = product.brand {
        lines.push(detail_row("Brand", brand.clone()));
    }
    if let Some(category) = product.category {
        lines.push(detail_row("Category", category.to_string()));
    }
    if let Some(ref shape) = product.frame_shape {
        lines.push(detail_row("Frame", shape.clone()));
    }

    let mut price = vec![
        Span::styled(format!("{:<10}", "Price"), styles::muted_style()),
        Span::styled(product.price_display(), styles::list_item_style()),
    ];
    if let Some(off) = product.discount_percent() {
        price.push(Span::styled(format!("  -{}%", off), styles::success_style()));
    }
    lines.push(Line::from(price));

    let stock = match (product.in_stock, product.stock) {
        (true, Some(n)) => format!("in stock ({})", n),
        (true, None) => "in stock".to_string(),
        (false, _) => "out of stock".to_string(),
    };
    lines.push(detail_row("Stock", stock));
    lines.push(detail_row("Images", product.images.len().to_string()));

    if let Some(ref description) = product.description {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            description.clone(),
            styles::help_desc_style(),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
