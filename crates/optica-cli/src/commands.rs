//! Non-interactive subcommands.

use anyhow::{anyhow, bail, Result};
use chrono::Local;
use serde::Serialize;
use tracing::warn;

use optica_core::auth::CredentialStore;
use optica_core::models::{AppointmentStatus, ProductCategory, ProductFilter};
use optica_core::{ApiClient, ClientEvent, Config, ResponseSource, Sourced};

pub const ENV_ADMIN_USER: &str = "OPTICA_ADMIN_USER";
pub const ENV_ADMIN_PASSWORD: &str = "OPTICA_ADMIN_PASSWORD";

pub struct Ctx {
    pub config: Config,
    pub api: ApiClient,
    pub json: bool,
}

impl Ctx {
    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Note on stderr when the data did not come from the backend.
fn report_source<T>(sourced: &Sourced<T>) {
    let note = match sourced.source {
        ResponseSource::Network | ResponseSource::Cache => return,
        ResponseSource::StaleCache => "backend unreachable, showing cached data",
        ResponseSource::Snapshot => "backend unreachable, showing offline snapshot",
        ResponseSource::Synthetic => "backend database unavailable, showing empty result",
    };
    eprintln!("Note: {}", note);
}

/// Refresh the offline snapshot with what the new session can see. Failure only warns.
async fn refresh_snapshot(ctx: &Ctx) {
    if let Err(e) = ctx.api.sync_snapshot().await {
        warn!(error = %e, "Offline snapshot not refreshed");
    }
}

pub fn product_filter(
    category: Option<String>,
    brand: Option<String>,
    featured: bool,
    search: Option<String>,
) -> Result<ProductFilter> {
    let category = match category {
        Some(c) => {
            let name = c.to_ascii_lowercase();
            let parsed: ProductCategory =
                serde_json::from_value(serde_json::Value::String(name.clone()))?;
            // Unrecognised names deserialize as Other
            if parsed == ProductCategory::Other && name != "other" {
                bail!("Unknown category '{}'", c);
            }
            Some(parsed)
        }
        None => None,
    };
    Ok(ProductFilter {
        category,
        brand,
        featured: featured.then_some(true),
        search,
    })
}

pub async fn health(ctx: &Ctx) -> Result<()> {
    let result = ctx.api.health_check().await;
    let status = ctx.api.connection_status();
    match result {
        Ok(report) if ctx.json => ctx.print_json(&report)?,
        Ok(report) => {
            println!(
                "{} ({})  status={} database={}",
                status,
                status.indicator(),
                report.status.as_deref().unwrap_or("-"),
                report.database.as_deref().unwrap_or("-")
            );
        }
        Err(e) => println!("{} ({})  {}", status, status.indicator(), e),
    }
    Ok(())
}

pub async fn watch(ctx: &Ctx) -> Result<()> {
    let mut events = ctx.api.subscribe();
    let _monitor = ctx.api.start_health_monitor();
    println!(
        "Watching {} every {}s (Ctrl+C to stop)",
        ctx.api.config().base_url,
        ctx.api.config().health_check_interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ClientEvent::ConnectivityChanged(status)) => {
                    println!("{}  {} ({})", Local::now().format("%H:%M:%S"), status, status.indicator());
                }
                Ok(ClientEvent::LoginRequired) => println!("Login required"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Status watcher lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

pub async fn login(ctx: &mut Ctx, username: Option<String>, remember: bool) -> Result<()> {
    let username = username
        .or_else(|| std::env::var(ENV_ADMIN_USER).ok())
        .or_else(|| ctx.config.last_username.clone())
        .ok_or_else(|| anyhow!("No username given"))?;

    let keychain = CredentialStore::for_backend(&ctx.api.config().base_url);
    let remembered = match keychain.recall(&username) {
        Ok(password) => password,
        Err(e) => {
            warn!(error = %e, "Keychain unavailable");
            None
        }
    };
    let password = match std::env::var(ENV_ADMIN_PASSWORD).ok().or(remembered) {
        Some(p) => p,
        None => rpassword::prompt_password(format!("Password for {}: ", username))?,
    };

    let session = ctx.api.login(&username, &password).await?;
    if remember {
        keychain.remember(&username, &password)?;
    }

    // Persist the username without the process's environment overrides
    let mut stored = Config::load_from(&Config::config_path()?)?;
    stored.last_username = Some(username.clone());
    if let Err(e) = stored.save() {
        warn!(error = %e, "Failed to save config");
    }
    ctx.config.last_username = Some(username);

    println!(
        "Logged in as {} (session valid until {})",
        session.username,
        session
            .expires_at()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
    refresh_snapshot(ctx).await;
    Ok(())
}

pub async fn logout(ctx: &Ctx, forget: bool) -> Result<()> {
    let username = ctx.api.username().await.or_else(|| ctx.config.last_username.clone());
    ctx.api.logout().await;
    if forget {
        if let Some(ref name) = username {
            CredentialStore::for_backend(&ctx.api.config().base_url).forget(name)?;
        }
    }
    println!("Logged out");
    Ok(())
}

pub async fn products(ctx: &Ctx, filter: &ProductFilter) -> Result<()> {
    let products = ctx.api.get_products(filter).await?;
    report_source(&products);
    if ctx.json {
        return ctx.print_json(&products.data);
    }

    println!("{:<26} {:<30} {:<14} {:>10} {:>6}", "ID", "NAME", "BRAND", "PRICE", "STOCK");
    for p in &products.data {
        let stock = match (p.in_stock, p.stock) {
            (false, _) => "out".to_string(),
            (true, Some(n)) => n.to_string(),
            (true, None) => "yes".to_string(),
        };
        println!(
            "{:<26} {:<30} {:<14} {:>10} {:>6}",
            p.id,
            truncate(&p.name, 30),
            truncate(p.brand.as_deref().unwrap_or("-"), 14),
            p.price_display(),
            stock
        );
    }
    println!("{} product(s)", products.data.len());
    Ok(())
}

pub async fn product(ctx: &Ctx, id: &str) -> Result<()> {
    let product = ctx.api.get_product(id).await?;
    report_source(&product);
    let Some(p) = product.data else {
        bail!("No product with id {}", id);
    };
    if ctx.json {
        return ctx.print_json(&p);
    }

    println!("{}", p.name);
    if let Some(ref brand) = p.brand {
        println!("  Brand:    {}", brand);
    }
    if let Some(category) = p.category {
        println!("  Category: {}", category);
    }
    match p.discount_percent() {
        Some(off) => println!("  Price:    {} ({}% off)", p.price_display(), off),
        None => println!("  Price:    {}", p.price_display()),
    }
    if let Some(ref shape) = p.frame_shape {
        println!("  Frame:    {}", shape);
    }
    println!("  In stock: {}", if p.in_stock { "yes" } else { "no" });
    if let Some(image) = p.primary_image() {
        println!("  Image:    {}", image);
    }
    if let Some(ref description) = p.description {
        println!("\n{}", description);
    }
    Ok(())
}

pub async fn delete_product(ctx: &Ctx, id: &str) -> Result<()> {
    ctx.api.delete_product(id).await?;
    println!("Deleted product {}", id);
    Ok(())
}

pub async fn appointments(ctx: &Ctx) -> Result<()> {
    let appointments = ctx.api.get_appointments().await?;
    report_source(&appointments);
    if ctx.json {
        return ctx.print_json(&appointments.data);
    }

    println!("{:<26} {:<24} {:<22} {:<10} {}", "ID", "NAME", "SLOT", "STATUS", "PHONE");
    for a in &appointments.data {
        println!(
            "{:<26} {:<24} {:<22} {:<10} {}",
            a.id,
            truncate(&a.name, 24),
            a.slot_display(),
            a.status.as_str(),
            a.phone
        );
    }
    let open = appointments.data.iter().filter(|a| a.status.is_open()).count();
    println!("{} booking(s), {} open", appointments.data.len(), open);
    Ok(())
}

pub async fn set_status(ctx: &Ctx, id: &str, status: &str) -> Result<()> {
    let status = AppointmentStatus::from_str(status)
        .ok_or_else(|| anyhow!("Unknown status '{}'", status))?;
    let updated = ctx.api.update_appointment_status(id, status).await?;
    println!("{} is now {}", updated.name, updated.status);
    Ok(())
}

pub async fn settings(ctx: &Ctx) -> Result<()> {
    let settings = ctx.api.get_settings().await?;
    report_source(&settings);
    if ctx.json {
        return ctx.print_json(&settings.data);
    }

    let s = &settings.data;
    if s.is_empty() {
        println!("No store settings configured");
        return Ok(());
    }
    println!("{}", s.display_name());
    for (label, value) in [
        ("Phone", &s.phone),
        ("WhatsApp", &s.whatsapp_number),
        ("Email", &s.email),
        ("Address", &s.address),
        ("Instagram", &s.instagram),
        ("Facebook", &s.facebook),
    ] {
        if let Some(v) = value {
            println!("  {:<10} {}", format!("{}:", label), v);
        }
    }
    if let Some(ref hours) = s.hours {
        println!("  Hours:");
        for (day, value) in [
            ("Mon-Fri", &hours.weekdays),
            ("Sat", &hours.saturday),
            ("Sun", &hours.sunday),
        ] {
            println!("    {:<8} {}", day, value.as_deref().unwrap_or("closed"));
        }
    }
    Ok(())
}

pub async fn stats(ctx: &Ctx) -> Result<()> {
    let stats = ctx.api.get_analytics_stats().await?;
    report_source(&stats);
    if ctx.json {
        return ctx.print_json(&stats.data);
    }

    let s = &stats.data;
    println!("Visitors: {} total, {} unique, {} today", s.total_visitors, s.unique_visitors, s.today_visitors);
    println!("Page views: {}", s.page_views);
    for page in s.top_pages.iter().take(10) {
        println!("  {:>6}  {}", page.count, page.page);
    }
    Ok(())
}

pub async fn snapshot_sync(ctx: &Ctx) -> Result<()> {
    let snapshot = ctx.api.sync_snapshot().await?;
    println!(
        "Snapshot saved: {} product(s), {} booking(s)",
        snapshot.products.len(),
        snapshot.appointments.len()
    );
    Ok(())
}

pub fn snapshot_show(ctx: &Ctx) -> Result<()> {
    let store = ctx
        .api
        .snapshot_store()
        .ok_or_else(|| anyhow!("No offline snapshot store configured"))?;
    let Some(snapshot) = store.load()? else {
        println!("No offline snapshot at {}", store.path().display());
        return Ok(());
    };
    if ctx.json {
        return ctx.print_json(&snapshot);
    }

    println!("{}", store.path().display());
    println!("  Saved:        {}", snapshot.age_display());
    println!("  Products:     {}", snapshot.products.len());
    println!("  Bookings:     {}", snapshot.appointments.len());
    println!("  Store:        {}", snapshot.settings.display_name());
    println!("  Visitors:     {}", snapshot.analytics.total_visitors);
    Ok(())
}

pub fn snapshot_clear(ctx: &Ctx) -> Result<()> {
    if let Some(store) = ctx.api.snapshot_store() {
        store.clear()?;
    }
    println!("Offline snapshot removed");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
