//! Optica admin console.
//!
//! With no subcommand this opens the live dashboard: catalog, bookings and
//! store settings with a connection indicator, kept usable from the offline
//! snapshot when the backend is down. Subcommands expose the same operations
//! for scripts.

mod app;
mod commands;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use optica_core::api::ClientBuilder;
use optica_core::{ApiClient, Config, Session, SnapshotStore};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "optica.log";

pub const ENV_SNAPSHOT_PASSPHRASE: &str = "OPTICA_SNAPSHOT_PASSPHRASE";

#[derive(Parser, Debug)]
#[command(name = "optica")]
#[command(about = "Admin console for the Optica eyewear catalog")]
#[command(version)]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the backend once and print its health
    Health,
    /// Follow connection changes until Ctrl+C
    Watch,
    /// Log in as a store administrator
    Login {
        username: Option<String>,
        /// Remember the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// End the admin session
    Logout {
        /// Also remove the remembered password
        #[arg(long)]
        forget: bool,
    },
    /// List the catalog
    Products {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product
    Product { id: String },
    /// Remove a product from the catalog
    DeleteProduct { id: String },
    /// List bookings
    Appointments,
    /// Change a booking's status (pending, confirmed, completed, cancelled)
    SetStatus { id: String, status: String },
    /// Show store settings
    Settings,
    /// Show visitor statistics
    Stats,
    /// Manage the offline snapshot
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
}

#[derive(Subcommand, Debug)]
enum SnapshotCommand {
    /// Refresh the snapshot from the backend
    Sync,
    /// Describe the stored snapshot
    Show,
    /// Delete the stored snapshot
    Clear,
}

/// Log to a daily file in the cache directory, and to stderr for
/// subcommands (the dashboard owns the terminal).
fn init_tracing(log_dir: &Path, to_stderr: bool) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=optica_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let stderr_layer = to_stderr.then(|| fmt::layer().with_writer(io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(stderr_layer)
        .init();
    guard
}

fn build_client(config: &Config, cache_dir: &Path) -> Result<ApiClient> {
    let mut session = Session::new(cache_dir.to_path_buf());
    if let Err(e) = session.load() {
        warn!(error = %e, "Ignoring unreadable session");
    }

    let mut store = SnapshotStore::new(cache_dir);
    if config.encrypt_snapshot {
        let passphrase = std::env::var(ENV_SNAPSHOT_PASSPHRASE).with_context(|| {
            format!(
                "encrypt_snapshot is enabled but {} is not set",
                ENV_SNAPSHOT_PASSPHRASE
            )
        })?;
        store = store.with_passphrase(passphrase);
    }

    let api = ClientBuilder::new(config.client_config())
        .session(session)
        .snapshot_store(store)
        .build_default()?;
    Ok(api)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: {:#}; using default configuration", e);
            Config::default()
        }
    };
    let cache_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let log_dir = cache_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let _guard = init_tracing(&log_dir, cli.command.is_some());
    info!(base_url = %config.base_url(), "optica starting");

    let api = build_client(&config, &cache_dir)?;

    let Some(command) = cli.command else {
        return run_dashboard(config, api).await;
    };

    let mut ctx = commands::Ctx {
        config,
        api,
        json: cli.json,
    };
    match command {
        Command::Health => commands::health(&ctx).await,
        Command::Watch => commands::watch(&ctx).await,
        Command::Login { username, remember } => commands::login(&mut ctx, username, remember).await,
        Command::Logout { forget } => commands::logout(&ctx, forget).await,
        Command::Products {
            category,
            brand,
            featured,
            search,
        } => {
            let filter = commands::product_filter(category, brand, featured, search)?;
            commands::products(&ctx, &filter).await
        }
        Command::Product { id } => commands::product(&ctx, &id).await,
        Command::DeleteProduct { id } => commands::delete_product(&ctx, &id).await,
        Command::Appointments => commands::appointments(&ctx).await,
        Command::SetStatus { id, status } => commands::set_status(&ctx, &id, &status).await,
        Command::Settings => commands::settings(&ctx).await,
        Command::Stats => commands::stats(&ctx).await,
        Command::Snapshot(SnapshotCommand::Sync) => commands::snapshot_sync(&ctx).await,
        Command::Snapshot(SnapshotCommand::Show) => commands::snapshot_show(&ctx),
        Command::Snapshot(SnapshotCommand::Clear) => commands::snapshot_clear(&ctx),
    }
}

async fn run_dashboard(config: Config, api: ApiClient) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, api);
    if app.is_authenticated().await {
        app.refresh_all_background();
    } else {
        app.start_login();
    }

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("optica shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
