//! Dashboard state management.
//!
//! `App` holds everything the dashboard shows and coordinates background
//! work: fetches run in spawned tasks and report back through an mpsc
//! channel, while connectivity changes arrive on the client's event stream.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use optica_core::models::{
    AnalyticsStats, Appointment, AppointmentStatus, Product, ProductFilter, Settings,
};
use optica_core::{
    ApiClient, ApiError, ClientEvent, Config, ConnectionStatus, HealthMonitor, ResponseSource,
    Sourced,
};

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Products,
    Appointments,
    Store,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Products, Tab::Appointments, Tab::Store];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Products => "Catalog",
            Tab::Appointments => "Bookings",
            Tab::Store => "Store",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Products => Tab::Appointments,
            Tab::Appointments => Tab::Store,
            Tab::Store => Tab::Products,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Products => Tab::Store,
            Tab::Appointments => Tab::Products,
            Tab::Store => Tab::Appointments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
}

/// Results sent from background tasks back to the dashboard.
enum RefreshResult {
    Products(Sourced<Vec<Product>>),
    Appointments(Sourced<Vec<Appointment>>),
    Settings(Sourced<Settings>),
    Stats(Sourced<AnalyticsStats>),
    AppointmentUpdated(Appointment),
    LoggedIn(String),
    LoginFailed(String),
    /// All fetches of a refresh have reported
    RefreshComplete,
    Error(String),
}

pub struct App {
    pub config: Config,
    pub api: ApiClient,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub product_selection: usize,
    pub appointment_selection: usize,
    pub status_message: Option<String>,
    pub refreshing: bool,

    // Login form
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Data
    pub connection: ConnectionStatus,
    pub products: Vec<Product>,
    pub appointments: Vec<Appointment>,
    pub settings: Settings,
    pub stats: Option<AnalyticsStats>,
    pub products_source: Option<ResponseSource>,
    pub appointments_source: Option<ResponseSource>,
    pub store_source: Option<ResponseSource>,

    refresh_tx: mpsc::Sender<RefreshResult>,
    refresh_rx: mpsc::Receiver<RefreshResult>,
    events: broadcast::Receiver<ClientEvent>,
    _health: HealthMonitor,
}

impl App {
    /// Must be called from within the tokio runtime; starts the health monitor.
    pub fn new(config: Config, api: ApiClient) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let events = api.subscribe();
        let health = api.start_health_monitor();
        let login_username = config.last_username.clone().unwrap_or_default();

        Self {
            config,
            api,
            state: AppState::Normal,
            current_tab: Tab::Products,
            product_selection: 0,
            appointment_selection: 0,
            status_message: None,
            refreshing: false,
            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,
            login_error: None,
            connection: ConnectionStatus::Unknown,
            products: Vec::new(),
            appointments: Vec::new(),
            settings: Settings::default(),
            stats: None,
            products_source: None,
            appointments_source: None,
            store_source: None,
            refresh_tx,
            refresh_rx,
            events,
            _health: health,
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api.is_authenticated().await
    }

    // =========================================================================
    // Login
    // =========================================================================

    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_password.clear();
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    pub fn attempt_login(&mut self) {
        let username = self.login_username.trim().to_string();
        if username.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Username and password are required".to_string());
            return;
        }
        let password = std::mem::take(&mut self.login_password);
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let result = match api.login(&username, &password).await {
                Ok(session) => RefreshResult::LoggedIn(session.username),
                Err(e) => RefreshResult::LoginFailed(e.to_string()),
            };
            Self::send_result(&tx, Ok(result)).await;
        });

        self.login_error = None;
        self.status_message = Some("Logging in...".to_string());
    }

    fn remember_username(&mut self, username: &str) {
        self.config.last_username = Some(username.to_string());
        // Reload so environment overrides are not written to disk
        let saved = Config::config_path()
            .and_then(|path| Config::load_from(&path))
            .and_then(|mut stored| {
                stored.last_username = Some(username.to_string());
                stored.save()
            });
        if let Err(e) = saved {
            warn!(error = %e, "Failed to save last username");
        }
    }

    // =========================================================================
    // Background work
    // =========================================================================

    pub fn refresh_all_background(&mut self) {
        if self.refreshing {
            return;
        }
        info!("Starting background refresh");
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let filter = ProductFilter::default();
            let (products, appointments, settings, stats) = futures::join!(
                api.get_products(&filter),
                api.get_appointments(),
                api.get_settings(),
                api.get_analytics_stats(),
            );
            Self::send_result(&tx, products.map(RefreshResult::Products)).await;
            Self::send_result(&tx, appointments.map(RefreshResult::Appointments)).await;
            Self::send_result(&tx, settings.map(RefreshResult::Settings)).await;
            Self::send_result(&tx, stats.map(RefreshResult::Stats)).await;
            Self::send_result(&tx, Ok(RefreshResult::RefreshComplete)).await;

            // Served from the fresh cache, so this adds no backend load
            if let Err(e) = api.sync_snapshot().await {
                debug!(error = %e, "Offline snapshot not refreshed");
            }
        });

        self.refreshing = true;
        self.status_message = Some("Refreshing...".to_string());
    }

    pub fn reconnect_background(&mut self) {
        let api = self.api.clone();
        tokio::spawn(async move {
            let status = api.reconnect().await;
            debug!(%status, "Reconnect finished");
        });
        self.status_message = Some("Checking backend...".to_string());
    }

    /// Move the selected booking to `status`.
    pub fn set_selected_status(&mut self, status: AppointmentStatus) {
        let Some(appointment) = self.appointments.get(self.appointment_selection) else {
            return;
        };
        if appointment.status == status {
            return;
        }
        let id = appointment.id.clone();
        let name = appointment.name.clone();
        let api = self.api.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let result = api
                .update_appointment_status(&id, status)
                .await
                .map(RefreshResult::AppointmentUpdated);
            Self::send_result(&tx, result).await;
        });

        self.status_message = Some(format!("Marking {} as {}...", name, status));
    }

    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: Result<RefreshResult, ApiError>) {
        let message = result.unwrap_or_else(|e| RefreshResult::Error(e.to_string()));
        if let Err(e) = tx.send(message).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Apply finished background work and client events. Called every frame.
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_refresh_result(result);
        }

        loop {
            match self.events.try_recv() {
                Ok(ClientEvent::ConnectivityChanged(status)) => self.connection = status,
                Ok(ClientEvent::LoginRequired) => {
                    if self.state != AppState::LoggingIn {
                        self.login_error = Some("Session expired, please log in again".to_string());
                        self.start_login();
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    debug!(skipped = n, "Dashboard lagged behind client events");
                }
                Err(_) => break,
            }
        }
        self.connection = self.api.connection_status();
    }

    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Products(sourced) => {
                self.products_source = Some(sourced.source);
                self.products = sourced.data;
                self.product_selection = clamp_selection(self.product_selection, self.products.len());
            }
            RefreshResult::Appointments(sourced) => {
                self.appointments_source = Some(sourced.source);
                self.appointments = sourced.data;
                self.appointment_selection =
                    clamp_selection(self.appointment_selection, self.appointments.len());
            }
            RefreshResult::Settings(sourced) => {
                self.store_source = Some(sourced.source);
                self.settings = sourced.data;
            }
            RefreshResult::Stats(sourced) => {
                self.stats = Some(sourced.data);
            }
            RefreshResult::AppointmentUpdated(updated) => {
                self.status_message = Some(format!("{} is now {}", updated.name, updated.status));
                match self.appointments.iter_mut().find(|a| a.id == updated.id) {
                    Some(existing) => *existing = updated,
                    None => self.appointments.push(updated),
                }
            }
            RefreshResult::LoggedIn(username) => {
                info!(%username, "Dashboard login succeeded");
                self.remember_username(&username);
                self.state = AppState::Normal;
                self.login_error = None;
                self.status_message = Some(format!("Logged in as {}", username));
                self.refresh_all_background();
            }
            RefreshResult::LoginFailed(message) => {
                self.login_error = Some(message);
                self.status_message = None;
                self.login_focus = LoginFocus::Password;
            }
            RefreshResult::RefreshComplete => {
                self.refreshing = false;
                if self.status_message.as_deref() == Some("Refreshing...") {
                    self.status_message = None;
                }
            }
            RefreshResult::Error(message) => {
                warn!(error = %message, "Background task failed");
                self.status_message = Some(format!("Error: {}", message));
            }
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    fn current_len(&self) -> usize {
        match self.current_tab {
            Tab::Products => self.products.len(),
            Tab::Appointments => self.appointments.len(),
            Tab::Store => 0,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut usize> {
        match self.current_tab {
            Tab::Products => Some(&mut self.product_selection),
            Tab::Appointments => Some(&mut self.appointment_selection),
            Tab::Store => None,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_len();
        if let Some(selection) = self.selection_mut() {
            let next = (*selection as isize).saturating_add(delta);
            *selection = clamp_selection(next.max(0) as usize, len);
        }
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.products.get(self.product_selection)
    }

    pub fn selected_appointment(&self) -> Option<&Appointment> {
        self.appointments.get(self.appointment_selection)
    }

    /// Source of the data on the current tab.
    pub fn current_source(&self) -> Option<ResponseSource> {
        match self.current_tab {
            Tab::Products => self.products_source,
            Tab::Appointments => self.appointments_source,
            Tab::Store => self.store_source,
        }
    }

    pub fn store_name(&self) -> &str {
        self.settings.display_name()
    }
}

fn clamp_selection(selection: usize, len: usize) -> usize {
    selection.min(len.saturating_sub(1))
}

/// The status offered next when cycling a booking forward.
pub fn next_status(status: AppointmentStatus) -> AppointmentStatus {
    match status {
        AppointmentStatus::Pending => AppointmentStatus::Confirmed,
        AppointmentStatus::Confirmed => AppointmentStatus::Completed,
        AppointmentStatus::Completed | AppointmentStatus::Cancelled => AppointmentStatus::Pending,
    }
}

pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && !c.is_control() && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && !c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        for tab in Tab::ALL {
            assert_eq!(tab.next().prev(), tab);
        }
        assert_eq!(Tab::Store.next(), Tab::Products);
    }

    #[test]
    fn test_next_status_cycle() {
        assert_eq!(next_status(AppointmentStatus::Pending), AppointmentStatus::Confirmed);
        assert_eq!(next_status(AppointmentStatus::Confirmed), AppointmentStatus::Completed);
        assert_eq!(next_status(AppointmentStatus::Cancelled), AppointmentStatus::Pending);
    }

    #[test]
    fn test_clamp_selection() {
        assert_eq!(clamp_selection(5, 3), 2);
        assert_eq!(clamp_selection(1, 3), 1);
        assert_eq!(clamp_selection(4, 0), 0);
    }

    #[test]
    fn test_login_char_limits() {
        assert!(can_add_username_char(0, 'a'));
        assert!(!can_add_username_char(0, ' '));
        assert!(!can_add_username_char(MAX_USERNAME_LENGTH, 'a'));
        assert!(can_add_password_char(3, ' '));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'x'));
    }
}
