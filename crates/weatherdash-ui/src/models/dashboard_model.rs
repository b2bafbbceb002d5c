//! Dashboard view model: the current-conditions panel and the forecast cards.
//!
//! The model is owned by the UI thread. Searches go through [`AppServices`];
//! answers are drained from the service channel by [`DashboardModel::poll`].
//! A failed search leaves every displayed field as it was.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use weatherdash_core::AppError;
use weatherdash_weather::{IconImage, Units, MAX_FORECAST_DAYS};

use crate::app_services::AppServices;
use crate::services::{CurrentSnapshot, ForecastSnapshot, WeatherServiceMessage, WeatherUpdate};

/// Number of forecast cards on the dashboard
pub const FORECAST_SLOTS: usize = MAX_FORECAST_DAYS;

/// Text and icon shown in the current-conditions panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentPanel {
    pub location: String,
    pub temperature: String,
    pub description: String,
    pub humidity: String,
    pub wind: String,
    pub icon: Option<IconImage>,
}

/// One forecast card; all fields empty when the slot is unused
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastCard {
    pub day_name: String,
    pub date: String,
    pub temperature: String,
    pub description: String,
    pub icon: Option<IconImage>,
}

impl ForecastCard {
    pub fn is_empty(&self) -> bool {
        self.day_name.is_empty() && self.temperature.is_empty() && self.icon.is_none()
    }
}

pub struct DashboardModel {
    units: Units,
    loading: bool,
    pending_generation: Option<u64>,
    last_query: String,
    current: CurrentPanel,
    forecast: [ForecastCard; FORECAST_SLOTS],
}

/// First letter upper case, the rest lower case
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn format_temperature(value: f64, units: Units) -> String {
    format!("{:.1}{}", value, units.temperature_suffix())
}

/// Wind speed as the provider sent it; whole numbers keep their `.0`
fn format_wind(speed: f64, units: Units) -> String {
    format!("Wind: {:?} {}", speed, units.wind_speed_suffix())
}

fn format_day_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

fn format_card_date(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

impl DashboardModel {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            loading: false,
            pending_generation: None,
            last_query: String::new(),
            current: CurrentPanel::default(),
            forecast: Default::default(),
        }
    }

    pub fn current(&self) -> &CurrentPanel {
        &self.current
    }

    pub fn forecast(&self) -> &[ForecastCard] {
        &self.forecast
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    /// Submit a location query.
    ///
    /// An empty or blank query is ignored and nothing is sent. Returns true
    /// when a search was started.
    pub fn search(&mut self, services: &AppServices, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        let generation = services.request_weather(query);
        self.pending_generation = Some(generation);
        self.loading = true;
        self.last_query = query.to_string();
        true
    }

    /// Drain the weather channel. Returns true if anything visible changed.
    pub fn poll(&mut self, services: &AppServices) -> bool {
        let mut changed = false;
        while let Some(msg) = services.try_recv_weather_message() {
            changed |= self.handle_message(msg);
        }
        changed
    }

    /// Block until the pending search is answered or `timeout` passes.
    /// Returns true if anything visible changed.
    pub fn wait_for_pending(&mut self, services: &AppServices, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut changed = false;
        while self.loading {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!("Gave up waiting for search {:?}", self.last_query);
                break;
            }
            match services.recv_weather_message_timeout(remaining) {
                Some(msg) => changed |= self.handle_message(msg),
                None => break,
            }
        }
        changed
    }

    /// Mark a search with this generation as in flight without sending it.
    #[cfg(test)]
    pub(crate) fn expect_generation(&mut self, generation: u64) {
        self.pending_generation = Some(generation);
        self.loading = true;
    }

    /// Apply one service message. Stale answers are dropped.
    pub fn handle_message(&mut self, msg: WeatherServiceMessage) -> bool {
        match msg {
            WeatherServiceMessage::FetchDone { generation, result } => {
                if self.pending_generation != Some(generation) {
                    tracing::debug!("Dropping stale weather result #{}", generation);
                    return false;
                }
                self.pending_generation = None;
                self.loading = false;

                match result {
                    Ok(update) => {
                        self.apply_update(update);
                    }
                    Err(e) => {
                        let app_err: AppError = e.into();
                        tracing::error!(
                            "Weather update skipped: {} ({})",
                            app_err,
                            app_err.user_message()
                        );
                    }
                }
                // The loading indicator changed either way
                true
            }
        }
    }

    /// Apply a successful search; sections that failed to parse are left alone.
    pub fn apply_update(&mut self, update: WeatherUpdate) {
        tracing::info!("Applying weather for {:?}", update.query);
        if let Some(current) = update.current {
            self.apply_current(current);
        }
        if let Some(days) = update.forecast {
            self.apply_forecast(days);
        }
    }

    fn apply_current(&mut self, snapshot: CurrentSnapshot) {
        let c = snapshot.conditions;
        // An icon that failed to load leaves the last one on screen
        let icon = snapshot.icon.or_else(|| self.current.icon.take());
        self.current = CurrentPanel {
            location: format!("{}, {}", c.city, c.country),
            temperature: format_temperature(c.temperature, self.units),
            description: capitalize(&c.description),
            humidity: format!("Humidity: {}%", c.humidity),
            wind: format_wind(c.wind_speed, self.units),
            icon,
        };
    }

    fn apply_forecast(&mut self, days: Vec<ForecastSnapshot>) {
        let mut days = days.into_iter();
        for card in self.forecast.iter_mut() {
            *card = match days.next() {
                Some(snapshot) => ForecastCard {
                    day_name: format_day_name(snapshot.day.date),
                    date: format_card_date(snapshot.day.date),
                    temperature: format_temperature(snapshot.day.temperature, self.units),
                    description: capitalize(&snapshot.day.description),
                    icon: snapshot.icon.or_else(|| card.icon.take()),
                },
                None => ForecastCard::default(),
            };
        }
    }
}
