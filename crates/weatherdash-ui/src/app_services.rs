//! Application services owned by the UI thread.
//!
//! `AppServices` holds the tokio runtime, the weather provider, the icon
//! cache and the weather service channel. It is created once by the UI and
//! passed by reference; nothing here is a process-wide static.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use weatherdash_core::{UnitSystem, WeatherConfig};
use weatherdash_weather::{IconCache, ProviderConfig, Units, WeatherProvider};

use crate::services::{self, SharedIconCache, WeatherError, WeatherServiceMessage};

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    /// Weather provider
    weather_provider: Arc<WeatherProvider>,

    /// Decoded icons, kept for the life of the services
    icon_cache: SharedIconCache,

    /// Weather service channel sender
    weather_service_tx: Sender<WeatherServiceMessage>,

    /// Weather service channel receiver
    weather_service_rx: Mutex<Receiver<WeatherServiceMessage>>,

    /// Cancellation token of the in-flight search
    weather_cancel_token: Mutex<Option<CancellationToken>>,

    /// Id of the most recent search
    weather_generation: AtomicU64,

    shut_down: AtomicBool,
}

fn to_weather_units(units: UnitSystem) -> Units {
    match units {
        UnitSystem::Metric => Units::Metric,
        UnitSystem::Imperial => Units::Imperial,
        UnitSystem::Standard => Units::Standard,
    }
}

impl AppServices {
    /// Build services from the weather section of the config.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let provider = WeatherProvider::new(ProviderConfig {
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            icon_base_url: config.icon_base_url.clone(),
            units: to_weather_units(config.units),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
        .context("Failed to create weather provider")?;

        Self::with_provider(provider)
    }

    /// Build services around an existing provider.
    pub fn with_provider(provider: WeatherProvider) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("weatherdash-tokio")
            .build()
            .context("Failed to create tokio runtime")?;

        let provider = Arc::new(provider);
        let icon_cache = Arc::new(tokio::sync::Mutex::new(IconCache::new(provider.clone())));
        let (tx, rx) = std::sync::mpsc::channel();

        tracing::info!("Weather services initialized");

        Ok(Self {
            runtime,
            weather_provider: provider,
            icon_cache,
            weather_service_tx: tx,
            weather_service_rx: Mutex::new(rx),
            weather_cancel_token: Mutex::new(None),
            weather_generation: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Units the provider reports in
    pub fn units(&self) -> Units {
        self.weather_provider.units()
    }

    /// Shared icon cache
    pub fn icon_cache(&self) -> SharedIconCache {
        self.icon_cache.clone()
    }

    /// Start a search for `query`, superseding any search still in flight.
    ///
    /// Returns the generation id the answer will carry.
    pub fn request_weather(&self, query: &str) -> u64 {
        let generation = self.weather_generation.fetch_add(1, Ordering::SeqCst) + 1;

        if self.shut_down.load(Ordering::SeqCst) {
            let _ = self.weather_service_tx.send(WeatherServiceMessage::FetchDone {
                generation,
                result: Err(WeatherError::NotInitialized),
            });
            return generation;
        }

        let token = CancellationToken::new();
        if let Some(previous) = self.weather_cancel_token.lock().replace(token.clone()) {
            previous.cancel();
        }

        tracing::info!("Search #{} for {:?}", generation, query);
        services::request_weather_fetch(
            &self.weather_service_tx,
            self.runtime.handle(),
            self.weather_provider.clone(),
            self.icon_cache.clone(),
            token,
            generation,
            query.to_string(),
        );
        generation
    }

    /// Try to receive a message from the weather service channel (non-blocking).
    pub fn try_recv_weather_message(&self) -> Option<WeatherServiceMessage> {
        self.weather_service_rx.lock().try_recv().ok()
    }

    /// Wait up to `timeout` for a message from the weather service channel.
    pub fn recv_weather_message_timeout(
        &self,
        timeout: Duration,
    ) -> Option<WeatherServiceMessage> {
        match self.weather_service_rx.lock().recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) => None,
            // The sender lives in self, so this cannot happen while we exist
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Signal shutdown: cancel the in-flight search and refuse new ones.
    pub fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");
        self.shut_down.store(true, Ordering::SeqCst);

        if let Some(token) = self.weather_cancel_token.lock().take() {
            token.cancel();
        }

        tracing::info!("AppServices shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn offline_services() -> AppServices {
        let mut config = WeatherConfig::default();
        // Nothing listens here; requests fail fast if ever sent
        config.api_base_url = "http://127.0.0.1:9".to_string();
        config.icon_base_url = "http://127.0.0.1:9".to_string();
        AppServices::new(&config).unwrap()
    }

    #[test]
    fn test_units_follow_config() {
        let mut config = WeatherConfig::default();
        config.units = UnitSystem::Imperial;
        let services = AppServices::new(&config).unwrap();
        assert_eq!(services.units(), Units::Imperial);
    }

    #[test]
    fn test_generations_increase() {
        let services = offline_services();
        let first = services.request_weather("Paris");
        let second = services.request_weather("Rome");
        assert!(second > first);
    }

    #[test]
    fn test_request_after_shutdown_reports_not_initialized() {
        let services = offline_services();
        services.shutdown();

        let generation = services.request_weather("Paris");
        let msg = services
            .recv_weather_message_timeout(Duration::from_secs(1))
            .unwrap();

        match msg {
            WeatherServiceMessage::FetchDone { generation: g, result } => {
                assert_eq!(g, generation);
                assert!(matches!(result, Err(WeatherError::NotInitialized)));
            }
        }
    }

    #[test]
    fn test_empty_channel() {
        let services = offline_services();
        assert!(services.try_recv_weather_message().is_none());
    }
}
