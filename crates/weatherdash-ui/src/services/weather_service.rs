//! Weather backend: async weather fetching.
//! All network work runs off the UI thread; results sent via mpsc.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use weatherdash_core::{NetworkError, ReqwestErrorExt};
use weatherdash_weather::{
    select_daily, CurrentConditions, DailyForecast, IconCache, IconFetcher, IconImage,
    WeatherProvider,
};

/// Icon cache shared between the services container and its worker tasks
pub type SharedIconCache = Arc<Mutex<IconCache<Arc<WeatherProvider>>>>;

/// Error type for weather operations
#[derive(Debug, Clone)]
pub enum WeatherError {
    Network(String),
    Timeout,
    Provider { status: u16, message: String },
    InvalidData(String),
    NotInitialized,
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Network(s) => write!(f, "Weather network error: {}", s),
            WeatherError::Timeout => write!(f, "Weather request timed out"),
            WeatherError::Provider { status, message } => {
                write!(f, "Weather provider error {}: {}", status, message)
            }
            WeatherError::InvalidData(s) => write!(f, "Weather data error: {}", s),
            WeatherError::NotInitialized => write!(f, "Weather service not initialized"),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<weatherdash_weather::WeatherError> for WeatherError {
    fn from(e: weatherdash_weather::WeatherError) -> Self {
        use weatherdash_weather::WeatherError as Source;
        match e {
            Source::Network(e) => match e.into_network_error() {
                NetworkError::Timeout => WeatherError::Timeout,
                other => WeatherError::Network(other.to_string()),
            },
            Source::Provider { status, message } => WeatherError::Provider { status, message },
            Source::Parse(s) | Source::Render(s) => WeatherError::InvalidData(s),
            Source::InvalidUrl(e) => WeatherError::InvalidData(e.to_string()),
        }
    }
}

/// Current conditions plus the resolved icon
#[derive(Debug, Clone)]
pub struct CurrentSnapshot {
    pub conditions: CurrentConditions,
    /// `None` when the icon could not be loaded
    pub icon: Option<IconImage>,
}

/// One forecast day plus the resolved icon
#[derive(Debug, Clone)]
pub struct ForecastSnapshot {
    pub day: DailyForecast,
    pub icon: Option<IconImage>,
}

/// Everything a successful search produced.
///
/// A section is `None` when its response body could not be read; the view
/// keeps what it showed before for that section.
#[derive(Debug, Clone)]
pub struct WeatherUpdate {
    pub query: String,
    pub current: Option<CurrentSnapshot>,
    pub forecast: Option<Vec<ForecastSnapshot>>,
}

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of a search; `generation` identifies which search it answers
    FetchDone {
        generation: u64,
        result: Result<WeatherUpdate, WeatherError>,
    },
}

/// Request a search asynchronously.
/// Sends `FetchDone` on the channel when complete, unless `cancel` fires first.
pub fn request_fetch(
    tx: &std::sync::mpsc::Sender<WeatherServiceMessage>,
    runtime: &tokio::runtime::Handle,
    provider: Arc<WeatherProvider>,
    icons: SharedIconCache,
    cancel: CancellationToken,
    generation: u64,
    query: String,
) {
    let tx = tx.clone();

    runtime.spawn(async move {
        let today = Local::now().date_naive();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Search #{} for {:?} superseded", generation, query);
            }
            result = fetch_dashboard(&provider, &*icons, &query, today) => {
                if let Err(e) = &result {
                    tracing::error!("Search #{} for {:?} failed: {}", generation, query, e);
                }
                let _ = tx.send(WeatherServiceMessage::FetchDone { generation, result });
            }
        }
    });
}

/// Fetch current conditions and forecast for `query` and resolve their icons.
///
/// A network or provider failure on either request fails the whole update.
/// A malformed body only drops its own section.
pub async fn fetch_dashboard<F: IconFetcher>(
    provider: &WeatherProvider,
    icons: &Mutex<IconCache<F>>,
    query: &str,
    today: NaiveDate,
) -> Result<WeatherUpdate, WeatherError> {
    let current = match provider.fetch_current(query).await {
        Ok(current) => Some(current),
        Err(e) if e.is_parse() => {
            tracing::warn!("Ignoring unreadable current conditions: {}", e);
            None
        }
        Err(e) => return Err(e.into()),
    };

    let forecast = match provider.fetch_forecast(query).await {
        Ok(entries) => Some(select_daily(&entries, today, &Local)),
        Err(e) if e.is_parse() => {
            tracing::warn!("Ignoring unreadable forecast: {}", e);
            None
        }
        Err(e) => return Err(e.into()),
    };

    let mut cache = icons.lock().await;

    let current = match current {
        Some(conditions) => {
            let icon = resolve_icon(&mut *cache, &conditions.icon_id).await;
            Some(CurrentSnapshot { conditions, icon })
        }
        None => None,
    };

    let forecast = match forecast {
        Some(days) => {
            let mut snapshots = Vec::with_capacity(days.len());
            for day in days {
                let icon = resolve_icon(&mut *cache, &day.icon_id).await;
                snapshots.push(ForecastSnapshot { day, icon });
            }
            Some(snapshots)
        }
        None => None,
    };

    Ok(WeatherUpdate {
        query: query.to_string(),
        current,
        forecast,
    })
}

async fn resolve_icon<F: IconFetcher>(cache: &mut IconCache<F>, icon_id: &str) -> Option<IconImage> {
    match cache.get_or_fetch(icon_id).await {
        Ok(icon) => Some(icon),
        Err(e) => {
            tracing::warn!("Icon {} unavailable: {}", icon_id, e);
            None
        }
    }
}
