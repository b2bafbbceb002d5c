//! Weather data for WeatherDash
//!
//! Fetches current conditions and the 5-day/3-hour forecast from
//! OpenWeatherMap, reduces the forecast to one reading per day, and caches
//! decoded condition icons.

pub mod forecast;
pub mod icons;
pub mod provider;
pub mod types;

pub use forecast::{select_daily, MAX_FORECAST_DAYS};
pub use icons::{IconCache, IconFetcher, IconImage};
pub use provider::{ProviderConfig, WeatherProvider};
pub use types::*;
