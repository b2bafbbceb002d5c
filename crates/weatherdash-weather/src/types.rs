use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unit system requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    /// Value of the `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Self::Metric => "°C",
            Self::Imperial => "°F",
            Self::Standard => "K",
        }
    }

    pub fn wind_speed_suffix(&self) -> &'static str {
        match self {
            Self::Metric | Self::Standard => "m/s",
            Self::Imperial => "mph",
        }
    }
}

/// Current weather conditions for a named place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub description: String,
    /// Relative humidity in percent
    pub humidity: u8,
    pub wind_speed: f64,
    pub icon_id: String,
}

/// One 3-hour forecast slot as returned by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Unix timestamp (seconds) of the slot
    pub timestamp: i64,
    pub temperature: f64,
    pub icon_id: String,
    pub description: String,
}

/// The reading chosen to represent a whole future calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature: f64,
    pub icon_id: String,
    pub description: String,
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Provider error {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Icon decode error: {0}")]
    Render(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl WeatherError {
    /// True when the provider answered but the body was not what we expected.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
