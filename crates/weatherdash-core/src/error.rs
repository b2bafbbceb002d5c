//! Error types for failed weather searches.
//!
//! The technical text (`Display`) goes to the log; `user_message()` is the
//! short sentence a person would be shown.

use thiserror::Error;

/// Why a search did not update the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Transport-level failures talking to the weather service.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Could not reach the weather service.",
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having problems. Try again later."
            }
            NetworkError::ServerError { .. } => "The weather service rejected the request.",
            NetworkError::InvalidResponse(_) => "The weather service sent an unreadable answer.",
        }
    }
}

/// Failures reported by the weather service itself.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Unexpected weather data: {0}")]
    InvalidData(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "No place by that name. Check the spelling.",
            WeatherError::ApiError(_) => "The weather service returned an error.",
            WeatherError::InvalidApiKey => {
                "The OpenWeatherMap API key was refused. Set weather.api_key or WEATHERDASH_API_KEY."
            }
            WeatherError::ServiceUnavailable => "Weather searches are not available right now.",
            WeatherError::InvalidData(_) => "The weather data could not be read.",
        }
    }
}

/// Classify a reqwest failure.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() || self.is_body() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
