use crate::services::weather_service::WeatherError as UiWeatherError;
use weatherdash_core::{AppError, NetworkError, WeatherError};

impl From<UiWeatherError> for AppError {
    fn from(e: UiWeatherError) -> Self {
        match e {
            UiWeatherError::Network(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
            UiWeatherError::Timeout => AppError::Network(NetworkError::Timeout),
            UiWeatherError::Provider { status: 401, .. } => {
                AppError::Weather(WeatherError::InvalidApiKey)
            }
            UiWeatherError::Provider {
                status: 404,
                message,
            } => AppError::Weather(WeatherError::LocationNotFound(message)),
            UiWeatherError::Provider { status, message } if status >= 500 => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            UiWeatherError::Provider { status, message } => {
                AppError::Weather(WeatherError::ApiError(format!("{}: {}", status, message)))
            }
            UiWeatherError::InvalidData(s) => AppError::Weather(WeatherError::InvalidData(s)),
            UiWeatherError::NotInitialized => AppError::Weather(WeatherError::ServiceUnavailable),
        }
    }
}
