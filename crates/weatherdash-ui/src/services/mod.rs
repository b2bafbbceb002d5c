pub mod weather_service;

pub use weather_service::{
    fetch_dashboard, request_fetch as request_weather_fetch, CurrentSnapshot, ForecastSnapshot,
    SharedIconCache, WeatherError, WeatherServiceMessage, WeatherUpdate,
};
