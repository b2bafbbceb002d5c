//! OpenWeatherMap client: current conditions, 5-day/3-hour forecast, icons.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::types::{CurrentConditions, ForecastEntry, Units, WeatherError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/w";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "WeatherDash/0.1.0";

/// Connection settings for [`WeatherProvider`]
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub icon_base_url: String,
    pub units: Units,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            units: Units::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    name: String,
    sys: SysSection,
    main: CurrentMain,
    weather: Vec<ConditionSection>,
    wind: WindSection,
}

#[derive(Debug, Deserialize)]
struct SysSection {
    country: String,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct WindSection {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionSection {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: ForecastMain,
    weather: Vec<ConditionSection>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
}

/// Error body, e.g. `{"cod": "404", "message": "city not found"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn first_condition(weather: Vec<ConditionSection>) -> Result<ConditionSection, WeatherError> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Parse("missing weather condition".to_string()))
}

impl TryFrom<CurrentResponse> for CurrentConditions {
    type Error = WeatherError;

    fn try_from(resp: CurrentResponse) -> Result<Self, Self::Error> {
        let condition = first_condition(resp.weather)?;
        Ok(Self {
            city: resp.name,
            country: resp.sys.country,
            temperature: resp.main.temp,
            description: condition.description,
            humidity: resp.main.humidity,
            wind_speed: resp.wind.speed,
            icon_id: condition.icon,
        })
    }
}

impl TryFrom<ForecastItem> for ForecastEntry {
    type Error = WeatherError;

    fn try_from(item: ForecastItem) -> Result<Self, Self::Error> {
        let condition = first_condition(item.weather)?;
        Ok(Self {
            timestamp: item.dt,
            temperature: item.main.temp,
            icon_id: condition.icon,
            description: condition.description,
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    config: ProviderConfig,
}

impl WeatherProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub fn units(&self) -> Units {
        self.config.units
    }

    /// Current conditions for a place name.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(&self, location: &str) -> Result<CurrentConditions, WeatherError> {
        let resp: CurrentResponse = self.get_json("weather", location).await?;
        CurrentConditions::try_from(resp)
    }

    /// The raw 3-hour forecast series for a place name, in provider order.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, location: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
        let resp: ForecastResponse = self.get_json("forecast", location).await?;
        tracing::debug!("Forecast returned {} entries", resp.list.len());
        resp.list.into_iter().map(ForecastEntry::try_from).collect()
    }

    /// Raw PNG bytes for a condition icon.
    #[instrument(skip(self), level = "debug")]
    pub async fn download_icon(&self, icon_id: &str) -> Result<Vec<u8>, WeatherError> {
        let url = Url::parse(&format!(
            "{}/{}.png",
            self.config.icon_base_url.trim_end_matches('/'),
            icon_id
        ))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Provider {
                status: status.as_u16(),
                message: format!("icon {} unavailable", icon_id),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn endpoint(&self, path: &str, location: &str) -> Result<Url, WeatherError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path
        ))?;
        url.query_pairs_mut()
            .append_pair("q", location)
            .append_pair("appid", &self.config.api_key)
            .append_pair("units", self.config.units.as_query());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        location: &str,
    ) -> Result<T, WeatherError> {
        let url = self.endpoint(path, location)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            tracing::warn!("Weather API returned {}: {}", status, message);
            return Err(WeatherError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::Parse(format!("{} response: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> WeatherProvider {
        let mut config = ProviderConfig::new("test-key");
        config.api_base_url = server.uri();
        config.icon_base_url = format!("{}/img/w", server.uri());
        WeatherProvider::new(config).unwrap()
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "name": "London",
            "sys": {"country": "GB"},
            "main": {"temp": 11.37, "humidity": 81, "feels_like": 10.6},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "wind": {"speed": 4.12, "deg": 240},
            "cod": 200
        })
    }

    #[tokio::test]
    async fn test_fetch_current() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let current = provider_for(&server).fetch_current("London").await.unwrap();

        assert_eq!(current.city, "London");
        assert_eq!(current.country, "GB");
        assert_eq!(current.temperature, 11.37);
        assert_eq!(current.description, "light rain");
        assert_eq!(current.humidity, 81);
        assert_eq!(current.wind_speed, 4.12);
        assert_eq!(current.icon_id, "10d");
    }

    #[tokio::test]
    async fn test_fetch_current_encodes_location() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "São Paulo, BR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server).fetch_current("São Paulo, BR").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_current_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server).fetch_current("Atlantis").await;

        match result {
            Err(WeatherError::Provider { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "city not found");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_error_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = provider_for(&server).fetch_current("London").await;

        assert!(matches!(result, Err(WeatherError::Provider { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_fetch_current_malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "London",
                "main": {"temp": 11.0}
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server).fetch_current("London").await;

        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_current_empty_conditions() {
        let server = MockServer::start().await;
        let mut body = current_body();
        body["weather"] = serde_json::json!([]);

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let result = provider_for(&server).fetch_current("London").await;

        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_forecast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("q", "Oslo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200",
                "cnt": 2,
                "list": [
                    {
                        "dt": 1710115200,
                        "main": {"temp": -2.5, "humidity": 70},
                        "weather": [{"description": "snow", "icon": "13n"}]
                    },
                    {
                        "dt": 1710126000,
                        "main": {"temp": 0.4},
                        "weather": [{"description": "overcast clouds", "icon": "04d"}]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let entries = provider_for(&server).fetch_forecast("Oslo").await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, 1710115200);
        assert_eq!(entries[0].temperature, -2.5);
        assert_eq!(entries[0].icon_id, "13n");
        assert_eq!(entries[1].description, "overcast clouds");
    }

    #[tokio::test]
    async fn test_fetch_forecast_not_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = provider_for(&server).fetch_forecast("Oslo").await;

        assert!(matches!(result, Err(WeatherError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unit_system_in_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("units", "imperial"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"list": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ProviderConfig::new("k");
        config.api_base_url = format!("{}/", server.uri());
        config.units = Units::Imperial;
        let provider = WeatherProvider::new(config).unwrap();

        assert!(provider.fetch_forecast("Denver").await.unwrap().is_empty());
        assert_eq!(provider.units(), Units::Imperial);
    }

    #[tokio::test]
    async fn test_download_icon() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img/w/10d.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .mount(&server)
            .await;

        let bytes = provider_for(&server).download_icon("10d").await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_download_icon_missing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/img/w/zz.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = provider_for(&server).download_icon("zz").await;
        assert!(matches!(result, Err(WeatherError::Provider { status: 404, .. })));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = ProviderConfig::new("k");
        config.api_base_url = "not a url".to_string();
        let provider = WeatherProvider::new(config).unwrap();

        assert!(matches!(
            provider.endpoint("weather", "London"),
            Err(WeatherError::InvalidUrl(_))
        ));
    }
}
