//! Current-temperature providers.
//!
//! The anomaly pipeline only ever sees a resolved temperature; fetching it is
//! the job of a [`TemperatureProvider`]. Providers do not retry or cache.

use crate::error::{PipelineError, Result};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

/// OpenWeatherMap current-weather endpoint.
pub const OPENWEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

/// Upper bound on a single provider request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const INVALID_KEY_MESSAGE: &str =
    "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info.";

/// Something that can report the current temperature of a city in Celsius.
pub trait TemperatureProvider {
    fn current_temperature(&self, city: &str) -> Result<f64>;
}

/// Blocking OpenWeatherMap client.
pub struct OpenWeatherMap {
    api_key: String,
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OpenWeatherMap {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Provider {
                code: None,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: OPENWEATHER_URL.to_string(),
            client,
        })
    }

    /// Points the client at another endpoint with the same API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl TemperatureProvider for OpenWeatherMap {
    fn current_temperature(&self, city: &str) -> Result<f64> {
        debug!("Requesting current weather for {} from {}", city, self.base_url);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .map_err(|e| PipelineError::Provider {
                code: None,
                message: format!("Request for {} failed: {}", city, e),
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| PipelineError::Provider {
            code: Some(status),
            message: format!("Failed to read response for {}: {}", city, e),
        })?;

        parse_response(city, status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Maps an OpenWeatherMap status and body to a temperature or a typed failure.
fn parse_response(city: &str, status: u16, body: &str) -> Result<f64> {
    match status {
        200 => {
            let parsed: WeatherResponse = serde_json::from_str(body)?;
            Ok(parsed.main.temp)
        }
        401 => Err(PipelineError::InvalidCredential(INVALID_KEY_MESSAGE.to_string())),
        code => {
            let detail = serde_json::from_str::<ErrorResponse>(body)
                .map(|e| e.message)
                .unwrap_or_else(|_| "no details".to_string());
            Err(PipelineError::Provider {
                code: Some(code),
                message: format!(
                    "Failed to get weather for {} (status {}): {}",
                    city, code, detail
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_returns_main_temp() {
        let body = r#"{"weather":[{"main":"Clouds"}],"main":{"temp":-3.42,"humidity":80},"name":"Moscow"}"#;
        assert_eq!(parse_response("Moscow", 200, body).unwrap(), -3.42);
    }

    #[test]
    fn unauthorized_is_invalid_credential() {
        let body = r#"{"cod":401,"message":"Invalid API key"}"#;
        match parse_response("Moscow", 401, body) {
            Err(PipelineError::InvalidCredential(msg)) => assert!(msg.contains("error401")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn other_status_carries_code_and_detail() {
        let body = r#"{"cod":"404","message":"city not found"}"#;
        match parse_response("Nowhere", 404, body) {
            Err(PipelineError::Provider { code, message }) => {
                assert_eq!(code, Some(404));
                assert!(message.contains("city not found"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_json_error_body_still_maps_to_provider_error() {
        let err = parse_response("Moscow", 502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, PipelineError::Provider { code: Some(502), .. }));
    }

    #[test]
    fn malformed_success_body_is_json_error() {
        let err = parse_response("Moscow", 200, r#"{"main":{}}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }

    #[test]
    fn unreachable_endpoint_is_provider_error() {
        let provider = OpenWeatherMap::new("key", Duration::from_millis(500))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/data/2.5/weather");
        let err = provider.current_temperature("Moscow").unwrap_err();
        assert!(matches!(err, PipelineError::Provider { code: None, .. }));
    }
}
