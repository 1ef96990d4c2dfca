use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    config::{Config, RetryConfig, normalize_base_url},
    error::{ErrorKind, ServiceError},
    model::{WeatherQuery, WeatherResult},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    retry: RetryConfig,
    http: Client,
}

/// Outcome of a single upstream call.
#[derive(Debug)]
enum Attempt {
    Done(WeatherResult),
    /// Retrying cannot help.
    Fatal(ServiceError),
    /// May succeed on the next attempt.
    Transient(ServiceError),
}

impl OpenWeatherProvider {
    /// `base_url` is the API root, e.g. `https://api.openweathermap.org/data/2.5`.
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        retry: RetryConfig,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(retry.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let base_url = normalize_base_url(base_url);

        info!(
            base_url = %base_url,
            api_key_present = api_key.is_some(),
            max_retries = retry.max_retries,
            timeout_secs = retry.timeout.as_secs(),
            "Initialized OpenWeather provider"
        );

        Ok(Self {
            api_key,
            base_url,
            retry,
            http,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            config.api_key().map(str::to_owned),
            &config.base_url(),
            config.retry_config(),
        )
    }

    async fn fetch_current(&self, city: &str) -> Result<WeatherResult, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ServiceError::new(
                ErrorKind::ApiKeyMissing,
                "OpenWeather API key is not configured",
            )
        })?;

        let url = format!("{}/weather", self.base_url);
        let max_retries = self.retry.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..max_retries {
            info!(
                city,
                attempt = attempt + 1,
                max_retries,
                "Requesting current weather"
            );

            match self.attempt(&url, city, api_key).await {
                Attempt::Done(result) => return Ok(result),
                Attempt::Fatal(err) => return Err(err),
                Attempt::Transient(err) => {
                    warn!(
                        "Attempt {}/{} for '{}' failed ({}): {}",
                        attempt + 1,
                        max_retries,
                        city,
                        err.kind(),
                        err
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ServiceError::internal("No attempts were made")))
    }

    async fn attempt(&self, url: &str, city: &str, api_key: &str) -> Attempt {
        debug!("GET {url} q={city}");

        let res = match self
            .http
            .get(url)
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => return Attempt::Transient(transport_error(err)),
        };

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            debug!("OpenWeather responded {status}: {}", truncate_body(&body));
            return classify_status(status, city);
        }

        let body = match res.text().await {
            Ok(body) => body,
            Err(err) => return Attempt::Transient(transport_error(err)),
        };

        match parse_current(&body) {
            Ok(result) => Attempt::Done(result),
            Err(err) => Attempt::Transient(err),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherResult, ServiceError> {
        self.fetch_current(query.city()).await
    }
}

/// `INTERNAL_ERROR` carrying the reqwest error and its causes, e.g.
/// "error sending request: client error (Connect): tcp connect error: ...".
/// The URL is dropped because its query carries the api key.
fn transport_error(err: reqwest::Error) -> ServiceError {
    let err = err.without_url();
    let mut message = err.to_string();

    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    ServiceError::internal(message)
}

/// Map a non-2xx status onto the error taxonomy.
fn classify_status(status: StatusCode, city: &str) -> Attempt {
    match status {
        StatusCode::NOT_FOUND => {
            Attempt::Fatal(ServiceError::city_not_found(format!(
                "City '{city}' not found"
            )))
        }
        StatusCode::UNAUTHORIZED => {
            Attempt::Fatal(ServiceError::new(ErrorKind::ApiKeyInvalid, "Invalid API key"))
        }
        StatusCode::INTERNAL_SERVER_ERROR => Attempt::Transient(ServiceError::new(
            ErrorKind::ApiError,
            "Failed to fetch weather data",
        )),
        other => Attempt::Transient(ServiceError::new(
            ErrorKind::ApiError,
            format!("Unexpected status code: {}", other.as_u16()),
        )),
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

fn parse_current(body: &str) -> Result<WeatherResult, ServiceError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body).map_err(|e| {
        ServiceError::internal(format!("Failed to parse OpenWeather current JSON: {e}"))
    })?;

    let description = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| {
            ServiceError::internal("OpenWeather response contained no weather data")
        })?;

    Ok(WeatherResult {
        temperature: parsed.main.temp,
        humidity: parsed.main.humidity,
        pressure: parsed.main.pressure,
        description,
        wind_speed: parsed.wind.speed,
        city: parsed.name,
        country: parsed.sys.country,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
