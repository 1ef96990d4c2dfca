use crate::{
    Config, ServiceError, WeatherQuery, WeatherResult, provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// A source of current weather conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherResult, ServiceError>;

    /// Validate a raw city name, then look it up. Blank names never reach the network.
    async fn get_weather_for_city(&self, city: &str) -> Result<WeatherResult, ServiceError> {
        let query = WeatherQuery::new(city)?;
        self.get_weather(&query).await
    }
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::from_config(config)?;
    Ok(Arc::new(provider))
}
