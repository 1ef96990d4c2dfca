//! Core library for the weather proxy.
//!
//! This crate defines:
//! - Configuration loading (defaults, TOML file, environment)
//! - The upstream fetch with its retry loop and status classification
//! - Shared domain models (queries, results) and the error taxonomy
//!
//! It is used by `weather-server`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, OpenWeatherConfig, RetryConfig, ServerConfig};
pub use error::{ErrorKind, ServiceError};
pub use model::{WeatherQuery, WeatherResult};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
