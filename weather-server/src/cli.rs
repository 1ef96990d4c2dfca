use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{Config, WeatherResult, provider_from_config};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-proxy", version, about = "Current-weather HTTP proxy for OpenWeather")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Listen address; overrides config and WEATHER_BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Fetch current weather for a city once and print it.
    Show {
        /// City name, e.g. "London".
        city: String,
    },

    /// Store the OpenWeather API key in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let config = Config::load(self.config.as_deref())?;
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                server::serve(&config, &bind).await
            }
            Command::Show { city } => {
                let config = Config::load(self.config.as_deref())?;
                let provider = provider_from_config(&config)?;

                match provider.get_weather_for_city(&city).await {
                    Ok(result) => {
                        println!("{}", render(&result));
                        Ok(())
                    }
                    Err(err) => bail!("[{}] {}", err.kind(), err),
                }
            }
            Command::Configure => configure(self.config),
        }
    }
}

fn configure(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match path {
        Some(p) => p,
        None => Config::config_file_path()?,
    };

    // Only the file layer: environment values must not be persisted.
    let mut config = Config::load_file(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key);
    config.save(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn render(result: &WeatherResult) -> String {
    format!(
        "{}, {}\n  {}\n  Temperature: {:.1} °C\n  Humidity:    {}%\n  Pressure:    {} hPa\n  Wind:        {:.1} m/s",
        result.city,
        result.country,
        result.description,
        result.temperature,
        result.humidity,
        result.pressure,
        result.wind_speed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_bind_and_global_config() {
        let cli = Cli::try_parse_from([
            "weather-proxy",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--config",
            "/tmp/w.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/w.toml")));
        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.as_deref(), Some("127.0.0.1:9000")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn show_requires_a_city() {
        assert!(Cli::try_parse_from(["weather-proxy", "show"]).is_err());

        let cli = Cli::try_parse_from(["weather-proxy", "show", "Paris"]).unwrap();
        assert!(matches!(cli.command, Command::Show { ref city } if city == "Paris"));
    }

    #[test]
    fn render_contains_every_field() {
        let text = render(&WeatherResult {
            temperature: 20.5,
            humidity: 65,
            pressure: 1015,
            description: "clear sky".into(),
            wind_speed: 5.2,
            city: "London".into(),
            country: "GB".into(),
        });

        for needle in ["London, GB", "clear sky", "20.5 °C", "65%", "1015 hPa", "5.2 m/s"] {
            assert!(text.contains(needle), "missing {needle} in {text}");
        }
    }
}
