use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use serde::Serialize;
use weather_core::{Config, Params, WeatherService};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-api", version, about = "Caching weather API proxy")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind, overrides the config file.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides the config file.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Interactively set the API key and defaults, then save the config file.
    Configure,

    /// Fetch weather for one city through the full pipeline and print it.
    Weather {
        /// City id.
        city_id: String,

        #[arg(long)]
        language: Option<String>,
    },

    /// Search cities by name and print the matches.
    Cities {
        /// Free-text city name.
        query: String,

        #[arg(long)]
        language: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port } => {
                let mut config = load_config(self.config.as_deref())?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }

                server::run(build_service(config)?).await
            }
            Command::Configure => configure(self.config.as_deref()),
            Command::Weather { city_id, language } => {
                let service = build_service(load_config(self.config.as_deref())?)?;
                let result = service
                    .weather(Some(city_id.as_str()), &language_params(language))
                    .await?;
                print_json(&result)
            }
            Command::Cities { query, language } => {
                let service = build_service(load_config(self.config.as_deref())?)?;
                let mut params = language_params(language);
                params.insert("query".to_string(), query);
                let result = service.cities(&params).await?;
                print_json(&result)
            }
        }
    }
}

/// File (explicit path or platform default) with environment overrides on top.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = read_config_file(path)?;
    config.apply_env()?;
    Ok(config)
}

fn read_config_file(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn build_service(config: Config) -> anyhow::Result<WeatherService> {
    config.validate()?;
    WeatherService::from_config(config)
}

fn language_params(language: Option<String>) -> Params {
    language
        .map(|lang| Params::from([("language".to_string(), lang)]))
        .unwrap_or_default()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to render result as JSON")?;
    println!("{out}");
    Ok(())
}

fn configure(path: Option<&Path>) -> anyhow::Result<()> {
    // File values only: environment overrides must never be written back.
    let mut config = match path {
        Some(path) if !path.exists() => Config::default(),
        _ => read_config_file(path)?,
    };

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let supported = config.languages.supported.clone();
    let start = supported
        .iter()
        .position(|l| *l == config.languages.default)
        .unwrap_or(0);
    let language = Select::new("Default language:", supported)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read default language")?;

    let current_url = config.upstream.base_url.clone();
    let base_url = Text::new("Upstream base URL:")
        .with_default(&current_url)
        .prompt()
        .context("Failed to read base URL")?;

    config.upstream.api_key = api_key.trim().to_string();
    config.upstream.base_url = base_url;
    config.languages.default = language;
    config.validate()?;

    let saved = match path {
        Some(path) => {
            config.save_to(path)?;
            path.to_path_buf()
        }
        None => config.save()?,
    };
    println!("Configuration saved to {}", saved.display());

    Ok(())
}
