use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use myweather_core::{
    Config, Coordinate, FetchCoordinator, FetchState, FixedLocation, WeatherClient,
    WeatherSource, config::API_KEY_ENV,
};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "myweather", version, about = "Current weather by city or location")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key.
    Configure,

    /// Show current weather for a city.
    City {
        /// City name, optionally with country code, e.g. "London,GB".
        name: String,
    },

    /// Show current weather for the current location.
    Here {
        /// Latitude reported by the location source.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude reported by the location source.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Show the multi-day forecast for a city.
    Forecast {
        name: String,

        /// Maximum number of entries to print.
        #[arg(long, default_value_t = 8)]
        limit: usize,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::City { name } => {
                let coordinator = FetchCoordinator::new(build_client()?);
                let state =
                    drive(coordinator, |c| async move { c.request_by_city(&name).await }).await?;
                finish(state)
            }
            Command::Here { lat, lon } => {
                let fix = lat.zip(lon).and_then(|(lat, lon)| Coordinate::new(lat, lon));
                let location = FixedLocation(fix);
                let coordinator = FetchCoordinator::new(build_client()?);
                let state = drive(coordinator, |c| async move {
                    c.request_by_location(&location).await
                })
                .await?;
                finish(state)
            }
            Command::Forecast { name, limit } => {
                let client = build_client()?;
                match client.fetch_forecast_by_city(&name).await {
                    Ok(set) => {
                        print!("{}", render::forecast(&set, limit));
                        Ok(())
                    }
                    Err(kind) => bail!("{kind}"),
                }
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_client() -> anyhow::Result<WeatherClient> {
    let config = Config::load()?;
    let client_config = config.client_config(std::env::var(API_KEY_ENV).ok())?;
    debug!(base_url = %client_config.base_url, timeout = ?client_config.timeout, "building client");

    WeatherClient::new(client_config).context("Failed to build HTTP client")
}

/// Run one request while a renderer follows the coordinator's state, and
/// return the state it settled on.
async fn drive<S, F, Fut>(
    coordinator: FetchCoordinator<S>,
    request: F,
) -> anyhow::Result<FetchState>
where
    S: WeatherSource,
    F: FnOnce(FetchCoordinator<S>) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut rx = coordinator.subscribe();
    let renderer = tokio::spawn(async move {
        // The loop ends once the coordinator (and its sender) is dropped.
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            eprint!("{}", render::progress(&state));
        }
        rx.borrow().clone()
    });

    request(coordinator).await;

    renderer.await.context("State renderer stopped unexpectedly")
}

fn finish(state: FetchState) -> anyhow::Result<()> {
    match state {
        FetchState::Success(obs) => {
            print!("{}", render::observation(&obs));
            Ok(())
        }
        FetchState::Failure { message, .. } => bail!("{message}"),
        FetchState::Idle | FetchState::Loading => bail!("Request finished without a result"),
    }
}
