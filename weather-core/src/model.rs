use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::error::ErrorKind;

/// A latitude/longitude pair in decimal degrees. Both components are
/// always finite; build one with [`Coordinate::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Returns `None` unless both components are finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude.is_finite() && longitude.is_finite() {
            Some(Self { latitude, longitude })
        } else {
            None
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCoordinate::deserialize(deserializer)?;
        Coordinate::new(raw.latitude, raw.longitude).ok_or_else(|| {
            D::Error::custom(format!(
                "coordinate must be finite, got ({}, {})",
                raw.latitude, raw.longitude
            ))
        })
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Current conditions at a single location, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub location_name: String,
    pub country_code: String,
    pub coordinate: Coordinate,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub pressure_hpa: i32,
    pub humidity_pct: i32,
    pub wind_speed_mps: f64,
    pub wind_direction_deg: i32,
    pub condition_code: i32,
    pub condition_main: String,
    pub condition_description: String,
    pub icon_id: String,
    pub observed_at: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// The per-entry part of a forecast. The forecast endpoint reports no wind,
/// location or sun times for individual entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub pressure_hpa: i32,
    pub humidity_pct: i32,
    pub condition_code: i32,
    pub condition_main: String,
    pub condition_description: String,
    pub icon_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub forecast_at: DateTime<Utc>,
    /// Provider-formatted timestamp, e.g. `2024-05-01 12:00:00`.
    pub forecast_at_text: String,
    pub weather: ForecastConditions,
}

/// Forecast entries for one location, in the order the provider returned
/// them (chronological).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub location_name: String,
    pub country_code: String,
    pub entries: Vec<ForecastEntry>,
}

/// Lifecycle of the coordinator's current request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Success(WeatherObservation),
    Failure { kind: ErrorKind, message: String },
}

impl FetchState {
    pub fn failure(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        FetchState::Failure { kind, message }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn observation(&self) -> Option<&WeatherObservation> {
        match self {
            FetchState::Success(obs) => Some(obs),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchState::Failure { message, .. } => Some(message),
            _ => None,
        }
    }
}
