//! Core library for `myweather`.
//!
//! This crate defines:
//! - The weather data model and the fetch-state lifecycle
//! - A client for OpenWeatherMap-compatible REST APIs with typed error classification
//! - A fetch coordinator that exposes the current request's state to a consumer
//! - Configuration & credentials handling
//!
//! It is used by `myweather-cli`, but any front-end can drive the coordinator
//! and render its [`FetchState`].

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod location;
pub mod model;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::{WeatherClient, WeatherSource};
pub use config::{ClientConfig, Config};
pub use coordinator::FetchCoordinator;
pub use error::ErrorKind;
pub use location::{FixedLocation, LocationError, LocationProvider};
pub use model::{
    Coordinate, FetchState, ForecastConditions, ForecastEntry, ForecastSet, WeatherObservation,
};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
