use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    error::ErrorKind,
    model::{Coordinate, ForecastConditions, ForecastEntry, ForecastSet, WeatherObservation},
    transport::{HttpTransport, ReqwestTransport, TransportError},
};

/// Anything that can turn a lookup into weather data.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherObservation, ErrorKind>;

    async fn fetch_by_coordinate(
        &self,
        coord: Coordinate,
    ) -> Result<WeatherObservation, ErrorKind>;

    async fn fetch_forecast_by_city(&self, city: &str) -> Result<ForecastSet, ErrorKind>;
}

/// Client for an OpenWeatherMap-compatible REST API.
///
/// Every lookup performs exactly one GET. Units are always metric.
#[derive(Debug, Clone)]
pub struct WeatherClient<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl WeatherClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self { config, transport })
    }
}

impl<T: HttpTransport> WeatherClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        lookup: &[(&str, String)],
    ) -> Result<R, ErrorKind> {
        let url = self.config.endpoint(endpoint);

        let mut query = lookup.to_vec();
        query.push(("units", "metric".to_string()));
        query.push(("appid", self.config.api_key.clone()));

        debug!(%url, ?lookup, "requesting weather data");

        let res = self.transport.get(&url, &query).await.map_err(|err| {
            let kind = classify_transport(err);
            warn!(%url, error = %kind, "weather request failed");
            kind
        })?;

        if !res.is_success() {
            let kind = ErrorKind::from_status(res.status, res.reason.as_deref());
            warn!(%url, status = res.status, error = %kind, "provider rejected request");
            return Err(kind);
        }

        serde_json::from_str(&res.body).map_err(|err| {
            warn!(%url, error = %err, "failed to decode provider response");
            ErrorKind::Malformed(format!("invalid response body: {err}"))
        })
    }
}

#[async_trait]
impl<T: HttpTransport> WeatherSource for WeatherClient<T> {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherObservation, ErrorKind> {
        let parsed: OwCurrentResponse =
            self.get_json("weather", &[("q", city.to_string())]).await?;
        parsed.try_into()
    }

    async fn fetch_by_coordinate(
        &self,
        coord: Coordinate,
    ) -> Result<WeatherObservation, ErrorKind> {
        let lookup = [
            ("lat", coord.latitude().to_string()),
            ("lon", coord.longitude().to_string()),
        ];
        let parsed: OwCurrentResponse = self.get_json("weather", &lookup).await?;
        parsed.try_into()
    }

    async fn fetch_forecast_by_city(&self, city: &str) -> Result<ForecastSet, ErrorKind> {
        let parsed: OwForecastResponse =
            self.get_json("forecast", &[("q", city.to_string())]).await?;
        parsed.try_into()
    }
}

fn classify_transport(err: TransportError) -> ErrorKind {
    match err {
        TransportError::Timeout => ErrorKind::Timeout,
        TransportError::NoConnectivity(_) => ErrorKind::NoConnectivity,
        TransportError::Other(detail) => ErrorKind::Unexpected(detail),
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: i32,
    humidity: i32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: i32,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    name: String,
    dt: i64,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastItem {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastItem>,
    city: OwCity,
}

impl TryFrom<OwCurrentResponse> for WeatherObservation {
    type Error = ErrorKind;

    fn try_from(parsed: OwCurrentResponse) -> Result<Self, Self::Error> {
        let condition = primary_condition(parsed.weather)?;
        let coordinate = Coordinate::new(parsed.coord.lat, parsed.coord.lon)
            .ok_or_else(|| ErrorKind::Malformed("coordinate is not finite".into()))?;

        Ok(WeatherObservation {
            location_name: parsed.name,
            country_code: parsed.sys.country,
            coordinate,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            temp_min_c: parsed.main.temp_min,
            temp_max_c: parsed.main.temp_max,
            pressure_hpa: parsed.main.pressure,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            wind_direction_deg: parsed.wind.deg,
            condition_code: condition.id,
            condition_main: condition.main,
            condition_description: condition.description,
            icon_id: condition.icon,
            observed_at: unix_to_utc(parsed.dt)?,
            sunrise: unix_to_utc(parsed.sys.sunrise)?,
            sunset: unix_to_utc(parsed.sys.sunset)?,
        })
    }
}

impl TryFrom<OwForecastResponse> for ForecastSet {
    type Error = ErrorKind;

    fn try_from(parsed: OwForecastResponse) -> Result<Self, Self::Error> {
        let entries = parsed
            .list
            .into_iter()
            .map(|item| -> Result<ForecastEntry, ErrorKind> {
                let condition = primary_condition(item.weather)?;
                Ok(ForecastEntry {
                    forecast_at: unix_to_utc(item.dt)?,
                    forecast_at_text: item.dt_txt,
                    weather: ForecastConditions {
                        temperature_c: item.main.temp,
                        feels_like_c: item.main.feels_like,
                        temp_min_c: item.main.temp_min,
                        temp_max_c: item.main.temp_max,
                        pressure_hpa: item.main.pressure,
                        humidity_pct: item.main.humidity,
                        condition_code: condition.id,
                        condition_main: condition.main,
                        condition_description: condition.description,
                        icon_id: condition.icon,
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ForecastSet {
            location_name: parsed.city.name,
            country_code: parsed.city.country,
            entries,
        })
    }
}

/// The provider lists conditions most-significant first.
fn primary_condition(weather: Vec<OwWeather>) -> Result<OwWeather, ErrorKind> {
    weather
        .into_iter()
        .next()
        .ok_or_else(|| ErrorKind::Malformed("response contained no weather conditions".into()))
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, ErrorKind> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| ErrorKind::Malformed(format!("timestamp out of range: {ts}")))
}
