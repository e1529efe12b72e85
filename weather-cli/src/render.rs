//! Text rendering for fetch states and weather data.

use chrono::{DateTime, Utc};
use myweather_core::{FetchState, ForecastSet, WeatherObservation};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// One-line status for transient states; results are printed separately.
pub fn progress(state: &FetchState) -> String {
    match state {
        FetchState::Loading => "Fetching weather...\n".to_string(),
        _ => String::new(),
    }
}

pub fn observation(obs: &WeatherObservation) -> String {
    format!(
        "{}, {} ({})\n  \
         {} ({})\n  \
         Temperature: {:.1}°C (feels like {:.1}°C, min {:.1}°C, max {:.1}°C)\n  \
         Humidity:    {}%\n  \
         Pressure:    {} hPa\n  \
         Wind:        {:.1} m/s from {} ({}°)\n  \
         Sunrise:     {}  Sunset: {}\n  \
         Observed:    {}\n",
        obs.location_name,
        obs.country_code,
        obs.coordinate,
        capitalize(&obs.condition_description),
        obs.condition_main,
        obs.temperature_c,
        obs.feels_like_c,
        obs.temp_min_c,
        obs.temp_max_c,
        obs.humidity_pct,
        obs.pressure_hpa,
        obs.wind_speed_mps,
        cardinal(obs.wind_direction_deg),
        obs.wind_direction_deg,
        time(obs.sunrise),
        time(obs.sunset),
        time(obs.observed_at),
    )
}

pub fn forecast(set: &ForecastSet, limit: usize) -> String {
    let mut out = format!("Forecast for {}, {}\n", set.location_name, set.country_code);

    for entry in set.entries.iter().take(limit) {
        let w = &entry.weather;
        out.push_str(&format!(
            "  {}  {:>5.1}°C  {:>3}%  {}\n",
            entry.forecast_at_text, w.temperature_c, w.humidity_pct, w.condition_description
        ));
    }
    if set.entries.len() > limit {
        out.push_str(&format!("  ... {} more\n", set.entries.len() - limit));
    }

    out
}

fn time(ts: DateTime<Utc>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cardinal(degrees: i32) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let idx = ((f64::from(degrees.rem_euclid(360)) + 22.5) / 45.0) as usize % 8;
    POINTS[idx]
}
