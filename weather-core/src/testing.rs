//! Scripted transport and provider payloads shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::transport::{HttpResponse, HttpTransport, TransportError};

pub const LONDON_CURRENT: &str = r#"{
    "coord": {"lon": -0.1257, "lat": 51.5085},
    "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
    "base": "stations",
    "main": {"temp": 15.2, "feels_like": 14.6, "temp_min": 13.9, "temp_max": 16.4, "pressure": 1019, "humidity": 72},
    "visibility": 10000,
    "wind": {"speed": 3.1, "deg": 240},
    "clouds": {"all": 0},
    "dt": 1714564800,
    "sys": {"type": 2, "id": 2075535, "country": "GB", "sunrise": 1714537200, "sunset": 1714591320},
    "timezone": 3600,
    "id": 2643743,
    "name": "London",
    "cod": 200
}"#;

pub const LONDON_FORECAST: &str = r#"{
    "cod": "200",
    "cnt": 2,
    "list": [
        {
            "dt": 1714564800,
            "main": {"temp": 15.2, "feels_like": 14.6, "temp_min": 13.9, "temp_max": 16.4, "pressure": 1019, "humidity": 72},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
            "wind": {"speed": 3.1, "deg": 240},
            "dt_txt": "2024-05-01 12:00:00"
        },
        {
            "dt": 1714575600,
            "main": {"temp": 13.1, "feels_like": 12.4, "temp_min": 12.8, "temp_max": 13.1, "pressure": 1018, "humidity": 80},
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
            "wind": {"speed": 4.0, "deg": 250},
            "dt_txt": "2024-05-01 15:00:00"
        }
    ],
    "city": {"id": 2643743, "name": "London", "country": "GB", "coord": {"lat": 51.5085, "lon": -0.1257}}
}"#;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Answers every request with the same scripted result and records what was asked.
pub struct FakeTransport {
    reply: Result<HttpResponse, TransportError>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn respond(status: u16, body: &str) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .map(str::to_owned);
        Self::with_reply(Ok(HttpResponse {
            status,
            reason,
            body: body.to_string(),
        }))
    }

    pub fn fail(err: TransportError) -> Self {
        Self::with_reply(Err(err))
    }

    pub fn with_reply(reply: Result<HttpResponse, TransportError>) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        self.reply.clone()
    }
}
