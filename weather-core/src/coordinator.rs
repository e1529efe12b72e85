//! Observable lifecycle around weather lookups.
//!
//! A [`FetchCoordinator`] owns one [`FetchState`] cell. Every request moves it
//! to `Loading` and then to `Success` or `Failure`. Consumers either poll
//! [`FetchCoordinator::state`] or hold a receiver from
//! [`FetchCoordinator::subscribe`] and re-read on change.
//!
//! Requests may overlap. Each one takes a sequence number when it starts and
//! its result is only published if no newer request has started since, so
//! the last request initiated always decides the final state.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    client::WeatherSource,
    error::ErrorKind,
    location::LocationProvider,
    model::{Coordinate, FetchState, WeatherObservation},
};

pub struct FetchCoordinator<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    source: S,
    state: watch::Sender<FetchState>,
    latest: AtomicU64,
}

impl<S> Clone for FetchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: WeatherSource> FetchCoordinator<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self {
            inner: Arc::new(Inner {
                source,
                state,
                latest: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that is marked changed on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.inner.state.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.inner.source
    }

    pub async fn request_by_city(&self, city: &str) {
        let ticket = self.begin();
        info!(ticket, city, "fetching weather by city");

        let result = self.inner.source.fetch_by_city(city).await;
        self.finish(ticket, result);
    }

    pub async fn request_by_coordinate(&self, coord: Coordinate) {
        let ticket = self.begin();
        self.fetch_coordinate(ticket, coord).await;
    }

    /// Resolve the current position first; if that fails no lookup is made.
    pub async fn request_by_location<L>(&self, location: &L)
    where
        L: LocationProvider + ?Sized,
    {
        let ticket = self.begin();

        match location.current_location().await {
            Ok(coord) => self.fetch_coordinate(ticket, coord).await,
            Err(err) => {
                info!(ticket, error = %err, "location unavailable");
                self.finish(ticket, Err(ErrorKind::LocationUnavailable(err.to_string())));
            }
        }
    }

    async fn fetch_coordinate(&self, ticket: u64, coord: Coordinate) {
        info!(ticket, %coord, "fetching weather by coordinate");

        let result = self.inner.source.fetch_by_coordinate(coord).await;
        self.finish(ticket, result);
    }

    fn begin(&self) -> u64 {
        let mut ticket = 0;
        // The sequence bump happens under the channel lock so `finish` never
        // observes a ticket without the matching `Loading`.
        self.inner.state.send_modify(|state| {
            ticket = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = FetchState::Loading;
        });
        ticket
    }

    fn finish(&self, ticket: u64, result: Result<WeatherObservation, ErrorKind>) {
        let next = match result {
            Ok(obs) => FetchState::Success(obs),
            Err(kind) => FetchState::failure(kind),
        };

        self.inner.state.send_if_modified(|state| {
            let latest = self.inner.latest.load(Ordering::SeqCst);
            if latest != ticket {
                debug!(ticket, latest, "dropping superseded result");
                return false;
            }
            *state = next;
            true
        });
    }
}
