//! Location resolution and the weather view state it feeds.
//!
//! The automatic sequence is: capability check, permission pre-check, position
//! request (one extended retry on timeout), then a weather lookup for whichever
//! coordinates were settled on. Geolocation failures degrade to the fallback
//! coordinates and never stop the weather lookup.

use parking_lot::Mutex;
use std::{fmt, sync::Arc, time::Duration};

use crate::{
    geolocation::{
        Environment, Geolocation, PermissionState, PositionError, PositionErrorCode,
        PositionOptions,
    },
    model::{Coordinates, WeatherSnapshot},
    provider::{WeatherProvider, snapshot_from_raw},
};

pub const INITIAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const EXTENDED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Unsupported,
    PermissionDenied,
    Timeout,
    Position(String),
    WeatherFetch(String),
}

impl FailureReason {
    fn from_position_error(err: &PositionError) -> Self {
        match err.code {
            PositionErrorCode::PermissionDenied => FailureReason::PermissionDenied,
            PositionErrorCode::Timeout => FailureReason::Timeout,
            PositionErrorCode::PositionUnavailable => FailureReason::Position(err.message.clone()),
        }
    }

    pub fn is_geolocation(&self) -> bool {
        !matches!(self, FailureReason::WeatherFetch(_))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Unsupported => f.write_str("unsupported"),
            FailureReason::PermissionDenied => f.write_str("permission denied"),
            FailureReason::Timeout => f.write_str("timeout"),
            FailureReason::Position(msg) => f.write_str(msg),
            FailureReason::WeatherFetch(_) => f.write_str("weather fetch failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub reason: FailureReason,
    pub used_fallback: bool,
}

impl Failure {
    fn fallback(reason: FailureReason) -> Self {
        Self {
            reason,
            used_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Success(WeatherSnapshot),
    Failure(Failure),
    /// The view was torn down before the flow finished; nothing was applied.
    Superseded,
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResolutionOutcome::Success(_))
    }
}

/// Proof that a flow started under a given view generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct ViewState {
    generation: u64,
    snapshot: Option<WeatherSnapshot>,
    failure: Option<Failure>,
}

/// Owner of the current weather snapshot and the latest unresolved failure.
#[derive(Debug, Default)]
pub struct WeatherView {
    state: Mutex<ViewState>,
}

impl WeatherView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.state.lock().generation)
    }

    /// Discard the view: results from flows started before this call are dropped.
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        tracing::debug!("Weather view torn down (generation {})", state.generation);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.state.lock().generation == ticket.0
    }

    pub fn snapshot(&self) -> Option<WeatherSnapshot> {
        self.state.lock().snapshot.clone()
    }

    pub fn failure(&self) -> Option<Failure> {
        self.state.lock().failure.clone()
    }

    /// Text for the location banner, present while a failure is unresolved.
    pub fn banner(&self) -> Option<String> {
        self.failure().map(|failure| {
            format!(
                "Could not get your location ({}). Showing default location instead.",
                failure.reason
            )
        })
    }

    fn apply(&self, ticket: Ticket, update: impl FnOnce(&mut ViewState)) -> bool {
        let mut state = self.state.lock();
        if state.generation != ticket.0 {
            tracing::debug!("Dropping result from superseded resolution");
            return false;
        }
        update(&mut state);
        true
    }

    fn record_failure(&self, ticket: Ticket, failure: Failure) -> bool {
        self.apply(ticket, |state| state.failure = Some(failure))
    }
}

/// Position request bounds for the automatic and manual paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub initial: Duration,
    pub extended: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            initial: INITIAL_TIMEOUT,
            extended: EXTENDED_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    environment: Environment,
    provider: Arc<dyn WeatherProvider>,
    fallback: Coordinates,
    timeouts: Timeouts,
}

impl LocationResolver {
    pub fn new(
        environment: Environment,
        provider: Arc<dyn WeatherProvider>,
        fallback: Coordinates,
    ) -> Self {
        Self {
            environment,
            provider,
            fallback,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Run the automatic resolution sequence and apply its result to `view`.
    pub async fn resolve(&self, view: &WeatherView) -> ResolutionOutcome {
        let ticket = view.begin();

        let (coordinates, failure) = self.acquire().await;
        if !view.is_current(ticket) {
            return ResolutionOutcome::Superseded;
        }

        if let Some(failure) = failure {
            tracing::warn!(
                "Geolocation failed or was denied, using fallback coordinates: {}",
                failure.reason
            );
            view.record_failure(ticket, failure);
        }

        self.fetch(view, ticket, coordinates).await
    }

    /// Manual retry: one extended position request, no permission pre-check and
    /// no timeout retry. A failed request keeps the previous snapshot.
    pub async fn retry(&self, view: &WeatherView) -> ResolutionOutcome {
        let ticket = view.begin();
        self.retry_under(view, ticket).await
    }

    async fn retry_under(&self, view: &WeatherView, ticket: Ticket) -> ResolutionOutcome {
        view.apply(ticket, |state| state.failure = None);

        let Some(geolocation) = &self.environment.geolocation else {
            let failure = Failure::fallback(FailureReason::Unsupported);
            if !view.record_failure(ticket, failure.clone()) {
                return ResolutionOutcome::Superseded;
            }
            return ResolutionOutcome::Failure(failure);
        };

        match request_position(geolocation.as_ref(), self.timeouts.extended).await {
            Ok(coordinates) => {
                if !view.is_current(ticket) {
                    return ResolutionOutcome::Superseded;
                }
                self.fetch(view, ticket, coordinates).await
            }
            Err(err) => {
                tracing::warn!("Retry geolocation failed: {}", err);
                let failure = Failure::fallback(FailureReason::from_position_error(&err));
                if !view.record_failure(ticket, failure.clone()) {
                    return ResolutionOutcome::Superseded;
                }
                ResolutionOutcome::Failure(failure)
            }
        }
    }

    /// Settle on coordinates, reporting why the fallback was used if it was.
    async fn acquire(&self) -> (Coordinates, Option<Failure>) {
        let Some(geolocation) = &self.environment.geolocation else {
            return (self.fallback, Some(Failure::fallback(FailureReason::Unsupported)));
        };

        if let Some(permissions) = &self.environment.permissions {
            match permissions.query().await {
                Ok(PermissionState::Denied) => {
                    return (
                        self.fallback,
                        Some(Failure::fallback(FailureReason::PermissionDenied)),
                    );
                }
                Ok(state) => tracing::debug!("Location permission state: {:?}", state),
                Err(err) => tracing::debug!("{}, treating as prompt", err),
            }
        }

        let first = request_position(geolocation.as_ref(), self.timeouts.initial).await;
        let result = match first {
            Err(err) if err.is_timeout() => {
                tracing::debug!("Position request timed out, retrying with extended bound");
                request_position(geolocation.as_ref(), self.timeouts.extended).await
            }
            other => other,
        };

        match result {
            Ok(coordinates) => (coordinates, None),
            Err(err) => (
                self.fallback,
                Some(Failure::fallback(FailureReason::from_position_error(&err))),
            ),
        }
    }

    async fn fetch(
        &self,
        view: &WeatherView,
        ticket: Ticket,
        coordinates: Coordinates,
    ) -> ResolutionOutcome {
        match self.provider.get_weather(coordinates).await {
            Ok(raw) => {
                let snapshot = snapshot_from_raw(&raw);
                let applied = view.apply(ticket, |state| {
                    state.snapshot = Some(snapshot.clone());
                    state.failure = None;
                });
                if !applied {
                    return ResolutionOutcome::Superseded;
                }
                tracing::info!(
                    "Weather resolved: {} {}°F ({})",
                    snapshot.city,
                    snapshot.temperature.fahrenheit,
                    snapshot.classification
                );
                ResolutionOutcome::Success(snapshot)
            }
            Err(err) => {
                tracing::error!("Failed to fetch weather data: {:#}", err);
                let failure = Failure::fallback(FailureReason::WeatherFetch(format!("{err:#}")));
                if !view.record_failure(ticket, failure.clone()) {
                    return ResolutionOutcome::Superseded;
                }
                ResolutionOutcome::Failure(failure)
            }
        }
    }
}

/// Bounded single-shot position request; an elapsed bound counts as a timeout.
async fn request_position(
    geolocation: &dyn Geolocation,
    timeout: Duration,
) -> Result<Coordinates, PositionError> {
    let options = PositionOptions::coarse(timeout);
    tokio::time::timeout(timeout, geolocation.current_position(options))
        .await
        .unwrap_or_else(|_| Err(PositionError::timeout()))
}
