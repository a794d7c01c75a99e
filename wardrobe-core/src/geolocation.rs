//! Contracts for the device location capabilities the resolver consumes.
//!
//! Both capabilities are optional in a given [`Environment`]: a missing
//! geolocation capability means "unsupported", a missing permission capability
//! means the resolver goes straight to a position request.

use async_trait::async_trait;
use std::{fmt, sync::Arc, time::Duration};

use crate::model::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
}

impl PositionOptions {
    /// Reduced-accuracy request with the given bound.
    pub fn coarse(timeout: Duration) -> Self {
        Self {
            enable_high_accuracy: false,
            timeout,
        }
    }
}

/// Numeric failure codes reported by a position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PositionErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

impl PositionErrorCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self::new(PositionErrorCode::Timeout, "timeout")
    }

    pub fn is_timeout(&self) -> bool {
        self.code == PositionErrorCode::Timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Permission query failed: {0}")]
pub struct PermissionError(pub String);

/// Single-shot position request.
#[async_trait]
pub trait Geolocation: Send + Sync + fmt::Debug {
    async fn current_position(&self, options: PositionOptions)
    -> Result<Coordinates, PositionError>;
}

/// Current permission state for the location capability.
#[async_trait]
pub trait PermissionQuery: Send + Sync + fmt::Debug {
    async fn query(&self) -> Result<PermissionState, PermissionError>;
}

/// The capabilities available to a resolution run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub geolocation: Option<Arc<dyn Geolocation>>,
    pub permissions: Option<Arc<dyn PermissionQuery>>,
}

impl Environment {
    /// An environment without any location capability.
    pub fn unsupported() -> Self {
        Self::default()
    }

    pub fn with_geolocation(mut self, geolocation: Arc<dyn Geolocation>) -> Self {
        self.geolocation = Some(geolocation);
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionQuery>) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

/// A geolocation capability that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation(pub Coordinates);

#[async_trait]
impl Geolocation for FixedGeolocation {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_code_is_three() {
        assert_eq!(PositionErrorCode::Timeout.code(), 3);
        assert!(PositionError::timeout().is_timeout());
        assert!(!PositionError::new(PositionErrorCode::PositionUnavailable, "no fix").is_timeout());
    }

    #[tokio::test]
    async fn fixed_geolocation_returns_its_position() {
        let coords = Coordinates::new(40.7, -74.0);
        let geo = FixedGeolocation(coords);

        let got = geo
            .current_position(PositionOptions::coarse(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(got, coords);
    }

    #[test]
    fn environment_builders() {
        let env = Environment::unsupported();
        assert!(env.geolocation.is_none());
        assert!(env.permissions.is_none());

        let env = env.with_geolocation(Arc::new(FixedGeolocation(Coordinates::new(0.0, 0.0))));
        assert!(env.geolocation.is_some());
    }
}
