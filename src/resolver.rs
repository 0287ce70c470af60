//! The permission → position → query flow behind one screen refresh.
//!
//! [`NearbyResolver::run_cycle`] is a plain sequential async function: ask
//! for permission, wait for a fix (retrying a bounded number of times with
//! exponential backoff), issue one geosearch query, and hand back the
//! normalized places. Nothing is retried once the query has been sent.

use crate::api::PlaceSource;
use crate::config::RetryConfig;
use crate::error::{LocationError, NetworkError, ResolveError};
use crate::location::{Accuracy, LocationProvider, Permission};
use crate::models::{Coordinates, Place};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How often, and how patiently, to ask for a position fix.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based): doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            initial_backoff: Duration::from_millis(cfg.initial_backoff_ms),
        }
    }
}

/// Result of a successful cycle.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub coordinates: Coordinates,
    pub locale: String,
    pub places: Vec<Place>,
}

#[derive(Clone)]
pub struct NearbyResolver {
    location: Arc<dyn LocationProvider>,
    source: Arc<dyn PlaceSource>,
    retry: RetryPolicy,
}

impl NearbyResolver {
    pub fn new(
        location: Arc<dyn LocationProvider>,
        source: Arc<dyn PlaceSource>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            location,
            source,
            retry,
        }
    }

    /// One geosearch query around `at`. Order is whatever the API returned.
    pub async fn resolve(&self, at: Coordinates, locale: &str) -> Result<Vec<Place>, NetworkError> {
        self.source.nearby(at, locale).await
    }

    pub async fn run_cycle(&self, locale: &str) -> Result<Resolution, ResolveError> {
        if self.location.request_permission().await == Permission::Denied {
            warn!("Location permission denied; not querying");
            return Err(ResolveError::PermissionDenied);
        }

        let coordinates = self.wait_for_fix().await?;
        let places = self.resolve(coordinates, locale).await?;

        Ok(Resolution {
            coordinates,
            locale: locale.to_string(),
            places,
        })
    }

    async fn wait_for_fix(&self) -> Result<Coordinates, ResolveError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.location.current_position(Accuracy::High).await {
                Ok(at) => return Ok(at),
                Err(LocationError::PermissionDenied) => return Err(ResolveError::PermissionDenied),
                Err(e @ LocationError::InvalidCoordinates { .. }) => {
                    warn!("Provider returned {}; not retrying", e);
                    return Err(ResolveError::InvalidFix(e));
                }
                Err(e) if attempt >= self.retry.max_attempts => {
                    warn!("Giving up on position fix after {} attempts: {}", attempt, e);
                    return Err(ResolveError::LocationUnavailable { attempts: attempt });
                }
                Err(e) => {
                    let delay = self.retry.backoff(attempt);
                    info!("No fix ({}); retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeLocation {
        permission: Permission,
        failures_before_fix: u32,
        out_of_range: bool,
        calls: AtomicU32,
    }

    impl FakeLocation {
        fn new(permission: Permission, failures_before_fix: u32) -> Arc<Self> {
            Arc::new(Self {
                permission,
                failures_before_fix,
                out_of_range: false,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LocationProvider for FakeLocation {
        async fn request_permission(&self) -> Permission {
            self.permission
        }

        async fn current_position(&self, _: Accuracy) -> Result<Coordinates, LocationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.out_of_range {
                return Coordinates::new(95.0, 0.0);
            }
            if n < self.failures_before_fix {
                Err(LocationError::Unavailable("no fix yet".into()))
            } else {
                Ok(Coordinates { lat: 51.5, lon: -0.12 })
            }
        }
    }

    #[derive(Default)]
    struct FakeSource {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl PlaceSource for FakeSource {
        async fn nearby(&self, at: Coordinates, _: &str) -> Result<Vec<Place>, NetworkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NetworkError::Status(503));
            }
            Ok(vec![Place {
                id: 1,
                title: "Old Bridge".into(),
                coordinates: at,
                description: None,
                thumbnail: None,
            }])
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn permission_denied_never_queries() {
        let location = FakeLocation::new(Permission::Denied, 0);
        let source = Arc::new(FakeSource::default());
        let resolver = NearbyResolver::new(location.clone(), source.clone(), policy(3));

        let res = resolver.run_cycle("en").await;

        assert!(matches!(res, Err(ResolveError::PermissionDenied)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(location.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_cycle_returns_places() {
        let location = FakeLocation::new(Permission::Granted, 0);
        let source = Arc::new(FakeSource::default());
        let resolver = NearbyResolver::new(location, source.clone(), policy(3));

        let res = resolver.run_cycle("de").await.unwrap();

        assert_eq!(res.locale, "de");
        assert_eq!(res.coordinates, Coordinates { lat: 51.5, lon: -0.12 });
        assert_eq!(res.places.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_missing_fix_then_succeeds() {
        let location = FakeLocation::new(Permission::Granted, 2);
        let source = Arc::new(FakeSource::default());
        let resolver = NearbyResolver::new(location.clone(), source, policy(3));

        assert!(resolver.run_cycle("en").await.is_ok());
        assert_eq!(location.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let location = FakeLocation::new(Permission::Granted, u32::MAX);
        let source = Arc::new(FakeSource::default());
        let resolver = NearbyResolver::new(location.clone(), source.clone(), policy(4));

        let res = resolver.run_cycle("en").await;

        assert!(matches!(res, Err(ResolveError::LocationUnavailable { attempts: 4 })));
        assert_eq!(location.calls.load(Ordering::SeqCst), 4);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_fix_ends_cycle_without_retry() {
        let location = Arc::new(FakeLocation {
            permission: Permission::Granted,
            failures_before_fix: 0,
            out_of_range: true,
            calls: AtomicU32::new(0),
        });
        let source = Arc::new(FakeSource::default());
        let resolver = NearbyResolver::new(location.clone(), source.clone(), policy(5));

        let res = resolver.run_cycle("en").await;

        assert!(matches!(
            res,
            Err(ResolveError::InvalidFix(LocationError::InvalidCoordinates { .. }))
        ));
        assert_eq!(location.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn network_failure_is_not_retried() {
        let location = FakeLocation::new(Permission::Granted, 0);
        let source = Arc::new(FakeSource {
            fail: true,
            ..Default::default()
        });
        let resolver = NearbyResolver::new(location, source.clone(), policy(3));

        let res = resolver.run_cycle("en").await;

        assert!(matches!(res, Err(ResolveError::Network(NetworkError::Status(503)))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(500),
        };
        assert_eq!(p.backoff(1), Duration::from_millis(500));
        assert_eq!(p.backoff(2), Duration::from_millis(1000));
        assert_eq!(p.backoff(3), Duration::from_millis(2000));
        assert_eq!(p.backoff(40), MAX_BACKOFF);
    }

    #[test]
    fn zero_attempts_in_config_still_tries_once() {
        let p = RetryPolicy::from(&RetryConfig {
            max_attempts: 0,
            initial_backoff_ms: 10,
        });
        assert_eq!(p.max_attempts, 1);
    }
}
