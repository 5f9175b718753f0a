//! Exchange rate state: fetching, caching and staleness of the USD/BRL quote

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::error::FetchError;

pub const BASE_CURRENCY: &str = "USD";
pub const TARGET_CURRENCY: &str = "BRL";

/// A remote service able to quote one currency in terms of another.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_rate(&self, base: &str, target: &str) -> Result<f64, FetchError>;
}

/// 1 USD = `value` BRL, as of `fetched_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate {
    pub value: f64,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateStatus {
    pub rate: Option<ExchangeRate>,
    pub loading: bool,
    pub last_error: Option<FetchError>,
}

/// Owns the current exchange rate. Cloning yields a handle to the same state.
#[derive(Clone)]
pub struct RateProvider {
    source: Arc<dyn QuoteSource>,
    status: Arc<watch::Sender<RateStatus>>,
    in_flight: Arc<AtomicBool>,
    max_age: Option<Duration>,
}

impl RateProvider {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        let (status, _) = watch::channel(RateStatus::default());
        Self {
            source,
            status: Arc::new(status),
            in_flight: Arc::new(AtomicBool::new(false)),
            max_age: None,
        }
    }

    /// Rates older than `max_age` are reported stale.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn current_rate(&self) -> Option<ExchangeRate> {
        self.status.borrow().rate
    }

    pub fn status(&self) -> RateStatus {
        self.status.borrow().clone()
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.status.borrow().last_error.clone()
    }

    pub fn is_stale(&self) -> bool {
        match (self.current_rate(), self.max_age) {
            (Some(rate), Some(max_age)) => rate.age() > max_age,
            _ => false,
        }
    }

    /// Receiver notified whenever a fetch starts or completes.
    pub fn subscribe(&self) -> watch::Receiver<RateStatus> {
        self.status.subscribe()
    }

    /// Fetches the rate once. On failure the stored rate is reset to unset.
    pub async fn refresh(&self) -> Result<ExchangeRate, FetchError> {
        self.fetch_and_publish(false).await
    }

    /// When `release_guard` is set, the background guard is cleared in the
    /// same update that publishes the result, before subscribers are woken.
    #[instrument(name = "RateRefresh", skip(self))]
    async fn fetch_and_publish(&self, release_guard: bool) -> Result<ExchangeRate, FetchError> {
        self.status.send_modify(|s| s.loading = true);

        let result = self
            .source
            .fetch_rate(BASE_CURRENCY, TARGET_CURRENCY)
            .await
            .and_then(|value| {
                if value.is_finite() && value > 0.0 {
                    Ok(value)
                } else {
                    Err(FetchError::MissingRate(TARGET_CURRENCY.to_string()))
                }
            });

        let rate = result.map(|value| ExchangeRate {
            value,
            fetched_at: Utc::now(),
        });

        match &rate {
            Ok(rate) => info!(rate = rate.value, "Exchange rate updated"),
            Err(e) => warn!(error = %e, "Exchange rate fetch failed"),
        }

        self.status.send_modify(|s| {
            if release_guard {
                self.in_flight.store(false, Ordering::Release);
            }
            s.loading = false;
            match &rate {
                Ok(rate) => {
                    s.rate = Some(*rate);
                    s.last_error = None;
                }
                Err(e) => {
                    s.rate = None;
                    s.last_error = Some(e.clone());
                }
            }
        });

        rate
    }

    /// Spawns `refresh` in the background. Returns `None` when a background
    /// refresh is already outstanding or no tokio runtime is running.
    pub fn request_refresh(&self) -> Option<JoinHandle<Result<ExchangeRate, FetchError>>> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("Background refresh already in flight");
            return None;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                self.in_flight.store(false, Ordering::Release);
                warn!(error = %e, "No runtime available for background refresh");
                return None;
            }
        };

        debug!("Spawning background refresh");
        let provider = self.clone();
        Some(handle.spawn(async move { provider.fetch_and_publish(true).await }))
    }
}
