//! The fetch-wrapping boundary between the backend and the query engine.
//!
//! Every repository call made here runs under the configured timeout.
//! Failures never reach the engine: they start the availability
//! countdown and are reported back as a [`LoadOutcome`]. A superseded
//! load neither applies its products nor starts the countdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::model::{FetchError, Product};
use crate::monitor::{AvailabilityMonitor, AvailabilityState, MonitorConfig};
use crate::query::{CatalogQueryEngine, QueryDefaults, QueryState};
use crate::repository::ProductRepository;

/// Result of a catalog load attempt.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The catalog was replaced with this many products.
    Loaded(usize),
    /// A newer load was started before this one finished; its result was dropped.
    Stale,
    /// The fetch failed; the availability countdown has been started if the
    /// failure points at an outage.
    Unavailable(FetchError),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

pub struct CatalogSession<R: ProductRepository> {
    repository: Arc<R>,
    engine: Mutex<CatalogQueryEngine>,
    monitor: AvailabilityMonitor,
    fetch_timeout: Duration,
    generation: AtomicU64,
    last_loaded_at: Mutex<Option<DateTime<Utc>>>,
}

impl<R: ProductRepository> CatalogSession<R> {
    pub fn new(repository: Arc<R>, config: &AppConfig) -> Self {
        Self::with_parts(
            repository,
            CatalogQueryEngine::new(QueryDefaults::from(config)),
            AvailabilityMonitor::new(MonitorConfig::from(config)),
            config.fetch_timeout(),
        )
    }

    pub fn with_parts(
        repository: Arc<R>,
        engine: CatalogQueryEngine,
        monitor: AvailabilityMonitor,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            engine: Mutex::new(engine),
            monitor,
            fetch_timeout,
            generation: AtomicU64::new(0),
            last_loaded_at: Mutex::new(None),
        }
    }

    /// Fetches the full catalog and hands it to the engine.
    ///
    /// Only the most recently started load may apply its result or mark
    /// the backend down.
    pub async fn load(&self) -> LoadOutcome {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.timed(self.repository.fetch_all()).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            info!("Discarding stale catalog response (ticket {})", ticket);
            return LoadOutcome::Stale;
        }

        match result {
            Ok(products) => {
                let count = products.len();
                self.engine.lock().await.set_products(products);
                *self.last_loaded_at.lock().await = Some(Utc::now());
                info!("Catalog loaded: {} products", count);
                LoadOutcome::Loaded(count)
            }
            Err(e) => {
                self.report_failure(&e);
                LoadOutcome::Unavailable(e)
            }
        }
    }

    /// Manual "try again".
    pub async fn retry(&self) -> LoadOutcome {
        self.load().await
    }

    /// Waits for the availability countdown to finish, then loads.
    pub async fn retry_when_available(&self) -> LoadOutcome {
        self.monitor.wait_until_up().await;
        self.load().await
    }

    /// Fetches a single product for a detail view. The catalog itself is
    /// left untouched.
    pub async fn fetch_product(&self, id: &str) -> Result<Product, FetchError> {
        let result = self.timed(self.repository.fetch_by_id(id)).await;
        if let Err(e) = &result {
            self.report_failure(e);
        }
        result
    }

    /// Runs a repository call under the fetch timeout.
    async fn timed<T>(
        &self,
        call: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                seconds: self.fetch_timeout.as_secs(),
            }),
        }
    }

    fn report_failure(&self, e: &FetchError) {
        warn!("Backend request failed: {}", e);
        if e.signals_outage() {
            self.monitor.start_timer();
        }
    }

    /// Runs `f` against the engine; used for every criteria mutation.
    pub async fn with_engine<T>(&self, f: impl FnOnce(&mut CatalogQueryEngine) -> T) -> T {
        let mut engine = self.engine.lock().await;
        f(&mut engine)
    }

    pub async fn query_state(&self) -> QueryState {
        self.engine.lock().await.query_state()
    }

    pub fn availability(&self) -> AvailabilityState {
        self.monitor.state()
    }

    pub fn monitor(&self) -> &AvailabilityMonitor {
        &self.monitor
    }

    pub async fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        *self.last_loaded_at.lock().await
    }
}
