//! Client-side catalog core for a storefront: product search, facet
//! filtering, sorting and pagination over the fetched catalog, plus the
//! backend availability countdown that gates retries.

pub mod config;
pub mod model;
pub mod monitor;
pub mod query;
pub mod repository;
pub mod session;
pub mod utils;

pub use config::{AppConfig, ConfigError, load_config};
pub use model::{FetchError, Product};
pub use monitor::{AvailabilityMonitor, AvailabilityState, MonitorConfig};
pub use query::{CatalogQueryEngine, FilterCriteria, QueryDefaults, QueryState, SortKey};
pub use repository::{HttpProductRepository, ProductRepository};
pub use session::{CatalogSession, LoadOutcome};
