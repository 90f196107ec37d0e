// Query module: criteria, debounced search input and the catalog query engine.

pub mod criteria;
pub mod debounce;
pub mod engine;

pub use criteria::{
    ALL_CATEGORIES, CategoryFilter, FilterCriteria, ParseSortKeyError, PriceRange, SortKey,
};
pub use debounce::SearchDebouncer;
pub use engine::{CatalogQueryEngine, QueryDefaults, QueryState};
