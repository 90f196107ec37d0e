use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::config::AppConfig;
use crate::model::Product;
use crate::query::criteria::{
    ALL_CATEGORIES, CategoryFilter, FilterCriteria, MAX_RATING, PriceRange, SortKey,
};
use crate::query::debounce::SearchDebouncer;
use crate::utils::{contains_ignore_case, finite_or};

/// Construction-time settings for [`CatalogQueryEngine`].
#[derive(Debug, Clone)]
pub struct QueryDefaults {
    pub page_size: usize,
    /// Lower bound for the price ceiling when the catalog holds only cheap items.
    pub price_ceiling_fallback: f64,
    pub search_debounce: Duration,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for QueryDefaults {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            price_ceiling_fallback: config.price_ceiling_fallback,
            search_debounce: config.search_debounce(),
        }
    }
}

/// Read model handed to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub visible_products: Vec<Product>,
    pub total_pages: usize,
    pub current_page: usize,
    pub total_matches: usize,
    pub categories: Vec<String>,
    pub price_ceiling: f64,
    pub raw_search_text: String,
    pub criteria: FilterCriteria,
}

/// Indices of `products` that pass every active facet, in display order.
///
/// Stages run in a fixed order: category, text search, price, rating, then
/// a stable sort. `SortKey::Default` keeps collection order.
pub fn apply_filters(products: &[Product], criteria: &FilterCriteria) -> Vec<usize> {
    let needle = criteria.search_text.as_str();

    let mut matches: Vec<usize> = products
        .iter()
        .enumerate()
        .filter(|(_, p)| criteria.category.matches(&p.category))
        .filter(|(_, p)| {
            needle.is_empty() || contains_ignore_case(&searchable_text(p), needle)
        })
        .filter(|(_, p)| criteria.price_range.contains(p.price_after_discount))
        .filter(|(_, p)| p.effective_rating() >= criteria.min_rating)
        .map(|(i, _)| i)
        .collect();

    let by_price = |a: &usize, b: &usize| -> Ordering {
        products[*a]
            .price_after_discount
            .total_cmp(&products[*b].price_after_discount)
    };

    // sort_by is stable, ties keep collection order
    match criteria.sort_key {
        SortKey::Default => {}
        SortKey::PriceAsc => matches.sort_by(by_price),
        SortKey::PriceDesc => matches.sort_by(|a, b| by_price(b, a)),
        SortKey::RatingDesc => matches.sort_by(|a, b| {
            products[*b]
                .effective_rating()
                .total_cmp(&products[*a].effective_rating())
        }),
    }

    matches
}

/// Text the search facet runs against: name, description and category
/// joined by single spaces.
pub fn searchable_text(product: &Product) -> String {
    format!("{} {} {}", product.name, product.description, product.category)
}

/// `ceil(count / page_size)`, never less than 1.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Search, facet filtering, sorting and pagination over an in-memory catalog.
#[derive(Debug, Clone)]
pub struct CatalogQueryEngine {
    defaults: QueryDefaults,
    products: Vec<Product>,
    categories: Vec<String>,
    price_ceiling: f64,
    criteria: FilterCriteria,
    search: SearchDebouncer,
    matches: Vec<usize>,
}

impl CatalogQueryEngine {
    pub fn new(defaults: QueryDefaults) -> Self {
        let price_ceiling = defaults.price_ceiling_fallback.max(0.0);
        Self {
            criteria: FilterCriteria::new(defaults.page_size, price_ceiling),
            search: SearchDebouncer::new(defaults.search_debounce),
            categories: vec![ALL_CATEGORIES.to_string()],
            products: Vec::new(),
            matches: Vec::new(),
            price_ceiling,
            defaults,
        }
    }

    pub fn with_products(defaults: QueryDefaults, products: Vec<Product>) -> Self {
        let mut engine = Self::new(defaults);
        engine.set_products(products);
        engine
    }

    /// Replaces the catalog. Categories and the price ceiling are derived
    /// again; a price range still at its default widens to the new ceiling.
    pub fn set_products(&mut self, products: Vec<Product>) {
        let previous_default = PriceRange::new(0.0, self.price_ceiling);

        self.products = products;
        self.categories = Self::collect_categories(&self.products);
        self.price_ceiling = self
            .products
            .iter()
            .map(|p| p.price_after_discount)
            .filter(|p| p.is_finite())
            .fold(self.defaults.price_ceiling_fallback.max(0.0), f64::max);

        if self.criteria.price_range == previous_default {
            self.criteria.price_range = PriceRange::new(0.0, self.price_ceiling);
        }

        debug!(
            "Catalog replaced: {} products, {} categories, ceiling {:.2}",
            self.products.len(),
            self.categories.len() - 1,
            self.price_ceiling
        );
        self.recompute();
    }

    fn collect_categories(products: &[Product]) -> Vec<String> {
        let distinct: BTreeSet<&str> = products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
            .collect();

        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(distinct.into_iter().map(str::to_string))
            .collect()
    }

    fn recompute(&mut self) {
        self.matches = apply_filters(&self.products, &self.criteria);
        let total = self.total_pages();
        self.criteria.page = self.criteria.page.clamp(1, total);
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.search.reset_to(text);
        self.criteria.search_text = text.to_string();
        self.recompute();
    }

    /// Records a keystroke without touching the committed criteria.
    pub fn type_search_text(&mut self, text: &str, now: Instant) {
        self.search.input(text, now);
    }

    /// Commits typed search text once its quiet period has passed.
    /// Returns true when the result set was recomputed.
    pub fn commit_due_search(&mut self, now: Instant) -> bool {
        match self.search.take_due(now) {
            Some(text) if text != self.criteria.search_text => {
                self.criteria.search_text = text;
                self.recompute();
                true
            }
            _ => false,
        }
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search.deadline()
    }

    pub fn raw_search_text(&self) -> &str {
        self.search.raw_text()
    }

    pub fn set_category(&mut self, category: &str) {
        self.criteria.category = CategoryFilter::parse(category);
        self.recompute();
    }

    /// Crossed bounds are swapped; a NaN or infinite bound keeps its old value.
    pub fn set_price_range(&mut self, min: f64, max: f64) {
        self.criteria.price_range = PriceRange::sanitized(min, max, self.criteria.price_range);
        self.recompute();
    }

    pub fn set_min_rating(&mut self, rating: f64) {
        self.criteria.min_rating =
            finite_or(rating, self.criteria.min_rating).clamp(0.0, MAX_RATING);
        self.recompute();
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.criteria.sort_key = key;
        self.recompute();
    }

    /// Parses `raw` as a sort key; unknown keys keep the current one.
    pub fn set_sort_key_str(&mut self, raw: &str) {
        if let Ok(key) = raw.parse() {
            self.set_sort_key(key);
        }
    }

    /// Clamped to `[1, total_pages]`.
    pub fn set_page(&mut self, page: usize) {
        self.criteria.page = page;
        self.recompute();
    }

    pub fn reset(&mut self) {
        self.criteria = FilterCriteria::new(self.defaults.page_size, self.price_ceiling);
        self.search.reset_to("");
        self.recompute();
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn price_ceiling(&self) -> f64 {
        self.price_ceiling
    }

    pub fn available_categories(&self) -> &[String] {
        &self.categories
    }

    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn total_pages(&self) -> usize {
        page_count(self.matches.len(), self.criteria.page_size)
    }

    pub fn current_page(&self) -> usize {
        self.criteria.page
    }

    /// The full filtered and sorted result set, across all pages.
    pub fn filtered_products(&self) -> Vec<&Product> {
        self.matches.iter().map(|&i| &self.products[i]).collect()
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        let size = self.criteria.page_size;
        let start = (self.criteria.page - 1) * size;
        self.matches
            .iter()
            .skip(start)
            .take(size)
            .map(|&i| &self.products[i])
            .collect()
    }

    pub fn query_state(&self) -> QueryState {
        QueryState {
            visible_products: self.visible_products().into_iter().cloned().collect(),
            total_pages: self.total_pages(),
            current_page: self.current_page(),
            total_matches: self.total_matches(),
            categories: self.categories.clone(),
            price_ceiling: self.price_ceiling,
            raw_search_text: self.search.raw_text().to_string(),
            criteria: self.criteria.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str, category: &str, price: f64, rating: Option<f64>) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            price_before_discount: price,
            price_after_discount: price,
            rating,
            stock_remaining: 10,
        }
    }

    fn defaults(page_size: usize) -> QueryDefaults {
        QueryDefaults {
            page_size,
            price_ceiling_fallback: 1000.0,
            search_debounce: Duration::from_millis(300),
        }
    }

    fn ids(products: &[&Product]) -> Vec<String> {
        products.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_empty_catalog_has_one_page() {
        let engine = CatalogQueryEngine::new(defaults(12));
        assert!(engine.visible_products().is_empty());
        assert_eq!(engine.total_pages(), 1);
        assert_eq!(engine.current_page(), 1);
        assert_eq!(engine.available_categories(), ["all".to_string()]);
    }

    #[test]
    fn test_categories_sorted_with_sentinel() {
        let engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![
                item("1", "Mug", "kitchen", 9.0, None),
                item("2", "Amp", "audio", 90.0, None),
                item("3", "Pan", "kitchen", 30.0, None),
            ],
        );
        assert_eq!(engine.available_categories(), ["all", "audio", "kitchen"]);
    }

    #[test]
    fn test_category_named_like_sentinel_is_selectable() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![
                item("1", "Sampler Box", "All", 25.0, None),
                item("2", "Mug", "kitchen", 9.0, None),
            ],
        );
        assert_eq!(engine.available_categories(), ["all", "All", "kitchen"]);

        engine.set_category("All");
        assert_eq!(ids(&engine.visible_products()), ["1"]);
        engine.set_category("all");
        assert_eq!(engine.total_matches(), 2);
    }

    #[test]
    fn test_price_ceiling_tracks_catalog() {
        let mut engine = CatalogQueryEngine::new(defaults(12));
        assert_eq!(engine.price_ceiling(), 1000.0);

        engine.set_products(vec![item("1", "TV", "video", 2400.0, None)]);
        assert_eq!(engine.price_ceiling(), 2400.0);
        // untouched default range follows the ceiling
        assert_eq!(engine.criteria().price_range.max(), 2400.0);
        assert_eq!(engine.total_matches(), 1);

        engine.set_products(vec![item("2", "Cable", "video", 5.0, None)]);
        assert_eq!(engine.price_ceiling(), 1000.0);
    }

    #[test]
    fn test_custom_price_range_survives_reload() {
        let mut engine = CatalogQueryEngine::new(defaults(12));
        engine.set_price_range(10.0, 50.0);
        engine.set_products(vec![item("1", "TV", "video", 2400.0, None)]);
        assert_eq!(engine.criteria().price_range, PriceRange::new(10.0, 50.0));
        assert_eq!(engine.total_matches(), 0);
    }

    #[test]
    fn test_inverted_price_range_swaps() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![
                item("1", "A", "x", 50.0, None),
                item("2", "B", "x", 300.0, None),
                item("3", "C", "x", 700.0, None),
            ],
        );
        engine.set_price_range(500.0, 100.0);
        let range = engine.criteria().price_range;
        assert!(range.min() <= range.max());
        assert_eq!((range.min(), range.max()), (100.0, 500.0));
        assert_eq!(ids(&engine.visible_products()), ["2"]);
    }

    #[test]
    fn test_non_numeric_rating_keeps_previous() {
        let mut engine = CatalogQueryEngine::new(defaults(12));
        engine.set_min_rating(3.5);
        engine.set_min_rating(f64::NAN);
        assert_eq!(engine.criteria().min_rating, 3.5);
        engine.set_min_rating(9.0);
        assert_eq!(engine.criteria().min_rating, 5.0);
        engine.set_min_rating(-1.0);
        assert_eq!(engine.criteria().min_rating, 0.0);
    }

    #[test]
    fn test_missing_rating_counts_as_zero() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![
                item("1", "A", "x", 1.0, None),
                item("2", "B", "x", 1.0, Some(4.0)),
                item("3", "C", "x", 1.0, Some(2.0)),
            ],
        );
        engine.set_sort_key(SortKey::RatingDesc);
        assert_eq!(ids(&engine.visible_products()), ["2", "3", "1"]);

        engine.set_min_rating(2.0);
        assert_eq!(ids(&engine.visible_products()), ["2", "3"]);
    }

    #[test]
    fn test_sort_ties_keep_collection_order() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![
                item("a", "A", "x", 20.0, None),
                item("b", "B", "x", 10.0, None),
                item("c", "C", "x", 20.0, None),
                item("d", "D", "x", 10.0, None),
            ],
        );
        engine.set_sort_key(SortKey::PriceAsc);
        assert_eq!(ids(&engine.visible_products()), ["b", "d", "a", "c"]);
        engine.set_sort_key(SortKey::PriceDesc);
        assert_eq!(ids(&engine.visible_products()), ["a", "c", "b", "d"]);
        engine.set_sort_key(SortKey::Default);
        assert_eq!(ids(&engine.visible_products()), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_unknown_sort_key_string_ignored() {
        let mut engine = CatalogQueryEngine::new(defaults(12));
        engine.set_sort_key_str("price-desc");
        engine.set_sort_key_str("bogus");
        assert_eq!(engine.criteria().sort_key, SortKey::PriceDesc);
    }

    #[test]
    fn test_set_page_clamps_both_ends() {
        let products = (0..30)
            .map(|i| item(&i.to_string(), "Item", "x", 1.0, None))
            .collect();
        let mut engine = CatalogQueryEngine::with_products(defaults(12), products);
        assert_eq!(engine.total_pages(), 3);

        engine.set_page(0);
        assert_eq!(engine.current_page(), 1);
        engine.set_page(99);
        assert_eq!(engine.current_page(), 3);
        assert_eq!(engine.visible_products().len(), 6);
    }

    #[test]
    fn test_debounced_search_commits_once() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![
                item("1", "Smartphone Pro", "phones", 1.0, None),
                item("2", "Tablet", "tablets", 1.0, None),
            ],
        );
        let start = Instant::now();
        engine.type_search_text("smart", start);
        assert_eq!(engine.raw_search_text(), "smart");
        assert_eq!(engine.criteria().search_text, "");
        assert_eq!(engine.total_matches(), 2);

        assert!(!engine.commit_due_search(start + Duration::from_millis(100)));
        assert_eq!(engine.search_deadline(), Some(start + Duration::from_millis(300)));
        assert!(engine.commit_due_search(start + Duration::from_millis(300)));
        assert_eq!(engine.criteria().search_text, "smart");
        assert_eq!(engine.total_matches(), 1);
        assert!(!engine.commit_due_search(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_search_spans_field_boundaries() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(12),
            vec![Product {
                description: "Wireless flagship".into(),
                ..item("1", "Smartphone Pro", "electronics", 899.0, Some(4.6))
            }],
        );

        engine.set_search_text("pro wireless");
        assert_eq!(engine.total_matches(), 1);
        engine.set_search_text("flagship electronics");
        assert_eq!(engine.total_matches(), 1);
        engine.set_search_text("pro  wireless");
        assert_eq!(engine.total_matches(), 0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut engine = CatalogQueryEngine::with_products(
            defaults(2),
            vec![
                item("1", "A", "x", 10.0, Some(5.0)),
                item("2", "B", "y", 20.0, None),
                item("3", "C", "x", 30.0, None),
            ],
        );
        engine.set_category("x");
        engine.set_search_text("a");
        engine.set_sort_key(SortKey::PriceDesc);
        engine.reset();

        let fresh = CatalogQueryEngine::with_products(defaults(2), engine.products().to_vec());
        assert_eq!(engine.query_state(), fresh.query_state());
    }
}
