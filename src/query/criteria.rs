use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::finite_or;

pub const ALL_CATEGORIES: &str = "all";

pub const MAX_RATING: f64 = 5.0;

/// Category facet: either the "all" sentinel or one exact category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Empty input and the exact sentinel `"all"` both mean "all". The
    /// comparison is case-sensitive, so a category named "All" stays selectable.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Only(category) => category,
        }
    }
}

/// Inclusive price bounds. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    /// Builds a range, swapping crossed bounds and clamping negatives to 0.
    pub fn new(min: f64, max: f64) -> Self {
        Self::sanitized(min, max, Self { min: 0.0, max: 0.0 })
    }

    /// Like [`PriceRange::new`], but a non-finite bound keeps the value it
    /// has in `previous`.
    pub fn sanitized(min: f64, max: f64, previous: PriceRange) -> Self {
        let min = finite_or(min, previous.min).max(0.0);
        let max = finite_or(max, previous.max).max(0.0);
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    RatingDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::RatingDesc => "rating-desc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Default => "Featured",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::RatingDesc => "Customer Rating",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key: {0}")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" | "" => Ok(Self::Default),
            "price-asc" | "price_asc" => Ok(Self::PriceAsc),
            "price-desc" | "price_desc" => Ok(Self::PriceDesc),
            "rating-desc" | "rating_desc" | "rating" => Ok(Self::RatingDesc),
            other => Err(ParseSortKeyError(other.to_string())),
        }
    }
}

/// Everything the shopper has chosen on the listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub search_text: String,
    pub category: CategoryFilter,
    pub price_range: PriceRange,
    pub min_rating: f64,
    pub sort_key: SortKey,
    pub page: usize,
    pub page_size: usize,
}

impl FilterCriteria {
    pub fn new(page_size: usize, price_ceiling: f64) -> Self {
        Self {
            search_text: String::new(),
            category: CategoryFilter::All,
            price_range: PriceRange::new(0.0, price_ceiling),
            min_rating: 0.0,
            sort_key: SortKey::Default,
            page: 1,
            page_size: page_size.max(1),
        }
    }
}
