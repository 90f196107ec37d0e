// Core structs: Product, FetchError
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A catalog entry as served by the storefront backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price_before_discount: f64,
    #[serde(default)]
    pub price_after_discount: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub stock_remaining: u32,
}

impl Product {
    /// Rating used by filters and sorting; a missing rating counts as 0.
    pub fn effective_rating(&self) -> f64 {
        self.rating.filter(|r| r.is_finite()).unwrap_or(0.0)
    }

    /// Rating as shown to shoppers.
    pub fn rating_label(&self) -> String {
        match self.rating.filter(|r| r.is_finite()) {
            Some(r) => format!("{:.1}", r),
            None => "N/A".to_string(),
        }
    }

    pub fn is_low_stock(&self, threshold: u32) -> bool {
        self.stock_remaining > 0 && self.stock_remaining <= threshold
    }

    pub fn is_sold_out(&self) -> bool {
        self.stock_remaining == 0
    }

    /// Discount relative to the list price, rounded to a whole percent.
    pub fn discount_percent(&self) -> u32 {
        let before = self.price_before_discount;
        let after = self.price_after_discount;
        if !before.is_finite() || !after.is_finite() || before <= 0.0 || after >= before {
            return 0;
        }
        (((before - after) / before) * 100.0).round() as u32
    }
}

/// Failures reported by a [`ProductRepository`](crate::repository::ProductRepository).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("backend responded with HTTP {status}")]
    Http { status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("product not found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// Whether this failure means the backend should be treated as down.
    pub fn signals_outage(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}
