use crate::model::{FetchError, Product};

/// Read-only access to the storefront's product catalog.
#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Product>, FetchError>;
    async fn fetch_by_id(&self, id: &str) -> Result<Product, FetchError>;
}
