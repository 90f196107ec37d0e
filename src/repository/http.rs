use crate::config::AppConfig;
use crate::model::{FetchError, Product};
use crate::repository::traits::ProductRepository;
use crate::utils::join_url;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// The product listing endpoint answers either with a bare array or with
/// an envelope object, depending on the backend version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductListBody {
    Bare(Vec<Product>),
    Envelope { products: Vec<Product> },
}

impl ProductListBody {
    fn into_products(self) -> Vec<Product> {
        match self {
            Self::Bare(products) | Self::Envelope { products } => products,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProductBody {
    Bare(Product),
    Envelope { product: Product },
}

pub struct HttpProductRepository {
    pub client: Client,
    pub base_url: String,
}

impl HttpProductRepository {
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.request_user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn products_url(&self) -> String {
        join_url(&self.base_url, "products")
    }

    fn product_url(&self, id: &str) -> String {
        join_url(&self.base_url, &format!("products/{}", id))
    }

    async fn get_text(&self, url: &str, id: Option<&str>) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(FetchError::NotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Decodes a listing response body.
pub fn decode_product_list(body: &str) -> Result<Vec<Product>, FetchError> {
    let parsed: ProductListBody = serde_json::from_str(body)?;
    Ok(parsed.into_products())
}

/// Decodes a single-product response body.
pub fn decode_product(body: &str) -> Result<Product, FetchError> {
    let parsed: ProductBody = serde_json::from_str(body)?;
    Ok(match parsed {
        ProductBody::Bare(product) | ProductBody::Envelope { product } => product,
    })
}

#[async_trait::async_trait]
impl ProductRepository for HttpProductRepository {
    async fn fetch_all(&self) -> Result<Vec<Product>, FetchError> {
        let body = self.get_text(&self.products_url(), None).await?;
        decode_product_list(&body)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Product, FetchError> {
        let body = self.get_text(&self.product_url(id), Some(id)).await?;
        decode_product(&body)
    }
}
