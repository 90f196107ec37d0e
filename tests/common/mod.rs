#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use storefront_catalog::{FetchError, Product, ProductRepository};

pub fn product(id: &str, name: &str, category: &str, price: f64, rating: Option<f64>) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} from the {} range", name, category),
        category: category.to_string(),
        price_before_discount: price * 1.2,
        price_after_discount: price,
        rating,
        stock_remaining: 8,
    }
}

/// A deterministic catalog of `n` products over three categories.
pub fn catalog(n: usize) -> Vec<Product> {
    let categories = ["audio", "kitchen", "phones"];
    (0..n)
        .map(|i| {
            let rating = if i % 4 == 0 { None } else { Some((i % 5) as f64) };
            product(
                &format!("p{}", i),
                &format!("Item {}", i),
                categories[i % categories.len()],
                ((i * 37) % 200) as f64 + 5.0,
                rating,
            )
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// In-memory repository whose responses can be delayed or made to fail.
pub struct MockRepository {
    products: Vec<Product>,
    delay: Mutex<Duration>,
    behavior: Mutex<Behavior>,
    pub calls: AtomicUsize,
}

impl MockRepository {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            delay: Mutex::new(Duration::ZERO),
            behavior: Mutex::new(Behavior::Succeed),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        let behavior = *self.behavior.lock().unwrap();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(FetchError::Network("connection refused".into())),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

#[async_trait::async_trait]
impl ProductRepository for MockRepository {
    async fn fetch_all(&self) -> Result<Vec<Product>, FetchError> {
        self.respond().await?;
        Ok(self.products.clone())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Product, FetchError> {
        self.respond().await?;
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}
