// Repository module: the backend contract and its HTTP implementation.

pub mod http;
pub mod traits;

pub use http::HttpProductRepository;
pub use traits::ProductRepository;
