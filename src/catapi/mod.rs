pub mod api_types;
pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use cache::CatQueryKey;
pub use client::CatApiClient;
pub use types::{Breed, CatImage};
