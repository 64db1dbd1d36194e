pub mod cache;
pub mod fx;
pub mod source;

pub use cache::CachedPriceSource;
pub use source::{CompanyProfile, PriceHistory, PriceSource};
