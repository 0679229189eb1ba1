//! Market data adapters: the Yahoo Finance HTTP client, an in-memory gateway for tests
//! and offline runs, and the memoizing wrapper the pipeline reads through.

pub mod cache;
pub mod memory;
pub mod rate_limit;
pub mod yahoo;

pub use cache::CachedGateway;
pub use memory::{CallCounts, StaticGateway};
pub use rate_limit::RateLimiter;
pub use yahoo::YahooFinanceClient;
