pub mod aggregation;
pub mod history;
pub mod models;
pub mod region;
pub mod session;
pub mod summary;
pub mod valuation;

pub use aggregation::{group_sum, weighted_average};
pub use history::portfolio_vs_benchmark;
pub use models::*;
pub use region::{classify_exchange, region_diversification};
pub use session::{Session, SAMPLE_PORTFOLIO};
pub use valuation::value_holdings;
