pub mod indicators;
pub mod metrics;
pub mod technicals;


pub use indicators::*;
pub use metrics::*;
pub use technicals::*;
