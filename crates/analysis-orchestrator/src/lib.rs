//! Portfolio pipeline entry point.
//!
//! Wires the market data memo layer, valuation, per-holding metrics, aggregation and the
//! risk classifier into the operations a front end calls: the overview run, the price
//! change table, performance since a date and the export archive.

pub mod config;
pub mod export;
pub mod performance;
pub mod pipeline;
pub mod prices;

#[cfg(test)]
mod tests;

pub use config::PipelineConfig;
pub use performance::{PerformanceReport, ReturnsRow, DEFAULT_BENCHMARK, RETURN_LOOKBACKS};
pub use pipeline::{PipelineReport, PortfolioPipeline};
pub use prices::{PriceChangeRow, PriceChanges, ReturnPeriod};
