pub mod aggregator;
pub mod anomaly;
pub mod config;
pub mod engine;
pub mod grouping;
