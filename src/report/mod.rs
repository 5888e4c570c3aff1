//! Writing settlement results for downstream consumers.

pub mod csv_writer;
