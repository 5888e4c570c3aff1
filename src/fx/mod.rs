pub mod conversion;
pub mod provider;
