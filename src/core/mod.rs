pub mod currency;
pub mod settlement;
pub mod supplier;
pub mod transaction;
