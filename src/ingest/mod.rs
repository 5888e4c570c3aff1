//! Producing validated transactions from files.

pub mod csv;
pub mod error;
pub mod validator;
