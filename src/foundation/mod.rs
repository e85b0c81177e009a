pub mod error;
pub mod signal;
