//! Shared support types for the strand executor: configuration, errors,
//! environment helpers, and leveled logging.

pub mod config;
pub mod env;
pub mod error;
pub mod kprint;

pub use config::{ExecutorConfig, ExecutorParams};
pub use error::ExecutorError;
