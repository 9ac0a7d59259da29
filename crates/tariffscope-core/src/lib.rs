//! TariffScope Core — shared error type and configuration.

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{Error, Result};
