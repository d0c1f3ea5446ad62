//! PageChat Core: shared error type and process configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, DispatchPolicy, OverlapPolicy, PageChatConfig};
pub use error::{Error, Result};
