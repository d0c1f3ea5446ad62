//! Chat-completion client, settings store and request dispatcher.
//!
//! The dispatcher is the background side of the extension: it takes page
//! content, reads the current settings and makes one call to the configured
//! chat-completion endpoint.

pub mod actions;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod types;

pub use actions::QuickAction;
pub use client::ChatClient;
pub use config::{Endpoint, Settings, SettingsStore};
pub use dispatcher::Dispatcher;
pub use types::*;
