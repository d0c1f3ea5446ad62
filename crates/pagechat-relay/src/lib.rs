//! Page relay: what the content scripts reported, and panel sessions that
//! watch it.
//!
//! Content scripts push page snapshots per tab; the panel asks for the
//! extracted content of the active tab and keeps polling while it is open.

pub mod relay;
pub mod session;
pub mod types;

pub use relay::{ContentSource, PageRelay};
pub use session::PanelSession;
pub use types::*;
