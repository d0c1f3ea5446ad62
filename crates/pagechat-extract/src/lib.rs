//! Page content extraction.
//!
//! Turns what the content script saw on a page (selection plus the
//! computed visibility and direct text nodes of every element) into one
//! sanitized string ready to be sent to a chat endpoint.

pub mod html;
pub mod sanitize;
pub mod snapshot;

pub use html::extract_html;
pub use sanitize::{collapse_whitespace, sanitize};
pub use snapshot::{ElementSnapshot, PageSnapshot};

use tracing::debug;

/// Extract the text for a page snapshot.
///
/// A non-empty selection wins over the page body. The result may be empty;
/// callers decide whether that is an error.
pub fn extract_content(snapshot: &PageSnapshot) -> String {
    let raw = match snapshot.selected_text() {
        Some(selection) => {
            debug!("Using selection ({} chars)", selection.len());
            selection.to_string()
        }
        None => snapshot.visible_text(),
    };
    sanitize(&raw)
}
