//! Fallback extraction from a raw HTML document.
//!
//! Used when no content script is available (CLI, saved pages). Computed
//! styles are not evaluated here, so CSS-hidden elements are included.

use pagechat_core::{Error, Result};

use crate::sanitize::{collapse_whitespace, sanitize};

/// Wide enough that the renderer never wraps lines on its own.
const RENDER_WIDTH: usize = 10_000;

/// Render an HTML document to text, then collapse and sanitize it.
pub fn extract_html(html: &str) -> Result<String> {
    let rendered = html2text::from_read(html.as_bytes(), RENDER_WIDTH)
        .map_err(|e| Error::Extract(format!("Failed to render HTML: {}", e)))?;
    Ok(sanitize(&collapse_whitespace(&rendered)))
}
