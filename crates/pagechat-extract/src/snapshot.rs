//! Page snapshot reported by the content script.

use serde::{Deserialize, Serialize};

use crate::sanitize::collapse_whitespace;

/// One element of the document, flattened in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default)]
    pub tag: String,
    /// Computed `display` value.
    #[serde(default)]
    pub display: Option<String>,
    /// Computed `visibility` value.
    #[serde(default)]
    pub visibility: Option<String>,
    /// The element's `hidden` attribute.
    #[serde(default)]
    pub hidden: bool,
    /// Direct text-node children only, never text of nested elements.
    #[serde(default, rename = "textNodes")]
    pub text_nodes: Vec<String>,
}

impl ElementSnapshot {
    pub fn is_visible(&self) -> bool {
        !self.hidden
            && !style_is(self.display.as_deref(), "none")
            && !style_is(self.visibility.as_deref(), "hidden")
    }

    /// Trimmed direct text joined with single spaces.
    fn own_text(&self) -> String {
        self.text_nodes
            .iter()
            .map(|node| node.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn style_is(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
}

/// Everything the extractor needs to know about a page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Current text selection, if any.
    #[serde(default)]
    pub selection: Option<String>,
    /// Every element in the document body.
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
}

impl PageSnapshot {
    /// Trimmed selection, or `None` when nothing (or only whitespace) is selected.
    pub fn selected_text(&self) -> Option<&str> {
        self.selection
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Visible direct text of all elements, whitespace collapsed to single spaces.
    pub fn visible_text(&self) -> String {
        let joined = self
            .elements
            .iter()
            .filter(|e| e.is_visible())
            .map(ElementSnapshot::own_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        collapse_whitespace(&joined)
    }
}
