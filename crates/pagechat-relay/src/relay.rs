//! Page relay: latest snapshot per tab plus the active tab.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, info};

use pagechat_core::{Error, Result};
use pagechat_extract::extract_content;

use crate::types::{PageReport, TabSummary, TrackedPage};

pub const INACCESSIBLE_PAGE: &str = "Cannot access this page's content.";

/// URL schemes the content script can never run on.
const RESTRICTED_SCHEMES: &[&str] = &["chrome://", "chrome-extension://", "about:"];

/// Anything that can produce the current page content on demand.
pub trait ContentSource: Send + Sync {
    fn fetch_content(&self) -> Result<String>;
}

/// Central page relay.
#[derive(Default)]
pub struct PageRelay {
    pages: RwLock<HashMap<String, TrackedPage>>,
    active_tab: RwLock<Option<String>>,
}

impl PageRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report from the content script. The reporting tab becomes active
    /// when no tab is active yet.
    ///
    /// A tab that navigated to a restricted page loses its previous snapshot but
    /// stays active, so it reads as having no content.
    pub fn report(&self, report: PageReport) -> Result<()> {
        if is_restricted(&report.url) {
            if self.pages.write().remove(&report.tab_id).is_some() {
                debug!("Tab {} moved to a restricted page", report.tab_id);
            }
            return Err(Error::Validation(INACCESSIBLE_PAGE.into()));
        }

        debug!(
            "Page report from tab {}: {} elements",
            report.tab_id,
            report.snapshot.elements.len()
        );

        let tab_id = report.tab_id.clone();
        self.pages.write().insert(
            tab_id.clone(),
            TrackedPage {
                tab_id: report.tab_id,
                url: report.url,
                title: report.title,
                snapshot: report.snapshot,
                reported_at: chrono::Utc::now().to_rfc3339(),
            },
        );

        let mut active = self.active_tab.write();
        if active.is_none() {
            *active = Some(tab_id);
        }
        Ok(())
    }

    /// Mark a known tab as active.
    pub fn set_active(&self, tab_id: &str) -> Result<()> {
        if !self.pages.read().contains_key(tab_id) {
            return Err(Error::NotFound(format!("tab {}", tab_id)));
        }
        *self.active_tab.write() = Some(tab_id.to_string());
        info!("Active tab: {}", tab_id);
        Ok(())
    }

    pub fn active_tab(&self) -> Option<String> {
        self.active_tab.read().clone()
    }

    /// Forget a closed tab.
    pub fn remove(&self, tab_id: &str) -> bool {
        let removed = self.pages.write().remove(tab_id).is_some();
        if removed {
            let mut active = self.active_tab.write();
            if active.as_deref() == Some(tab_id) {
                *active = None;
            }
        }
        removed
    }

    /// Extracted content for a tab, or the active tab when none is given.
    pub fn content(&self, tab_id: Option<&str>) -> Result<String> {
        let tab_id = match tab_id {
            Some(id) => id.to_string(),
            None => self
                .active_tab()
                .ok_or_else(|| Error::NotFound("no active tab".into()))?,
        };
        let pages = self.pages.read();
        let page = pages
            .get(&tab_id)
            .ok_or_else(|| Error::NotFound(format!("tab {}", tab_id)))?;
        Ok(extract_content(&page.snapshot))
    }

    /// All tracked tabs, most recently reported first.
    pub fn tabs(&self) -> Vec<TabSummary> {
        let active = self.active_tab();
        let pages = self.pages.read();
        let mut tabs: Vec<TabSummary> = pages
            .values()
            .map(|p| TabSummary {
                tab_id: p.tab_id.clone(),
                url: p.url.clone(),
                title: p.title.clone(),
                has_selection: p.snapshot.selected_text().is_some(),
                active: active.as_deref() == Some(p.tab_id.as_str()),
                reported_at: p.reported_at.clone(),
            })
            .collect();
        tabs.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        tabs
    }
}

impl ContentSource for PageRelay {
    fn fetch_content(&self) -> Result<String> {
        self.content(None)
    }
}

fn is_restricted(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    RESTRICTED_SCHEMES.iter().any(|s| lower.starts_with(s))
}
