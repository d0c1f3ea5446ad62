//! Text cleanup applied to everything leaving a page.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,!?-]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip script blocks and tags, blank out punctuation outside `.,!?-`, trim.
///
/// Word characters are Unicode-aware, so accented and non-Latin text survives.
pub fn sanitize(text: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(text, "");
    let without_tags = TAG_RE.replace_all(&without_scripts, "");
    DISALLOWED_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Collapse every run of whitespace (newlines included) into one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}
