//! Section identifiers.
//!
//! Ids follow the docutils convention: lowercase ASCII letters and digits,
//! runs of anything else collapse to a single hyphen, and an id always starts
//! with a letter. They end up in `\hypertarget{..}{}` and `\hyperlink{..}{..}`.
//! Explicit `{#id}` suffixes may also use `_` and uppercase letters.

use std::collections::HashMap;

/// Extracts a `{#custom-id}` suffix from heading text.
///
/// ```
/// use r2b_core::slug::extract_custom_id;
///
/// let (text, id) = extract_custom_id("Results {#results-2024}");
/// assert_eq!(text, "Results");
/// assert_eq!(id, Some("results-2024"));
///
/// let (text, id) = extract_custom_id("Plain heading");
/// assert_eq!(text, "Plain heading");
/// assert_eq!(id, None);
/// ```
pub fn extract_custom_id(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim_end();
    let Some(inner) = trimmed.strip_suffix('}') else {
        return (text, None);
    };
    let Some(open) = inner.rfind("{#") else {
        return (text, None);
    };
    let id = &inner[open + 2..];
    if id.is_empty()
        || !id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return (text, None);
    }
    (inner[..open].trim_end(), Some(id))
}

/// Converts text into a docutils-style identifier. May return an empty string.
pub fn make_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            // Leading digits are dropped: ids start with a letter.
            if id.is_empty() && ch.is_ascii_digit() {
                continue;
            }
            if pending_hyphen && !id.is_empty() {
                id.push('-');
            }
            pending_hyphen = false;
            id.push(ch.to_ascii_lowercase());
        } else if ch.is_ascii() || ch.is_whitespace() {
            pending_hyphen = true;
        }
    }
    id
}

/// Hands out unique ids for one document.
#[derive(Debug, Default)]
pub struct Slugger {
    /// Every id handed out or reserved, with the last suffix tried for it.
    counts: HashMap<String, usize>,
}

impl Slugger {
    /// Creates a new slugger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the next unique id for the given heading text.
    ///
    /// Text without usable characters yields `section`; repeats get `-1`,
    /// `-2`, ... appended.
    pub fn next_slug(&mut self, text: &str) -> String {
        let mut base = make_id(text);
        if base.is_empty() {
            base.push_str("section");
        }
        let mut suffix = self.counts.get(&base).copied().unwrap_or(0);
        let mut candidate = base.clone();
        while self.counts.contains_key(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }
        self.counts.insert(base, suffix);
        self.counts.entry(candidate.clone()).or_insert(0);
        candidate
    }

    /// Reserves an id so generated ids never collide with it.
    pub fn reserve(&mut self, id: &str) {
        self.counts.entry(id.to_string()).or_insert(0);
    }
}
