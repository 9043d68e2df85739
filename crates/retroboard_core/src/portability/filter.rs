//! Chrome rejection for recognized text fragments.
//!
//! Matching is case-sensitive substring search against the denylist as
//! authored. A note that merely contains a chrome label is discarded too;
//! false discards are preferred over importing UI text as notes.

use serde::{Deserialize, Serialize};

/// Zone titles, application title and action-button captions.
pub const DEFAULT_CHROME_LABELS: &[&str] = &[
    "KEEP",
    "STOP",
    "START",
    "LESS",
    "MORE",
    "Team Retrospective Board",
    "Help",
    "Import",
    "Export",
];

/// Outcome of evaluating one fragment's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict<'a> {
    /// Genuine note content, already trimmed.
    Keep(&'a str),
    /// Nothing left after trimming.
    Blank,
    /// Contains the given chrome label.
    Chrome(&'a str),
}

/// Denylist-based fragment filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChromeFilter {
    labels: Vec<String>,
}

impl ChromeFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn evaluate<'a>(&'a self, text: &'a str) -> FilterVerdict<'a> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return FilterVerdict::Blank;
        }
        match self
            .labels
            .iter()
            .find(|label| text.contains(label.as_str()))
        {
            Some(label) => FilterVerdict::Chrome(label.as_str()),
            None => FilterVerdict::Keep(trimmed),
        }
    }

    pub fn keeps(&self, text: &str) -> bool {
        matches!(self.evaluate(text), FilterVerdict::Keep(_))
    }
}

impl Default for ChromeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CHROME_LABELS.iter().copied())
    }
}
