// src/services/classify.rs

//! Classification policies deciding whether a book is a shinsho.
//!
//! Exactly one policy is active per deployment; see `ClassifierConfig`.

use std::collections::BTreeSet;

use crate::models::{BookDescriptor, RecordOutcome, SkipReason};

/// Match decision plus the code or label that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub matched: bool,
    pub matched_on: Option<String>,
}

impl Classification {
    pub fn hit(on: impl Into<String>) -> Self {
        Self {
            matched: true,
            matched_on: Some(on.into()),
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }
}

/// A rule deciding whether a descriptor belongs to the target set.
pub trait ClassificationPolicy: Send + Sync {
    /// Short policy name for logs.
    fn name(&self) -> &'static str;

    fn classify(&self, book: &BookDescriptor) -> Classification;

    /// Whether a match without a publication date is dropped.
    fn requires_date(&self) -> bool {
        false
    }
}

/// Classify `book` and apply the policy's date requirement.
pub fn evaluate(policy: &dyn ClassificationPolicy, book: BookDescriptor) -> RecordOutcome {
    let result = policy.classify(&book);
    if !result.matched {
        return RecordOutcome::Skipped(SkipReason::NotMatched(book.isbn));
    }
    if policy.requires_date() && book.published.is_none() {
        return RecordOutcome::Skipped(SkipReason::NoPublicationDate(book.isbn));
    }

    log::debug!(
        "{} ('{}'): matched by {} on {}",
        book.isbn,
        book.title,
        policy.name(),
        result.matched_on.as_deref().unwrap_or("-")
    );
    RecordOutcome::Accepted(book)
}

/// Subject scheme + code allow-list (the C-code rule).
#[derive(Debug, Clone)]
pub struct CodeMatchPolicy {
    scheme: String,
    codes: BTreeSet<String>,
}

impl CodeMatchPolicy {
    pub fn new(scheme: impl Into<String>, codes: BTreeSet<String>) -> Self {
        Self {
            scheme: scheme.into(),
            codes,
        }
    }
}

impl ClassificationPolicy for CodeMatchPolicy {
    fn name(&self) -> &'static str {
        "code_match"
    }

    fn classify(&self, book: &BookDescriptor) -> Classification {
        book.subjects
            .iter()
            .find(|s| s.scheme == self.scheme && self.codes.contains(&s.code))
            .map(|s| Classification::hit(&s.code))
            .unwrap_or_else(Classification::miss)
    }

    fn requires_date(&self) -> bool {
        true
    }
}

/// Marker substring in the collection title or the summary series text.
#[derive(Debug, Clone)]
pub struct LabelPolicy {
    marker: String,
}

impl LabelPolicy {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl ClassificationPolicy for LabelPolicy {
    fn name(&self) -> &'static str {
        "label"
    }

    fn classify(&self, book: &BookDescriptor) -> Classification {
        [&book.collection, &book.series]
            .into_iter()
            .flatten()
            .find(|label| label.contains(&self.marker))
            .map(Classification::hit)
            .unwrap_or_else(Classification::miss)
    }
}

/// One character of the Japanese book code at a fixed position.
#[derive(Debug, Clone)]
pub struct BookCodePolicy {
    scheme: String,
    position: usize,
    digit: char,
}

impl BookCodePolicy {
    pub fn new(scheme: impl Into<String>, position: usize, digit: char) -> Self {
        Self {
            scheme: scheme.into(),
            position,
            digit,
        }
    }
}

impl ClassificationPolicy for BookCodePolicy {
    fn name(&self) -> &'static str {
        "book_code"
    }

    fn classify(&self, book: &BookDescriptor) -> Classification {
        book.subjects
            .iter()
            .find(|s| s.scheme == self.scheme && s.code.chars().nth(self.position) == Some(self.digit))
            .map(|s| Classification::hit(&s.code))
            .unwrap_or_else(Classification::miss)
    }
}
