//! Book descriptor data structures.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Unique catalog key (normalized ISBN).
pub type Identifier = String;

/// A `(scheme, code)` subject classification entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subject {
    pub scheme: String,
    pub code: String,
}

impl Subject {
    pub fn new(scheme: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            code: code.into(),
        }
    }
}

/// A person credited on a book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,

    /// ONIX contributor role code (e.g. `A01`)
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,
}

/// Normalized, flat projection of one catalog record.
///
/// Only the extractor constructs these from raw records, and only when both
/// the identifier and the title are present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookDescriptor {
    pub isbn: Identifier,
    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    /// Collection (label) title from the descriptive detail
    #[serde(default)]
    pub collection: Option<String>,

    /// Series text from the summary block
    #[serde(default)]
    pub series: Option<String>,

    #[serde(default)]
    pub contributors: Vec<Contributor>,

    #[serde(default)]
    pub publisher: Option<String>,

    #[serde(default)]
    pub imprint: Option<String>,

    #[serde(default)]
    pub subjects: Vec<Subject>,

    /// Publication date at midnight JST
    #[serde(default)]
    pub published: Option<DateTime<FixedOffset>>,

    #[serde(default)]
    pub description: Option<String>,

    pub fetched_at: DateTime<Utc>,
}

impl BookDescriptor {
    /// Minimal descriptor, mostly useful for tests and fixtures.
    pub fn new(isbn: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            subtitle: None,
            collection: None,
            series: None,
            contributors: Vec::new(),
            publisher: None,
            imprint: None,
            subjects: Vec::new(),
            published: None,
            description: None,
            fetched_at: Utc::now(),
        }
    }

    /// Title with subtitle appended when present.
    pub fn full_title(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{} - {}", self.title, subtitle),
            None => self.title.clone(),
        }
    }

    /// Collection label, falling back to the summary series text.
    pub fn label(&self) -> Option<&str> {
        self.collection.as_deref().or(self.series.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_title() {
        let mut book = BookDescriptor::new("9784000000001", "本題");
        assert_eq!(book.full_title(), "本題");

        book.subtitle = Some("副題".into());
        assert_eq!(book.full_title(), "本題 - 副題");
    }

    #[test]
    fn test_label_prefers_collection() {
        let mut book = BookDescriptor::new("9784000000001", "本題");
        assert_eq!(book.label(), None);

        book.series = Some("なんとか叢書".into());
        assert_eq!(book.label(), Some("なんとか叢書"));

        book.collection = Some("岩波新書".into());
        assert_eq!(book.label(), Some("岩波新書"));
    }

    #[test]
    fn test_history_entry_without_optionals_deserializes() {
        let json = r#"{"isbn":"9784000000001","title":"本題","fetched_at":"2024-01-15T00:00:00Z"}"#;
        let book: BookDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(book.isbn, "9784000000001");
        assert!(book.contributors.is_empty());
        assert!(book.published.is_none());
    }
}
