//! Feed rendering: ordering, truncation and mapping onto feed entries.

use std::cmp::Reverse;

use chrono::{DateTime, FixedOffset};

use crate::models::{BookDescriptor, Contributor, FeedChannel, FeedConfig, FeedEntry, FeedSource};
use crate::utils::date::{format_japanese, jst};
use crate::utils::detail_link;

/// ONIX contributor role codes with a display label.
const ROLE_LABELS: &[(&str, &str)] = &[
    ("A01", "著"),
    ("A02", "編"),
    ("A03", "監修"),
    ("B01", "訳"),
    ("B06", "翻訳"),
];

const AUTHOR_SEPARATOR: &str = "、";

/// Maps descriptors onto the feed sink's entry model.
pub struct FeedRenderer<'a> {
    config: &'a FeedConfig,
}

impl<'a> FeedRenderer<'a> {
    pub fn new(config: &'a FeedConfig) -> Self {
        Self { config }
    }

    /// Order, cap and map `books`.
    ///
    /// History keeps insertion order. A single run's list is ordered by
    /// publication date, newest first, keeping fetch order on ties.
    pub fn render(&self, books: &[BookDescriptor], source: FeedSource) -> Vec<FeedEntry> {
        let mut ordered: Vec<&BookDescriptor> = books.iter().collect();
        if source == FeedSource::Run {
            ordered.sort_by_key(|book| Reverse(book.published));
        }

        ordered
            .into_iter()
            .take(self.config.max_items)
            .map(|book| self.entry(book))
            .collect()
    }

    /// Map one descriptor to a feed entry.
    pub fn entry(&self, book: &BookDescriptor) -> FeedEntry {
        let mut categories = vec![self.config.category.clone()];
        if let Some(collection) = &book.collection {
            if collection != &self.config.category {
                categories.push(collection.clone());
            }
        }

        FeedEntry {
            id: book.isbn.clone(),
            title: book.full_title(),
            link: detail_link(&self.config.link_base, &book.isbn),
            author: format_authors(&book.contributors),
            description: describe(book),
            published: entry_timestamp(book),
            categories,
        }
    }

    /// Channel metadata; `pub_date` is the newest entry, else the build time.
    pub fn channel(&self, entries: &[FeedEntry], built: DateTime<FixedOffset>) -> FeedChannel {
        let pub_date = entries
            .iter()
            .map(|e| e.published)
            .max()
            .unwrap_or(built);

        FeedChannel {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            link: self.config.link.clone(),
            language: self.config.language.clone(),
            copyright: self.config.copyright.clone(),
            generator: self.config.generator.clone(),
            managing_editor: self.config.managing_editor.clone(),
            last_build: built,
            pub_date,
        }
    }
}

/// Publication date, falling back to the time the record was fetched.
fn entry_timestamp(book: &BookDescriptor) -> DateTime<FixedOffset> {
    book.published
        .unwrap_or_else(|| book.fetched_at.with_timezone(&jst()))
}

fn role_label(code: &str) -> Option<&'static str> {
    ROLE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

/// Join contributor names, annotating mapped roles as `name（label）`.
pub fn format_authors(contributors: &[Contributor]) -> Option<String> {
    if contributors.is_empty() {
        return None;
    }

    let names: Vec<String> = contributors
        .iter()
        .map(|c| match c.role.as_deref().and_then(role_label) {
            Some(label) => format!("{}（{}）", c.name, label),
            None => c.name.clone(),
        })
        .collect();
    Some(names.join(AUTHOR_SEPARATOR))
}

/// Multi-part description. Absent fields produce no section at all.
pub fn describe(book: &BookDescriptor) -> String {
    let mut parts = vec![format!("【書名】{}", book.full_title())];

    if let Some(label) = book.label() {
        parts.push(format!("【シリーズ】{label}"));
    }
    if let Some(authors) = format_authors(&book.contributors) {
        parts.push(format!("【著者】{authors}"));
    }
    if let Some(bio) = book.contributors.first().and_then(|c| c.bio.as_deref()) {
        parts.push(format!("【著者略歴】{}", bio.trim()));
    }

    match (book.imprint.as_deref(), book.publisher.as_deref()) {
        (Some(imprint), Some(publisher)) if imprint != publisher => {
            parts.push(format!("【出版社】{imprint}（発売: {publisher}）"));
        }
        (Some(name), _) | (None, Some(name)) => parts.push(format!("【出版社】{name}")),
        (None, None) => {}
    }

    if let Some(published) = &book.published {
        parts.push(format!("【出版日】{}", format_japanese(published)));
    }
    if let Some(description) = &book.description {
        parts.push(format!("【内容】{description}"));
    }
    parts.push(format!("【ISBN】{}", book.isbn));

    parts.join("\n")
}
