// src/services/extract.rs

//! Metadata extraction.
//!
//! Projects one raw openBD record (a `summary` block plus an ONIX tree) onto a
//! flat [`BookDescriptor`]. Every nested lookup degrades to "absent" instead
//! of failing; only a missing identifier or title rejects the record.

use chrono::Utc;
use serde_json::Value;

use crate::models::{BookDescriptor, Contributor, SkipReason, Subject};
use crate::utils::date::parse_pubdate;
use crate::utils::value::{as_list, as_text, path};

const TEXT_TYPE_DESCRIPTION: &str = "03";
const TEXT_TYPE_TOC: &str = "02";

/// Extract a descriptor from one raw record.
pub fn extract(raw: Option<&Value>) -> Result<BookDescriptor, SkipReason> {
    let raw = raw.filter(|v| !v.is_null()).ok_or(SkipReason::NullRecord)?;

    let summary = raw.get("summary").filter(|v| v.is_object());
    let onix = raw.get("onix").filter(|v| v.is_object());
    if summary.is_none() && onix.is_none() {
        return Err(SkipReason::MissingMetadata);
    }

    let from_summary = |key: &str| summary.and_then(|s| as_text(s.get(key)));
    let from_onix = |keys: &[&str]| onix.and_then(|o| as_text(path(o, keys)));

    let isbn = from_summary("isbn")
        .or_else(|| from_onix(&["RecordReference"]))
        .ok_or(SkipReason::MissingIdentifier)?;

    let title = from_onix(&["DescriptiveDetail", "TitleDetail", "TitleElement", "TitleText"])
        .or_else(|| from_summary("title"))
        .ok_or_else(|| SkipReason::MissingTitle(isbn.clone()))?;
    let subtitle = from_onix(&["DescriptiveDetail", "TitleDetail", "TitleElement", "Subtitle"]);

    let collection = from_onix(&[
        "DescriptiveDetail",
        "Collection",
        "TitleDetail",
        "TitleElement",
        "TitleText",
    ]);

    let descriptive = onix.and_then(|o| o.get("DescriptiveDetail"));
    let mut contributors = extract_contributors(descriptive.and_then(|d| d.get("Contributor")));
    if contributors.is_empty() {
        if let Some(author) = from_summary("author") {
            contributors.push(Contributor {
                name: author,
                role: None,
                bio: None,
            });
        }
    }

    let pubdate = from_summary("pubdate")
        .or_else(|| from_onix(&["PublishingDetail", "PublishingDate", "Date"]));

    Ok(BookDescriptor {
        isbn,
        title,
        subtitle,
        collection,
        series: from_summary("series"),
        contributors,
        publisher: from_onix(&["PublishingDetail", "Publisher", "PublisherName"])
            .or_else(|| from_summary("publisher")),
        imprint: from_onix(&["PublishingDetail", "Imprint", "ImprintName"]),
        subjects: extract_subjects(descriptive.and_then(|d| d.get("Subject"))),
        published: parse_pubdate(pubdate.as_deref()),
        description: extract_description(
            onix.and_then(|o| path(o, &["CollateralDetail", "TextContent"])),
        ),
        fetched_at: Utc::now(),
    })
}

fn extract_contributors(value: Option<&Value>) -> Vec<Contributor> {
    as_list(value)
        .into_iter()
        .filter_map(|c| {
            let name = as_text(c.get("PersonName"))?;
            Some(Contributor {
                name,
                role: as_text(c.get("ContributorRole")),
                bio: as_text(c.get("BiographicalNote")),
            })
        })
        .collect()
}

fn extract_subjects(value: Option<&Value>) -> Vec<Subject> {
    as_list(value)
        .into_iter()
        .filter_map(|s| {
            let scheme = as_text(s.get("SubjectSchemeIdentifier"))?;
            let code = as_text(s.get("SubjectCode"))?;
            Some(Subject { scheme, code })
        })
        .collect()
}

/// Content summary (type 03) wins; table of contents (type 02) is the fallback.
fn extract_description(value: Option<&Value>) -> Option<String> {
    let mut toc = None;
    for content in as_list(value) {
        let kind = as_text(content.get("TextType"));
        match kind.as_deref() {
            Some(TEXT_TYPE_DESCRIPTION) => {
                if let Some(text) = as_text(content.get("Text")) {
                    return Some(text);
                }
            }
            Some(TEXT_TYPE_TOC) if toc.is_none() => toc = as_text(content.get("Text")),
            _ => {}
        }
    }
    toc
}
