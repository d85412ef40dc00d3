// src/utils/rss.rs

//! RSS 2.0 serialization.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{AppError, Result};
use crate::models::{FeedChannel, FeedEntry};

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
const RSS_DOCS: &str = "https://www.rssboard.org/rss-specification";

/// Serialize a channel and its ordered entries to an RSS 2.0 document.
pub fn to_rss(channel: &FeedChannel, entries: &[FeedEntry]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(AppError::feed)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("rss").with_attributes([("version", "2.0"), ("xmlns:dc", DC_NAMESPACE)]),
        ))
        .map_err(AppError::feed)?;
    start(&mut writer, "channel")?;

    text_element(&mut writer, "title", &channel.title)?;
    text_element(&mut writer, "link", &channel.link)?;
    text_element(&mut writer, "description", &channel.description)?;
    text_element(&mut writer, "language", &channel.language)?;
    text_element(&mut writer, "copyright", &channel.copyright)?;
    if let Some(editor) = &channel.managing_editor {
        text_element(&mut writer, "managingEditor", editor)?;
    }
    text_element(&mut writer, "generator", &channel.generator)?;
    text_element(&mut writer, "docs", RSS_DOCS)?;
    text_element(&mut writer, "lastBuildDate", &channel.last_build.to_rfc2822())?;
    text_element(&mut writer, "pubDate", &channel.pub_date.to_rfc2822())?;

    for entry in entries {
        write_item(&mut writer, entry)?;
    }

    end(&mut writer, "channel")?;
    end(&mut writer, "rss")?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_item<W: Write>(writer: &mut Writer<W>, entry: &FeedEntry) -> Result<()> {
    start(writer, "item")?;
    text_element(writer, "title", &entry.title)?;
    text_element(writer, "link", &entry.link)?;

    writer
        .write_event(Event::Start(
            BytesStart::new("guid").with_attributes([("isPermaLink", "false")]),
        ))
        .map_err(AppError::feed)?;
    writer
        .write_event(Event::Text(BytesText::new(&entry.id)))
        .map_err(AppError::feed)?;
    end(writer, "guid")?;

    if let Some(author) = &entry.author {
        text_element(writer, "dc:creator", author)?;
    }
    text_element(writer, "description", &entry.description)?;
    text_element(writer, "pubDate", &entry.published.to_rfc2822())?;
    for category in &entry.categories {
        text_element(writer, "category", category)?;
    }
    end(writer, "item")
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(AppError::feed)
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(AppError::feed)
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(AppError::feed)?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date::{jst, parse_pubdate};
    use chrono::TimeZone;

    fn sample_channel() -> FeedChannel {
        let built = jst().with_ymd_and_hms(2024, 2, 12, 9, 0, 0).unwrap();
        FeedChannel {
            title: "新書新刊".into(),
            description: "テスト".into(),
            link: "https://example.com/".into(),
            language: "ja".into(),
            copyright: "c".into(),
            generator: "shinsho-feed".into(),
            managing_editor: None,
            last_build: built,
            pub_date: built,
        }
    }

    #[test]
    fn test_empty_feed_is_wellformed_channel() {
        let xml = String::from_utf8(to_rss(&sample_channel(), &[]).unwrap()).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("<title>新書新刊</title>"));
        assert!(xml.contains("<lastBuildDate>Mon, 12 Feb 2024 09:00:00 +0900</lastBuildDate>"));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn test_entries_are_escaped_and_ordered() {
        let published = parse_pubdate(Some("20240115")).unwrap();
        let entries = vec![
            FeedEntry {
                id: "1".into(),
                title: "A & B".into(),
                link: "https://example.com/1".into(),
                author: Some("著者（著）".into()),
                description: "<b>x</b>".into(),
                published,
                categories: vec!["新書".into()],
            },
            FeedEntry {
                id: "2".into(),
                title: "Second".into(),
                link: "https://example.com/2".into(),
                author: None,
                description: String::new(),
                published,
                categories: vec![],
            },
        ];

        let xml = String::from_utf8(to_rss(&sample_channel(), &entries).unwrap()).unwrap();
        assert!(xml.contains("<title>A &amp; B</title>"));
        assert!(xml.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(xml.contains("<guid isPermaLink=\"false\">1</guid>"));
        assert!(xml.contains("<dc:creator>著者（著）</dc:creator>"));
        assert!(xml.contains("<pubDate>Mon, 15 Jan 2024 00:00:00 +0900</pubDate>"));
        assert_eq!(xml.matches("<item>").count(), 2);
        assert!(xml.find("<guid isPermaLink=\"false\">1").unwrap() < xml.find("<guid isPermaLink=\"false\">2").unwrap());
    }
}
