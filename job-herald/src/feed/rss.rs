//! Minimal RSS 2.0 reader.
//!
//! Only `<item>` children relevant to job postings are collected; everything
//! else in the document is skipped. Element names are matched on their full
//! qualified name so that `job_listing:company` and `content:encoded` work
//! without namespace resolution.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use super::RawPosting;
use crate::{Error, Result};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Link,
    PubDate,
    Description,
    ContentEncoded,
    JobType,
    Company,
    Location,
}

impl ItemField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"pubDate" => Some(Self::PubDate),
            b"description" => Some(Self::Description),
            b"content:encoded" => Some(Self::ContentEncoded),
            b"job_listing:job_type" => Some(Self::JobType),
            b"job_listing:company" => Some(Self::Company),
            b"job_listing:location" => Some(Self::Location),
            _ => None,
        }
    }
}

/// Accumulates the fields of the `<item>` currently being read.
#[derive(Debug, Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
    content_encoded: Option<String>,
    job_type: Option<String>,
    company: Option<String>,
    location: Option<String>,
}

impl ItemBuilder {
    fn set(&mut self, field: ItemField, value: String) {
        let value = value.trim().to_string();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            ItemField::Title => &mut self.title,
            ItemField::Link => &mut self.link,
            ItemField::PubDate => &mut self.pub_date,
            ItemField::Description => &mut self.description,
            ItemField::ContentEncoded => &mut self.content_encoded,
            ItemField::JobType => &mut self.job_type,
            ItemField::Company => &mut self.company,
            ItemField::Location => &mut self.location,
        };
        *slot = Some(value);
    }

    fn build(self) -> RawPosting {
        let content = self
            .description
            .or(self.content_encoded)
            .unwrap_or_default();
        let content_snippet = content_snippet(&content);

        RawPosting {
            link: self.link,
            title: self.title.unwrap_or_default(),
            pub_date: self.pub_date,
            content,
            content_snippet,
            job_type: self.job_type,
            company: self.company,
            location: self.location,
        }
    }
}

/// Parse an RSS document into raw postings, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<RawPosting>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut postings = Vec::new();
    let mut item: Option<ItemBuilder> = None;
    let mut field: Option<ItemField> = None;
    let mut text = String::new();
    let mut saw_channel = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::feed_parse(format!(
                "invalid XML at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"channel" => saw_channel = true,
                b"item" => {
                    item = Some(ItemBuilder::default());
                    field = None;
                }
                name if item.is_some() && field.is_none() => {
                    field = ItemField::from_name(name);
                    text.clear();
                }
                _ => {}
            },
            Event::Text(e) => {
                if field.is_some() {
                    let decoded = e
                        .unescape()
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    text.push_str(&decoded);
                }
            }
            Event::CData(e) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"item" => {
                    if let Some(builder) = item.take() {
                        postings.push(builder.build());
                    }
                    field = None;
                }
                name => {
                    if let (Some(current), Some(builder)) = (field, item.as_mut())
                        && ItemField::from_name(name) == Some(current)
                    {
                        builder.set(current, std::mem::take(&mut text));
                        field = None;
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_channel {
        return Err(Error::feed_parse("document has no RSS <channel> element"));
    }

    Ok(postings)
}

/// Plain-text rendering of an HTML fragment: tags removed, common entities
/// decoded, runs of spaces collapsed and the result trimmed.
pub fn content_snippet(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, "");
    let decoded = decode_entities(&stripped);
    let collapsed = WHITESPACE_RE.replace_all(&decoded, " ");
    collapsed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(input: &str) -> String {
    let named = input
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&hellip;", "…");

    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures<'_>| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    // Last, so that "&amp;lt;" decodes to "&lt;" rather than "<".
    numeric.replace("&amp;", "&")
}
