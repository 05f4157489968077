//! Feed ingestion.
//!
//! A [`Fetcher`] turns a feed source (remote url or local fixture) into a list of
//! [`RawPosting`]s. Two feed shapes are understood, selected by [`FeedVariant`]:
//! plain RSS, and RSS extended with `job_listing:*` fields as published by
//! WordPress job boards.

mod fetcher;
pub mod rss;

pub use fetcher::{FixtureFetcher, HttpFetcher};

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One entry as it came out of the feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPosting {
    pub link: Option<String>,
    pub title: String,
    pub pub_date: Option<String>,
    /// Entry body, possibly HTML.
    pub content: String,
    /// Plain-text rendering of `content`.
    pub content_snippet: String,
    pub job_type: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

/// Shape of the feed being ingested.
///
/// Both variants derive job identity the same way; they differ in which
/// structured fields are mapped and how notifications are rendered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum FeedVariant {
    /// Plain RSS: title, link, date and content only.
    Plain,
    /// RSS with `job_listing:company`, `job_listing:location` and
    /// `job_listing:job_type` fields.
    #[default]
    JobListing,
}

impl FeedVariant {
    /// Whether postings of this variant carry structured employer data.
    pub fn has_structured_fields(self) -> bool {
        matches!(self, Self::JobListing)
    }
}

impl std::fmt::Display for FeedVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedVariant::Plain => write!(f, "plain"),
            FeedVariant::JobListing => write!(f, "job-listing"),
        }
    }
}

/// Source of raw postings.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Human-readable description of where postings come from.
    fn source_name(&self) -> &str;

    /// Fetch every posting currently in the feed.
    ///
    /// Fails with [`Error::Transport`] when the source cannot be read,
    /// [`Error::FeedParse`] when it is not a feed, and [`Error::EmptyFeed`]
    /// when it parsed but held no entries.
    async fn fetch(&self) -> Result<Vec<RawPosting>>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    fn source_name(&self) -> &str {
        (**self).source_name()
    }

    async fn fetch(&self) -> Result<Vec<RawPosting>> {
        (**self).fetch().await
    }
}

/// Reject an empty parse result with [`Error::EmptyFeed`].
pub(crate) fn require_entries(source: &str, postings: Vec<RawPosting>) -> Result<Vec<RawPosting>> {
    if postings.is_empty() {
        return Err(Error::EmptyFeed {
            source_name: source.to_string(),
        });
    }
    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_variant_is_job_listing() {
        assert_eq!(FeedVariant::default(), FeedVariant::JobListing);
        assert!(FeedVariant::JobListing.has_structured_fields());
        assert!(!FeedVariant::Plain.has_structured_fields());
    }

    #[test]
    fn test_variant_display_matches_cli_value() {
        for variant in FeedVariant::value_variants() {
            let parsed = FeedVariant::from_str(&variant.to_string(), false).unwrap();
            assert_eq!(parsed, *variant);
        }
    }

    #[test]
    fn test_require_entries() {
        let err = require_entries("fixture", Vec::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyFeed { ref source_name } if source_name == "fixture"));

        let postings = vec![RawPosting::default()];
        assert_eq!(require_entries("fixture", postings).unwrap().len(), 1);
    }
}
