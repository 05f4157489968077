//! Posting normalization.
//!
//! Maps a [`RawPosting`] to a [`JobRecord`]. Identity is the SHA-1 of the
//! posting link, so the same link always yields the same id regardless of the
//! feed variant or process that computed it.

use chrono::{DateTime, NaiveDateTime};
use sha1::{Digest, Sha1};
use tracing::warn;

use crate::error::NormalizationError;
use crate::feed::{FeedVariant, RawPosting};
use crate::store::JobRecord;

/// Derive the stable job id for a posting link: lowercase hex SHA-1.
pub fn job_id(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse a feed date into epoch seconds.
///
/// RSS dates are RFC 2822; RFC 3339 and a bare `YYYY-MM-DD HH:MM:SS` (taken as
/// UTC) are accepted as well since some job boards emit them.
pub fn parse_pub_date(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.timestamp())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc().timestamp())
        })
}

/// Records produced from one fetched batch.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Successfully normalized records, in feed order.
    pub records: Vec<JobRecord>,
    /// Postings that could not be normalized and were skipped.
    pub skipped: Vec<NormalizationError>,
}

/// Turns raw postings of one feed variant into job records.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    variant: FeedVariant,
}

impl Normalizer {
    pub fn new(variant: FeedVariant) -> Self {
        Self { variant }
    }

    /// Normalize one posting. `observed_at` is the epoch second the batch was seen.
    pub fn normalize(
        &self,
        raw: &RawPosting,
        observed_at: i64,
    ) -> Result<JobRecord, NormalizationError> {
        let url = raw
            .link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .ok_or_else(|| NormalizationError::MissingLink {
                title: raw.title.clone(),
            })?;

        let pub_date = raw.pub_date.as_deref().unwrap_or_default();
        let published_at =
            parse_pub_date(pub_date).ok_or_else(|| NormalizationError::InvalidDate {
                url: url.to_string(),
                raw: pub_date.to_string(),
            })?;

        let structured = |field: &Option<String>| {
            if self.variant.has_structured_fields() {
                field.clone().unwrap_or_default()
            } else {
                String::new()
            }
        };

        Ok(JobRecord {
            id: job_id(url),
            title: raw.title.clone(),
            url: url.to_string(),
            description: raw.content_snippet.clone(),
            employer: structured(&raw.company),
            location: structured(&raw.location),
            job_type: structured(&raw.job_type),
            published_at,
            observed_at,
            delivered: false,
            delivered_at: None,
        })
    }

    /// Normalize a fetched batch, skipping postings that fail.
    pub fn normalize_batch(&self, raws: &[RawPosting], observed_at: i64) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for raw in raws {
            match self.normalize(raw, observed_at) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    warn!(error = %e, "Skipping posting");
                    batch.skipped.push(e);
                }
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(link: &str, pub_date: &str) -> RawPosting {
        RawPosting {
            link: Some(link.to_string()),
            title: "Backend Engineer".to_string(),
            pub_date: Some(pub_date.to_string()),
            content: "<p>Rust and Postgres</p>".to_string(),
            content_snippet: "Rust and Postgres".to_string(),
            job_type: Some("Full Time".to_string()),
            company: Some("Acme".to_string()),
            location: Some("Londrina".to_string()),
        }
    }

    #[test]
    fn test_job_id_is_sha1_hex() {
        assert_eq!(
            job_id("https://example.com/job/1"),
            job_id("https://example.com/job/1")
        );
        // Well-known SHA-1 test vector.
        assert_eq!(job_id("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(job_id("abc").len(), 40);
        assert_ne!(job_id("https://example.com/a"), job_id("https://example.com/b"));
    }

    #[test]
    fn test_identity_is_variant_independent() {
        let raw = posting("https://example.com/job/1", "Mon, 02 Oct 2023 14:30:00 +0000");
        let plain = Normalizer::new(FeedVariant::Plain).normalize(&raw, 10).unwrap();
        let listing = Normalizer::new(FeedVariant::JobListing)
            .normalize(&raw, 20)
            .unwrap();

        assert_eq!(plain.id, listing.id);
        assert_eq!(plain.id, job_id("https://example.com/job/1"));
    }

    #[test]
    fn test_structured_fields_follow_variant() {
        let raw = posting("https://example.com/job/1", "Mon, 02 Oct 2023 14:30:00 +0000");

        let plain = Normalizer::new(FeedVariant::Plain).normalize(&raw, 0).unwrap();
        assert_eq!(plain.employer, "");
        assert_eq!(plain.location, "");
        assert_eq!(plain.job_type, "");

        let listing = Normalizer::new(FeedVariant::JobListing)
            .normalize(&raw, 0)
            .unwrap();
        assert_eq!(listing.employer, "Acme");
        assert_eq!(listing.location, "Londrina");
        assert_eq!(listing.job_type, "Full Time");
    }

    #[test]
    fn test_normalize_fields() {
        let raw = posting("  https://example.com/job/1 ", "Mon, 02 Oct 2023 14:30:00 +0000");
        let record = Normalizer::default().normalize(&raw, 1_700_000_000).unwrap();

        assert_eq!(record.url, "https://example.com/job/1");
        assert_eq!(record.title, "Backend Engineer");
        assert_eq!(record.description, "Rust and Postgres");
        assert_eq!(record.published_at, 1_696_257_000);
        assert_eq!(record.observed_at, 1_700_000_000);
        assert!(!record.delivered);
        assert!(record.delivered_at.is_none());
    }

    #[test]
    fn test_employer_defaults_to_empty() {
        let mut raw = posting("https://example.com/job/1", "Mon, 02 Oct 2023 14:30:00 +0000");
        raw.company = None;
        let record = Normalizer::new(FeedVariant::JobListing)
            .normalize(&raw, 0)
            .unwrap();
        assert_eq!(record.employer, "");
    }

    #[test]
    fn test_parse_pub_date_formats() {
        assert_eq!(
            parse_pub_date("Mon, 02 Oct 2023 14:30:00 +0000"),
            Some(1_696_257_000)
        );
        assert_eq!(
            parse_pub_date("Mon, 02 Oct 2023 11:30:00 -0300"),
            Some(1_696_257_000)
        );
        assert_eq!(parse_pub_date("2023-10-02T14:30:00Z"), Some(1_696_257_000));
        assert_eq!(parse_pub_date("2023-10-02 14:30:00"), Some(1_696_257_000));
        assert_eq!(parse_pub_date("yesterday"), None);
        assert_eq!(parse_pub_date("   "), None);
    }

    #[test]
    fn test_invalid_date_is_an_error() {
        let raw = posting("https://example.com/job/1", "not a date");
        let err = Normalizer::default().normalize(&raw, 0).unwrap_err();
        assert!(matches!(err, NormalizationError::InvalidDate { .. }));
    }

    #[test]
    fn test_missing_link_is_an_error() {
        let mut raw = posting("", "Mon, 02 Oct 2023 14:30:00 +0000");
        let err = Normalizer::default().normalize(&raw, 0).unwrap_err();
        assert!(matches!(err, NormalizationError::MissingLink { .. }));

        raw.link = None;
        assert!(Normalizer::default().normalize(&raw, 0).is_err());
    }

    #[test]
    fn test_batch_skips_bad_postings() {
        let raws = vec![
            posting("https://example.com/job/1", "Mon, 02 Oct 2023 14:30:00 +0000"),
            posting("https://example.com/job/2", "garbage"),
            posting("https://example.com/job/3", "Tue, 03 Oct 2023 14:30:00 +0000"),
        ];

        let batch = Normalizer::default().normalize_batch(&raws, 0);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.records[0].url, "https://example.com/job/1");
        assert_eq!(batch.records[1].url, "https://example.com/job/3");
    }
}
