//! Notification message composition.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::feed::FeedVariant;
use crate::store::JobRecord;

/// Attachment sidebar color.
const ATTACHMENT_COLOR: &str = "#36a64f";

/// Date format used in notification bodies.
const DATE_FORMAT: &str = "%d/%m/%Y";

/// A message in Slack incoming-webhook shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub fallback: String,
    pub color: String,
    pub title: String,
    pub title_link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    fn short(title: &str, value: &str) -> Self {
        Self {
            title: title.to_string(),
            value: value.to_string(),
            short: true,
        }
    }
}

/// Renders job records into messages for one feed variant.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    variant: FeedVariant,
    region: String,
    offset: FixedOffset,
}

impl MessageTemplate {
    /// `region` is named in the batch banner; dates render in UTC until
    /// [`MessageTemplate::with_offset`] says otherwise.
    pub fn new(variant: FeedVariant, region: impl Into<String>) -> Self {
        Self {
            variant,
            region: region.into(),
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Banner opening a batch of `batch_size` announcements.
    pub fn banner(&self, batch_size: usize) -> String {
        let (found, check) = if batch_size > 1 {
            ("New job openings found", "Check them out!")
        } else {
            ("New job opening found", "Check it out!")
        };

        if self.region.is_empty() {
            format!("{}. {}", found, check)
        } else {
            format!("{} in *{}*. {}", found, self.region, check)
        }
    }

    /// Compose the message for the job at `index` of a batch of `batch_size`.
    ///
    /// The first message of a batch carries the banner.
    pub fn compose(&self, job: &JobRecord, index: usize, batch_size: usize) -> NotificationMessage {
        let banner = (index == 0).then(|| self.banner(batch_size));

        match self.variant {
            FeedVariant::Plain => {
                let line = format!("*{}* - {}", job.title, job.url);
                let text = match banner {
                    Some(banner) => format!("{}\n\n\n{}", banner, line),
                    None => line,
                };
                NotificationMessage {
                    text,
                    attachments: Vec::new(),
                }
            }
            FeedVariant::JobListing => NotificationMessage {
                text: banner.unwrap_or_default(),
                attachments: vec![self.attachment(job)],
            },
        }
    }

    fn attachment(&self, job: &JobRecord) -> Attachment {
        let date = self.format_date(job.published_at);

        let mut fields = Vec::new();
        if !job.employer.is_empty() {
            fields.push(AttachmentField::short("Company", &job.employer));
        }
        if !date.is_empty() {
            fields.push(AttachmentField::short("Date", &date));
        }
        if !job.location.is_empty() {
            fields.push(AttachmentField::short("Location", &job.location));
        }
        if !job.job_type.is_empty() {
            fields.push(AttachmentField::short("Type", &job.job_type));
        }

        Attachment {
            fallback: format!("{} - {}", job.title, job.url),
            color: ATTACHMENT_COLOR.to_string(),
            title: job.title.clone(),
            title_link: job.url.clone(),
            text: job.description.clone(),
            fields,
        }
    }

    fn format_date(&self, epoch_secs: i64) -> String {
        DateTime::<Utc>::from_timestamp(epoch_secs, 0)
            .map(|dt| dt.with_timezone(&self.offset).format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobRecord {
        JobRecord {
            id: "id".to_string(),
            title: "Rust Developer".to_string(),
            url: "https://example.com/job/1".to_string(),
            description: "Build fast things.".to_string(),
            employer: "Acme".to_string(),
            location: "Londrina".to_string(),
            job_type: String::new(),
            published_at: 1_696_257_000,
            observed_at: 0,
            delivered: false,
            delivered_at: None,
        }
    }

    #[test]
    fn test_banner_wording() {
        let template = MessageTemplate::new(FeedVariant::Plain, "Londrina");
        assert_eq!(
            template.banner(3),
            "New job openings found in *Londrina*. Check them out!"
        );
        assert_eq!(
            template.banner(1),
            "New job opening found in *Londrina*. Check it out!"
        );

        let anywhere = MessageTemplate::new(FeedVariant::Plain, "");
        assert_eq!(anywhere.banner(2), "New job openings found. Check them out!");
    }

    #[test]
    fn test_plain_first_of_batch() {
        let template = MessageTemplate::new(FeedVariant::Plain, "Londrina");
        let message = template.compose(&job(), 0, 2);

        assert!(message.text.starts_with("New job openings found"));
        assert!(message.text.ends_with("\n\n\n*Rust Developer* - https://example.com/job/1"));
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn test_plain_later_items_have_no_banner() {
        let template = MessageTemplate::new(FeedVariant::Plain, "Londrina");
        let message = template.compose(&job(), 1, 2);
        assert_eq!(message.text, "*Rust Developer* - https://example.com/job/1");
    }

    #[test]
    fn test_job_listing_attachment() {
        let template = MessageTemplate::new(FeedVariant::JobListing, "Londrina");
        let message = template.compose(&job(), 1, 2);

        assert!(message.text.is_empty());
        let attachment = &message.attachments[0];
        assert_eq!(attachment.title, "Rust Developer");
        assert_eq!(attachment.title_link, "https://example.com/job/1");
        assert_eq!(attachment.text, "Build fast things.");

        let titles: Vec<&str> = attachment.fields.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["Company", "Date", "Location"]);
        assert_eq!(attachment.fields[1].value, "02/10/2023");
    }

    #[test]
    fn test_job_listing_banner_on_first() {
        let template = MessageTemplate::new(FeedVariant::JobListing, "Londrina");
        let message = template.compose(&job(), 0, 1);
        assert_eq!(message.text, "New job opening found in *Londrina*. Check it out!");
        assert_eq!(message.attachments.len(), 1);
    }

    #[test]
    fn test_date_uses_offset() {
        let mut late = job();
        // 2023-10-03T01:00:00Z is still the 2nd in UTC-3.
        late.published_at = 1_696_294_800;
        let template = MessageTemplate::new(FeedVariant::JobListing, "")
            .with_offset(FixedOffset::west_opt(3 * 3600).unwrap());
        let message = template.compose(&late, 1, 2);
        assert_eq!(message.attachments[0].fields[1].value, "02/10/2023");
    }

    #[test]
    fn test_serialized_shape() {
        let template = MessageTemplate::new(FeedVariant::Plain, "Londrina");
        let value = serde_json::to_value(template.compose(&job(), 1, 2)).unwrap();
        assert_eq!(value["text"], "*Rust Developer* - https://example.com/job/1");
        assert!(value.get("attachments").is_none());

        let template = MessageTemplate::new(FeedVariant::JobListing, "Londrina");
        let value = serde_json::to_value(template.compose(&job(), 1, 2)).unwrap();
        assert!(value.get("text").is_none());
        assert_eq!(value["attachments"][0]["fields"][0]["short"], true);
    }
}
