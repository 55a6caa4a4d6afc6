//! Movie records and their validation rules.
//!
//! [`NewMovie`] is the loosely-typed payload accepted from clients. It is
//! turned into [`MovieFields`] by [`NewMovie::validate`], which trims text,
//! parses the release date and collects every rule violation into a single
//! [`CineError::Validation`]. A stored [`Movie`] wraps the fields with an id,
//! the submitting user and timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CineError;

pub type MovieId = Uuid;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;
pub const DURATION_MIN: i64 = 1;
pub const DURATION_MAX: i64 = 600;
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;
const TRAILER_ID_LEN: usize = 11;

/// A platform where the movie can be watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingLink {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
}

/// Unvalidated movie payload as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMovie {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ISO 8601 date (`2024-05-01`) or datetime (`2024-05-01T00:00:00Z`).
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub poster: String,
    #[serde(default)]
    pub trailer_id: String,
    #[serde(default)]
    pub streaming_links: Vec<StreamingLink>,
}

/// Partial update: only keys present in the request are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub trailer_id: Option<String>,
    #[serde(default)]
    pub streaming_links: Option<Vec<StreamingLink>>,
}

/// Validated, normalized movie content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFields {
    pub title: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: u16,
    pub rating: f64,
    pub poster: String,
    pub trailer_id: String,
    pub streaming_links: Vec<StreamingLink>,
}

/// A stored movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    #[serde(flatten)]
    pub fields: MovieFields,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn new(fields: MovieFields, added_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            fields,
            added_by: added_by.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl NewMovie {
    /// Check every rule and return the normalized fields, or all violations
    /// joined with ", ".
    pub fn validate(&self) -> Result<MovieFields, CineError> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        }

        let description = self.description.trim().to_string();
        if description.is_empty() {
            errors.push("Description is required".to_string());
        }

        let release_date = match self.release_date.trim() {
            "" => {
                errors.push("Release date is required".to_string());
                None
            }
            raw => {
                let parsed = parse_release_date(raw);
                if parsed.is_none() {
                    errors.push("Release date must be a valid date (ISO 8601 format)".to_string());
                }
                parsed
            }
        };

        let duration = match self.duration {
            None => {
                errors.push("Duration is required".to_string());
                None
            }
            Some(d) if !(DURATION_MIN..=DURATION_MAX).contains(&d) => {
                errors.push("Duration must be between 1 and 600 minutes".to_string());
                None
            }
            Some(d) => Some(d as u16),
        };

        let rating = match self.rating {
            None => {
                errors.push("Rating is required".to_string());
                None
            }
            Some(r) if !(RATING_MIN..=RATING_MAX).contains(&r) => {
                errors.push("Rating must be between 0 and 10".to_string());
                None
            }
            Some(r) => Some(r),
        };

        let fields = MovieFields {
            title,
            description,
            release_date: release_date.unwrap_or_default(),
            duration: duration.unwrap_or_default(),
            rating: rating.unwrap_or_default(),
            poster: self.poster.trim().to_string(),
            trailer_id: self.trailer_id.trim().to_string(),
            streaming_links: self
                .streaming_links
                .iter()
                .map(|l| StreamingLink {
                    platform: l.platform.trim().to_string(),
                    url: l.url.trim().to_string(),
                })
                .collect(),
        };
        errors.extend(fields.violations());

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(CineError::Validation(errors.join(", ")))
        }
    }
}

impl MoviePatch {
    /// Merge present keys over `current` and validate the result as a whole.
    pub fn apply(&self, current: &MovieFields) -> Result<MovieFields, CineError> {
        let merged = NewMovie {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            release_date: self
                .release_date
                .clone()
                .unwrap_or_else(|| current.release_date.format("%Y-%m-%d").to_string()),
            duration: self.duration.or(Some(i64::from(current.duration))),
            rating: self.rating.or(Some(current.rating)),
            poster: self.poster.clone().unwrap_or_else(|| current.poster.clone()),
            trailer_id: self
                .trailer_id
                .clone()
                .unwrap_or_else(|| current.trailer_id.clone()),
            streaming_links: self
                .streaming_links
                .clone()
                .unwrap_or_else(|| current.streaming_links.clone()),
        };
        merged.validate()
    }
}

impl MovieFields {
    /// Rules that can be rechecked on already-typed fields.
    ///
    /// Used by [`NewMovie::validate`] and again by stores before persisting,
    /// so records that bypassed the HTTP layer are held to the same schema.
    pub fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.title.chars().count() > TITLE_MAX_CHARS {
            errors.push("Title cannot exceed 200 characters".to_string());
        }
        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.push("Description cannot exceed 2000 characters".to_string());
        }
        if !self.poster.is_empty() && !is_http_url(&self.poster) {
            errors.push("Poster must be a valid URL".to_string());
        }
        if !self.trailer_id.is_empty() && !is_trailer_id(&self.trailer_id) {
            errors.push("Trailer ID must be a valid YouTube video ID (11 characters)".to_string());
        }
        for link in &self.streaming_links {
            if link.platform.is_empty() {
                errors.push("Platform name is required".to_string());
            }
            if !is_http_url(&link.url) {
                errors.push("Streaming link must be a valid URL".to_string());
            }
        }

        errors
    }
}

fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

fn is_trailer_id(value: &str) -> bool {
    value.len() == TRAILER_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
