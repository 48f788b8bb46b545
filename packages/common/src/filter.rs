//! List filters for image records.
//!
//! Filter categories compose with AND; within the tag category any shared tag
//! is enough. Date bounds are inclusive and compared as instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

use crate::record::{ImageRecord, split_tags};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid {param}: '{value}' is not an ISO-8601 date or timestamp")]
pub struct FilterError {
    pub param: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFilter {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Exact, case-sensitive uploader name.
    pub uploader: Option<String>,
    /// Match records sharing at least one of these tags. Empty = no tag filter.
    pub tags: Vec<String>,
}

impl ImageFilter {
    /// Build a filter from raw query values. Empty strings count as absent.
    /// The uploader is compared verbatim, surrounding whitespace included.
    pub fn parse(
        date_from: Option<&str>,
        date_to: Option<&str>,
        uploader: Option<&str>,
        tags: Option<&str>,
    ) -> Result<Self, FilterError> {
        let date_from = non_empty(date_from)
            .map(|v| parse_bound("date_from", v, Bound::Lower))
            .transpose()?;
        let date_to = non_empty(date_to)
            .map(|v| parse_bound("date_to", v, Bound::Upper))
            .transpose()?;

        Ok(Self {
            date_from,
            date_to,
            uploader: uploader.filter(|u| !u.is_empty()).map(str::to_string),
            tags: tags.map(split_tags).unwrap_or_default(),
        })
    }

    pub fn matches(&self, record: &ImageRecord) -> bool {
        if self.date_from.is_some_and(|from| record.upload_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| record.upload_date > to) {
            return false;
        }
        if let Some(uploader) = &self.uploader
            && record.uploader != *uploader
        {
            return false;
        }
        self.tags.is_empty() || record.has_any_tag(&self.tags)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an RFC 3339 timestamp, a naive timestamp (taken as UTC) or a bare date.
///
/// A bare date expands to the first instant of the day for a lower bound and
/// the last representable instant of the day for an upper bound.
fn parse_bound(
    param: &'static str,
    value: &str,
    bound: Bound,
) -> Result<DateTime<Utc>, FilterError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = match bound {
            Bound::Lower => NaiveTime::MIN,
            Bound::Upper => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap_or(NaiveTime::MIN),
        };
        return Ok(date.and_time(time).and_utc());
    }
    Err(FilterError {
        param,
        value: value.to_string(),
    })
}
