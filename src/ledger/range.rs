use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::errors::ServiceError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive reporting window in UTC.
///
/// The end bound always sits at 23:59:59.999 of the end date so that the
/// whole final day is inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "startDate {} is after endDate {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses `startDate` and `endDate` as supplied on the query string.
    pub fn parse(start: &str, end: &str) -> Result<Self, ServiceError> {
        let start = parse_start(start)?;
        let end = parse_end(end)?;
        Self::new(start, end)
    }

    /// Builds a range only when both bounds are present.
    ///
    /// Blank values count as absent. Any value that is present must parse,
    /// even when the other bound is missing.
    pub fn from_params(
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Option<Self>, ServiceError> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());

        match (start, end) {
            (Some(start), Some(end)) => Self::parse(start, end).map(Some),
            (Some(start), None) => parse_start(start).map(|_| None),
            (None, Some(end)) => parse_end(end).map(|_| None),
            (None, None) => Ok(None),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True for anything dated after the end bound.
    pub fn is_after(&self, at: DateTime<Utc>) -> bool {
        at > self.end
    }
}

fn parse_start(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return at_time(date, 0, 0, 0, 0, "startDate");
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid_date("startDate", raw))
}

fn parse_end(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    let date = match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .map_err(|_| invalid_date("endDate", raw))?,
    };
    at_time(date, 23, 59, 59, 999, "endDate")
}

fn at_time(
    date: NaiveDate,
    hour: u32,
    min: u32,
    sec: u32,
    milli: u32,
    field: &str,
) -> Result<DateTime<Utc>, ServiceError> {
    let naive: NaiveDateTime = date
        .and_hms_milli_opt(hour, min, sec, milli)
        .ok_or_else(|| ServiceError::ValidationError(format!("Invalid {} time", field)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn invalid_date(field: &str, raw: &str) -> ServiceError {
    ServiceError::ValidationError(format!(
        "{} must be YYYY-MM-DD or RFC 3339, got '{}'",
        field, raw
    ))
}
