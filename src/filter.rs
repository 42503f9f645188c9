// Date filtering for consultation lists

use crate::record::{Consultation, resolve_local};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::str::FromStr;
use tracing::debug;

/// Coarse relative-date filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DayBucket {
    #[default]
    None,
    Today,
    Yesterday,
}

impl FromStr for DayBucket {
    type Err = std::convert::Infallible;

    /// Unknown selector values select no bucket.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "today" => DayBucket::Today,
            "yesterday" => DayBucket::Yesterday,
            _ => DayBucket::None,
        })
    }
}

impl std::fmt::Display for DayBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayBucket::None => write!(f, ""),
            DayBucket::Today => write!(f, "today"),
            DayBucket::Yesterday => write!(f, "yesterday"),
        }
    }
}

/// User-supplied filter selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub day_bucket: DayBucket,
    /// Inclusive start of the explicit range
    pub from_date: Option<NaiveDate>,
    /// Inclusive end of the explicit range
    pub to_date: Option<NaiveDate>,
}

impl FilterCriteria {
    /// The explicit range, only when both ends are set
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.from_date.zip(self.to_date)
    }

    pub fn is_empty(&self) -> bool {
        self.day_bucket == DayBucket::None && self.range().is_none()
    }
}

/// Half-open `[start, end)` window for a day bucket
fn bucket_window<Tz: TimeZone>(bucket: DayBucket, now: &DateTime<Tz>) -> Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let tz = now.timezone();
    let today = now.date_naive();
    let start_of_today = resolve_local(&tz, today.and_time(NaiveTime::MIN));

    match bucket {
        DayBucket::None => None,
        DayBucket::Today => Some((start_of_today, None)),
        DayBucket::Yesterday => {
            let start_of_yesterday = today
                .pred_opt()
                .and_then(|day| resolve_local(&tz, day.and_time(NaiveTime::MIN)));
            Some((start_of_yesterday, start_of_today))
        }
    }
}

/// Inclusive `[from 00:00:00.000, to 23:59:59.999]` window in local time
fn range_window<Tz: TimeZone>(
    from: NaiveDate,
    to: NaiveDate,
    tz: &Tz,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    (
        resolve_local(tz, from.and_time(NaiveTime::MIN)),
        resolve_local(tz, to.and_time(end_of_day)),
    )
}

/// Select the records matching `criteria`, evaluated at `now`.
///
/// The day bucket narrows first, then the explicit range narrows further; the
/// result keeps the input order. `now`'s time zone defines local midnight.
/// Records whose timestamp does not parse never pass an active date pass.
pub fn apply_filters<Tz: TimeZone>(
    records: &[Consultation],
    criteria: &FilterCriteria,
    now: &DateTime<Tz>,
) -> Vec<Consultation> {
    let tz = now.timezone();
    let bucket = bucket_window(criteria.day_bucket, now);
    let range = criteria.range().map(|(from, to)| range_window(from, to, &tz));

    if bucket.is_none() && range.is_none() {
        return records.to_vec();
    }

    let filtered: Vec<Consultation> = records
        .iter()
        .filter(|record| {
            let created = record.created_instant(&tz);

            let in_bucket = match bucket {
                None => true,
                Some((start, end)) => created.is_some_and(|at| {
                    start.is_some_and(|s| at >= s) && end.is_none_or(|e| at < e)
                }),
            };
            if !in_bucket {
                return false;
            }

            match range {
                None => true,
                Some((from, to)) => created.is_some_and(|at| {
                    from.is_some_and(|f| at >= f) && to.is_some_and(|t| at <= t)
                }),
            }
        })
        .cloned()
        .collect();

    debug!(
        bucket = %criteria.day_bucket,
        from = ?criteria.from_date,
        to = ?criteria.to_date,
        input = records.len(),
        output = filtered.len(),
        "Applied filters"
    );

    filtered
}
