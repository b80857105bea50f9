//! Time window resolution (business time zone → inclusive UTC bounds)
//!
//! Both bounds are closed and millisecond-inclusive: a date-only start is local
//! `00:00:00.000`, a date-only end is local `23:59:59.999`. The offset is taken
//! at the local wall-clock instant, so DST is honoured per bound.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use shared::error::ErrorCode;
use shared::models::ReportWindow;
use tally_client::OrderFilter;

use crate::error::{EngineError, EngineResult};

/// Default business time zone
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::America::New_York;

/// Which side of the window a local time resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Start,
    End,
}

/// Resolved, inclusive UTC window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub time_zone: Tz,
}

impl TimeWindow {
    /// Resolve two caller strings in `tz`
    pub fn resolve(from: &str, to: &str, tz: Tz) -> EngineResult<Self> {
        let start_utc = resolve_bound(from, tz, Bound::Start)?;
        let end_utc = resolve_bound(to, tz, Bound::End)?;
        if start_utc > end_utc {
            return Err(EngineError::invalid(
                ErrorCode::InvalidDateRange,
                format!("Window start {from} is after window end {to}"),
            ));
        }
        Ok(Self {
            start_utc,
            end_utc,
            time_zone: tz,
        })
    }

    /// Whole local days `start..=end`
    pub fn for_dates(start: NaiveDate, end: NaiveDate, tz: Tz) -> EngineResult<Self> {
        Self::resolve(&start.to_string(), &end.to_string(), tz)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start_utc && ts <= self.end_utc
    }

    /// Calendar date of `ts` in the business zone
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.time_zone).date_naive()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.local_date(self.start_utc)
    }

    pub fn end_date(&self) -> NaiveDate {
        self.local_date(self.end_utc)
    }

    /// Inclusive local day count
    pub fn days(&self) -> i64 {
        (self.end_date() - self.start_date()).num_days() + 1
    }

    /// Every local calendar date in the window
    pub fn dates(&self) -> Vec<NaiveDate> {
        let end = self.end_date();
        self.start_date()
            .iter_days()
            .take_while(|d| *d <= end)
            .collect()
    }

    pub fn created_filter(&self) -> OrderFilter {
        OrderFilter::created(self.start_utc, self.end_utc)
    }

    pub fn updated_filter(&self) -> OrderFilter {
        OrderFilter::updated(self.start_utc, self.end_utc)
    }

    pub fn describe(&self) -> ReportWindow {
        ReportWindow {
            start_utc: self.start_utc,
            end_utc: self.end_utc,
            time_zone: self.time_zone.name().to_string(),
            start_date: self.start_date(),
            end_date: self.end_date(),
            days: self.days(),
        }
    }
}

/// Parse an IANA zone name
pub fn parse_time_zone(name: &str) -> EngineResult<Tz> {
    name.trim().parse::<Tz>().map_err(|_| {
        EngineError::invalid(
            ErrorCode::InvalidTimeZone,
            format!("Unknown time zone: {name}"),
        )
    })
}

/// Local wall-clock instant a caller string stands for
fn parse_local(input: &str, bound: Bound) -> EngineResult<NaiveDateTime> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => NaiveTime::MIN,
            Bound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN),
        };
        return Ok(date.and_time(time));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        // An end bound without fraction covers its whole second
        if bound == Bound::End && dt.nanosecond() == 0 && !input.contains('.') {
            return Ok(dt + Duration::milliseconds(999));
        }
        return Ok(dt);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M") {
        return Ok(match bound {
            Bound::Start => dt,
            Bound::End => dt + Duration::milliseconds(59_999),
        });
    }

    Err(EngineError::invalid(
        ErrorCode::InvalidDate,
        format!("Invalid date: {input:?} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS[.fff]])"),
    ))
}

fn resolve_bound(input: &str, tz: Tz, bound: Bound) -> EngineResult<DateTime<Utc>> {
    let local = parse_local(input, bound)?;
    Ok(local_to_utc(local, tz, bound))
}

/// Ambiguous → earliest for a start, latest for an end.
/// Nonexistent (DST gap) → first valid instant after it.
fn local_to_utc(local: NaiveDateTime, tz: Tz, bound: Bound) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(a, b) => {
            let (earliest, latest) = if a <= b { (a, b) } else { (b, a) };
            match bound {
                Bound::Start => earliest.with_timezone(&Utc),
                Bound::End => latest.with_timezone(&Utc),
            }
        }
        LocalResult::None => first_valid_after(local, tz),
    }
}

fn first_valid_after(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    // Transitions fall on whole minutes
    let mut probe = local
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    for _ in 0..(24 * 60) {
        probe += Duration::minutes(1);
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            return dt.with_timezone(&Utc);
        }
    }
    tracing::warn!(%local, tz = tz.name(), "No valid local time found after gap, using UTC");
    local.and_utc()
}
