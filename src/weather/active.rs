//! Active forecast period selection
//!
//! TAF groups only carry day-of-month and hour. The month is guessed from
//! `now`: a day more than 15 behind today is read as next month, a day more
//! than 15 ahead as last month. This is an approximation for forecasts that
//! straddle a month boundary, not calendar arithmetic, and TEMPO / BECMG
//! groups are not considered at all.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use super::taf::{TafEntry, TafEntryKind};

/// Day difference beyond which the entry is assumed to be in a neighbouring month
const MONTH_ROLLOVER_DAYS: i32 = 15;

/// Start time of `entry` relative to `now`, if it has a usable day and hour.
#[must_use]
pub fn entry_start(entry: &TafEntry, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let day = u32::from(entry.day?);
    let hour = u32::from(entry.hour?);

    let month_start = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?;
    let delta = i32::try_from(day).ok()? - i32::try_from(now.day()).ok()?;
    let month_start = if delta < -MONTH_ROLLOVER_DAYS {
        month_start.checked_add_months(Months::new(1))?
    } else if delta > MONTH_ROLLOVER_DAYS {
        month_start.checked_sub_months(Months::new(1))?
    } else {
        month_start
    };

    Some(month_start.with_day(day)?.and_hms_opt(hour, 0, 0)?.and_utc())
}

/// Index of the entry in effect at `now`.
///
/// Among FM, BASE and HEADER entries with a timestamp, the one with the
/// latest start not after `now` wins; later entries win ties.
#[must_use]
pub fn select_active(entries: &[TafEntry], now: DateTime<Utc>) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| {
            matches!(
                entry.kind,
                TafEntryKind::Fm | TafEntryKind::Base | TafEntryKind::Header
            )
        })
        .filter_map(|(index, entry)| Some((index, entry_start(entry, now)?)))
        .filter(|(_, start)| *start <= now)
        .max_by_key(|(index, start)| (*start, *index))
        .map(|(index, _)| index)
}
