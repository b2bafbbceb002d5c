//! Reduction of the 3-hour forecast series to one reading per future day.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::types::{DailyForecast, ForecastEntry};

/// Maximum number of days shown in the forecast strip
pub const MAX_FORECAST_DAYS: usize = 5;

/// Pick one entry per calendar day after `today`, in time zone `tz`.
///
/// The first entry seen for a date wins; later entries for the same date are
/// ignored. Once `MAX_FORECAST_DAYS` dates are collected no new dates are
/// accepted. The result is sorted by date.
pub fn select_daily<Tz: TimeZone>(
    entries: &[ForecastEntry],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<DailyForecast> {
    let mut days: BTreeMap<NaiveDate, DailyForecast> = BTreeMap::new();

    for entry in entries {
        let Some(date) = entry_date(entry.timestamp, tz) else {
            tracing::debug!("Skipping forecast entry with bad timestamp {}", entry.timestamp);
            continue;
        };

        if date <= today || days.contains_key(&date) || days.len() >= MAX_FORECAST_DAYS {
            continue;
        }

        days.insert(
            date,
            DailyForecast {
                date,
                temperature: entry.temperature,
                icon_id: entry.icon_id.clone(),
                description: entry.description.clone(),
            },
        );
    }

    days.into_values().collect()
}

fn entry_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(tz).date_naive())
}
