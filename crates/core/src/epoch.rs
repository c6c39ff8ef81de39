// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of Refward.
//
// Refward is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// Refward is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with Refward. If not, see <https://www.gnu.org/licenses/>.

//! Calendar-aligned epoch identifiers.
//!
//! ## Purpose
//! An epoch is the fixed-duration accounting window rewards are aggregated
//! over. Canonical forms:
//!
//! - `YYYY-MM-DD` for daily (and multi-day) epochs
//! - `YYYY-MM-DDTHH` for sub-daily epochs
//!
//! Sub-daily epochs start at hours that are exact multiples of the duration
//! from UTC midnight, so an epoch id always names the same [start, end)
//! window regardless of when it is computed.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Epoch parsing/arithmetic errors.
#[derive(Debug, Error)]
pub enum EpochError {
    /// The id string is not a canonical epoch form.
    #[error("Invalid epoch id '{0}': expected YYYY-MM-DD or YYYY-MM-DDTHH")]
    InvalidId(String),

    /// The configured duration cannot tile a calendar day.
    #[error("Invalid epoch duration {0}h: must divide 24 or be a whole number of days")]
    InvalidDuration(u32),
}

/// Identifier of one aggregation window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochId(String);

impl EpochId {
    /// Parse a canonical epoch id, validating the calendar components.
    pub fn parse(s: &str) -> Result<Self, EpochError> {
        if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
            return Ok(Self(s.to_string()));
        }
        if NaiveDateTime::parse_from_str(&format!("{}:00:00", s), "%Y-%m-%dT%H:%M:%S").is_ok() {
            return Ok(Self(s.to_string()));
        }
        Err(EpochError::InvalidId(s.to_string()))
    }

    /// The epoch containing `ts` for the given duration in hours.
    ///
    /// Durations of a whole number of days align to UTC midnight (multi-day
    /// epochs anchor on the day count since the calendar epoch); sub-daily
    /// durations must divide 24 and align to midnight multiples.
    pub fn for_timestamp(ts: DateTime<Utc>, duration_hours: u32) -> Result<Self, EpochError> {
        validate_duration(duration_hours)?;
        if duration_hours % 24 == 0 {
            let days = (duration_hours / 24) as i32;
            let day_index = ts.date_naive().num_days_from_ce();
            let aligned = day_index - day_index.rem_euclid(days);
            let date = NaiveDate::from_num_days_from_ce_opt(aligned)
                .ok_or(EpochError::InvalidDuration(duration_hours))?;
            Ok(Self(date.format("%Y-%m-%d").to_string()))
        } else {
            let hour = (ts.hour() / duration_hours) * duration_hours;
            Ok(Self(format!(
                "{}T{:02}",
                ts.date_naive().format("%Y-%m-%d"),
                hour
            )))
        }
    }

    /// The `[start, end)` boundary of this epoch for the given duration.
    pub fn bounds(
        &self,
        duration_hours: u32,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), EpochError> {
        validate_duration(duration_hours)?;
        let start = self.start()?;
        Ok((start, start + Duration::hours(duration_hours as i64)))
    }

    /// The epoch immediately before this one.
    pub fn previous(&self, duration_hours: u32) -> Result<Self, EpochError> {
        let (start, _) = self.bounds(duration_hours)?;
        Self::for_timestamp(start - Duration::seconds(1), duration_hours)
    }

    /// The epoch immediately after this one.
    pub fn next(&self, duration_hours: u32) -> Result<Self, EpochError> {
        let (_, end) = self.bounds(duration_hours)?;
        Self::for_timestamp(end, duration_hours)
    }

    /// The canonical id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn start(&self) -> Result<DateTime<Utc>, EpochError> {
        if let Ok(date) = NaiveDate::parse_from_str(&self.0, "%Y-%m-%d") {
            let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
            return Ok(date.and_time(midnight).and_utc());
        }
        if let Ok(dt) =
            NaiveDateTime::parse_from_str(&format!("{}:00:00", self.0), "%Y-%m-%dT%H:%M:%S")
        {
            return Ok(dt.and_utc());
        }
        Err(EpochError::InvalidId(self.0.clone()))
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_duration(hours: u32) -> Result<(), EpochError> {
    if hours == 0 || (hours < 24 && 24 % hours != 0) || (hours > 24 && hours % 24 != 0) {
        return Err(EpochError::InvalidDuration(hours));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_epoch_id_and_bounds() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 13, 45, 0).unwrap();
        let epoch = EpochId::for_timestamp(ts, 24).unwrap();
        assert_eq!(epoch.as_str(), "2025-01-15");

        let (start, end) = epoch.bounds(24).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn epoch_is_stable_across_its_window() {
        let early = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 1, 15, 23, 59, 59).unwrap();
        assert_eq!(
            EpochId::for_timestamp(early, 24).unwrap(),
            EpochId::for_timestamp(late, 24).unwrap()
        );
    }

    #[test]
    fn sub_daily_epochs_align_to_midnight_multiples() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 13, 45, 0).unwrap();
        let epoch = EpochId::for_timestamp(ts, 6).unwrap();
        assert_eq!(epoch.as_str(), "2025-01-15T12");

        let (start, end) = epoch.bounds(6).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 15, 18, 0, 0).unwrap());
    }

    #[test]
    fn previous_and_next_walk_the_calendar() {
        let epoch = EpochId::parse("2025-01-15").unwrap();
        assert_eq!(epoch.previous(24).unwrap().as_str(), "2025-01-14");
        assert_eq!(epoch.next(24).unwrap().as_str(), "2025-01-16");

        let hourly = EpochId::parse("2025-01-15T18").unwrap();
        assert_eq!(hourly.next(6).unwrap().as_str(), "2025-01-16T00");
        assert_eq!(hourly.previous(6).unwrap().as_str(), "2025-01-15T12");
    }

    #[test]
    fn rejects_malformed_ids_and_durations() {
        assert!(EpochId::parse("2025-13-40").is_err());
        assert!(EpochId::parse("not-an-epoch").is_err());
        assert!(EpochId::parse("2025-01-15T25").is_err());

        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        assert!(EpochId::for_timestamp(ts, 0).is_err());
        assert!(EpochId::for_timestamp(ts, 7).is_err());
        assert!(EpochId::for_timestamp(ts, 36).is_err());
        assert!(EpochId::for_timestamp(ts, 48).is_ok());
    }

    #[test]
    fn bounds_span_equals_duration() {
        let epoch = EpochId::parse("2025-01-15").unwrap();
        let (start, end) = epoch.bounds(48).unwrap();
        assert_eq!(end - start, Duration::hours(48));
    }
}
