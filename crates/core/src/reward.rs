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

//! Reward records and batch decisions.
//!
//! ## Purpose
//! A [`RewardRecord`] is the durable row created once per (affiliate, epoch)
//! by the epoch calculator and transitioned by the distribution orchestrator.
//! A [`BatchDecision`] is the ephemeral result of one threshold evaluation;
//! it is journaled, never persisted as its own entity.
//!
//! ## Lifecycle
//! ```text
//! Calculated ──(successful batch)──> Distributed ──(claim)──> Claimed
//!     │
//!     └──(terminal payout error)──> Failed
//! ```
//! A failed *batch* leaves records in `Calculated` so the next evaluation
//! cycle retries them; `Failed` is reserved for per-record terminal errors.

use crate::epoch::EpochId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a reward record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    /// Created by the epoch calculator, awaiting distribution.
    Calculated,
    /// Included in a successful batch payout.
    Distributed,
    /// Claimed downstream (out of core scope, kept for round-tripping).
    Claimed,
    /// Terminally failed.
    Failed,
}

impl RewardStatus {
    /// Stable string form used by the SQL backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calculated => "calculated",
            Self::Distributed => "distributed",
            Self::Claimed => "claimed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calculated" => Ok(Self::Calculated),
            "distributed" => Ok(Self::Distributed),
            "claimed" => Ok(Self::Claimed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown reward status '{}'", other)),
        }
    }
}

/// One reward row per (affiliate, epoch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardRecord {
    /// Unique record id.
    pub id: Uuid,
    /// The affiliate this reward belongs to.
    pub affiliate_id: String,
    /// The epoch the clicks were aggregated over.
    pub epoch_id: EpochId,
    /// Every click attributed to this affiliate in the epoch.
    pub total_clicks: u64,
    /// Clicks with a valid verdict.
    pub valid_clicks: u64,
    /// Clicks that cleared the eligibility gate.
    pub eligible_clicks: u64,
    /// `eligible_clicks × reward_per_click`, exact decimal arithmetic.
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: RewardStatus,
    /// Payment reference set when the record is distributed.
    pub payment_ref: Option<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last transition instant.
    pub updated_at: DateTime<Utc>,
}

impl RewardRecord {
    /// Create a freshly calculated record.
    #[allow(clippy::too_many_arguments)]
    pub fn calculated(
        affiliate_id: impl Into<String>,
        epoch_id: EpochId,
        total_clicks: u64,
        valid_clicks: u64,
        eligible_clicks: u64,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            affiliate_id: affiliate_id.into(),
            epoch_id,
            total_clicks,
            valid_clicks,
            eligible_clicks,
            amount,
            status: RewardStatus::Calculated,
            payment_ref: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of one batch-threshold evaluation. Ephemeral, journaled only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDecision {
    /// Whether any trigger fired.
    pub triggered: bool,
    /// Which triggers fired (or why nothing did).
    pub reasons: Vec<String>,
    /// Distinct affiliates with pending rewards.
    pub pending_affiliates: usize,
    /// Sum of pending reward amounts.
    pub pending_amount: Decimal,
    /// `cost_base + cost_per_recipient × pending_affiliates`.
    pub estimated_cost: Decimal,
    /// Evaluation instant.
    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            RewardStatus::Calculated,
            RewardStatus::Distributed,
            RewardStatus::Claimed,
            RewardStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<RewardStatus>().unwrap(), status);
        }
        assert!("pending".parse::<RewardStatus>().is_err());
    }

    #[test]
    fn calculated_record_starts_clean() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let epoch = EpochId::parse("2025-01-15").unwrap();
        let record = RewardRecord::calculated("aff-1", epoch, 10, 8, 3, dec!(0.75), now);

        assert_eq!(record.status, RewardStatus::Calculated);
        assert!(record.payment_ref.is_none());
        assert_eq!(record.amount, dec!(0.75));
        assert_eq!(record.created_at, record.updated_at);
    }
}
