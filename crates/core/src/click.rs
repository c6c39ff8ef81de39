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

//! Click events and their fraud assessment.
//!
//! ## Purpose
//! A [`ClickEvent`] is written exactly once by the scoring pipeline with its
//! [`FraudAssessment`] embedded, and never mutated afterwards. Any later
//! tightening of a verdict (pattern analysis) happens on the event *before*
//! it is appended to the ledger.
//!
//! ## Invariant
//! `is_reward_eligible` implies `is_valid`: eligibility is the strictly
//! tighter of the two gates and can never hold for an invalid click. The
//! constructors below enforce this; there is no way to build an assessment
//! that violates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Verdict produced by the fraud scorer for a single click.
///
/// Scores are additive heuristics in `0..=100`; higher means more suspicious.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    /// Score below the validity threshold (strict `<`).
    pub is_valid: bool,
    /// Score below the eligibility threshold (strict `<`) and valid.
    pub is_reward_eligible: bool,
    /// Additive heuristic score, saturating at 100.
    pub fraud_score: u8,
    /// Human-readable reasons for every signal that fired.
    pub reasons: Vec<String>,
}

impl FraudAssessment {
    /// Build an assessment from a raw score and the configured thresholds.
    ///
    /// A score of exactly `validity_threshold` is NOT valid and a score of
    /// exactly `eligibility_threshold` is NOT eligible (both gates are
    /// strict).
    pub fn from_score(
        score: u32,
        reasons: Vec<String>,
        validity_threshold: u8,
        eligibility_threshold: u8,
    ) -> Self {
        let fraud_score = score.min(100) as u8;
        let is_valid = fraud_score < validity_threshold;
        let is_reward_eligible = is_valid && fraud_score < eligibility_threshold;
        Self {
            is_valid,
            is_reward_eligible,
            fraud_score,
            reasons,
        }
    }

    /// Maximal-suspicion assessment used when scoring cannot complete
    /// (storage failure, unresolvable input). Fail closed, never open.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            is_reward_eligible: false,
            fraud_score: 100,
            reasons: vec![reason.into()],
        }
    }

    /// Withdraw reward eligibility, keeping validity. Tighten-only.
    pub fn withdraw_eligibility(&mut self, reason: impl Into<String>) {
        self.is_reward_eligible = false;
        self.reasons.push(reason.into());
    }

    /// Invalidate the click entirely. Tighten-only; also clears eligibility.
    pub fn invalidate(&mut self, reason: impl Into<String>) {
        self.is_valid = false;
        self.is_reward_eligible = false;
        self.reasons.push(reason.into());
    }
}

/// One referral click, immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Unique click id.
    pub id: Uuid,
    /// Affiliate link that was clicked.
    pub link_id: String,
    /// Owning affiliate, when resolvable. Clicks without one never reward.
    pub affiliate_id: Option<String>,
    /// Source IP address, as reported by the edge.
    pub ip: String,
    /// Raw user-agent string.
    pub user_agent: String,
    /// Referrer URL, when present.
    pub referrer: Option<String>,
    /// Geo country code, when known.
    pub country: Option<String>,
    /// Geo city, when known.
    pub city: Option<String>,
    /// Derived session identifier (see [`derive_session_id`]).
    pub session_id: String,
    /// When the click happened.
    pub occurred_at: DateTime<Utc>,
    /// Fraud verdict embedded at write time.
    pub assessment: FraudAssessment,
}

/// Aggregate click statistics over a time range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClickStats {
    /// Every click in range, fraudulent or not.
    pub total: u64,
    /// Clicks with `is_valid = true`.
    pub valid: u64,
    /// Clicks with `is_reward_eligible = true`.
    pub eligible: u64,
    /// Mean fraud score across all clicks in range (0 when empty).
    pub avg_fraud_score: f64,
}

/// Derive a stable session identifier from the click's ambient signals.
///
/// SHA-256 over `ip | user_agent | UTC day`, truncated to 16 hex chars. Two
/// clicks from the same device on the same day share a session; the day
/// component rolls sessions over at UTC midnight so velocity windows cannot
/// follow a device forever.
pub fn derive_session_id(ip: &str, user_agent: &str, at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hasher.update(b"|");
    hasher.update(user_agent.as_bytes());
    hasher.update(b"|");
    hasher.update(at.format("%Y-%m-%d").to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}
