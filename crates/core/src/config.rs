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

//! Engine configuration.
//!
//! ## Purpose
//! One immutable, typed configuration struct for the whole engine, validated
//! once at construction. Components hold it behind an `Arc` and never mutate
//! it; environment-variable loading lives in `refward-node`.
//!
//! ## Defaults
//! | field | default |
//! |---|---|
//! | `reward_per_click` | 1.0 |
//! | `epoch_duration_hours` | 24 |
//! | `ip_hourly_limit` | 10 |
//! | `session_hourly_limit` | 5 |
//! | `min_click_interval_secs` | 30 |
//! | `validity_threshold` / `eligibility_threshold` | 70 / 30 |
//! | `batch_min_amount` / `batch_min_affiliates` | 10 / 5 |
//! | `batch_max_interval_hours` / `batch_cooldown_hours` | 24 / 4 |
//! | `cost_base` / `cost_per_recipient` / `cost_ceiling` | 0.5 / 0.1 / 2.0 |
//! | `health_check_interval` | 30s |
//! | `evaluation_interval` | 5min |
//! | `scheduled_batch_interval` | 6h |
//! | `pattern_confidence_threshold` / `pattern_anomaly_threshold` | 0.8 / 0.7 |
//! | `decision_ring_capacity` | 100 |
//! | `storage_latency_warn` | 250ms |
//! | `min_active_workers` | 1 |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an out-of-range or inconsistent value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Immutable engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tokens paid per reward-eligible click.
    pub reward_per_click: Decimal,
    /// Epoch length in hours; must divide 24 or be a whole number of days.
    pub epoch_duration_hours: u32,
    /// Clicks per IP in the trailing hour before the velocity penalty fires.
    pub ip_hourly_limit: u64,
    /// Clicks per session in the trailing hour before the penalty fires.
    pub session_hourly_limit: u64,
    /// Minimum seconds between clicks on the same (link, IP) pair.
    pub min_click_interval_secs: u64,
    /// Scores below this are valid (strict `<`).
    pub validity_threshold: u8,
    /// Scores below this are reward-eligible (strict `<`).
    pub eligibility_threshold: u8,
    /// Pending-amount batch trigger.
    pub batch_min_amount: Decimal,
    /// Pending-affiliate-count batch trigger.
    pub batch_min_affiliates: usize,
    /// Liveness trigger: hours since last batch with any pending affiliate.
    pub batch_max_interval_hours: u32,
    /// Minimum hours between successful batches.
    pub batch_cooldown_hours: u32,
    /// Fixed batch execution cost.
    pub cost_base: Decimal,
    /// Marginal cost per payout recipient.
    pub cost_per_recipient: Decimal,
    /// Refuse execution when the estimate exceeds this.
    pub cost_ceiling: Decimal,
    /// Supervisor health tick interval.
    pub health_check_interval: Duration,
    /// Supervisor batch-threshold evaluation interval.
    pub evaluation_interval: Duration,
    /// Coarse scheduled batch attempt interval.
    pub scheduled_batch_interval: Duration,
    /// Pattern-analysis confidence gate for verdict overrides.
    pub pattern_confidence_threshold: f64,
    /// Pattern-analysis anomaly-score gate for verdict overrides.
    pub pattern_anomaly_threshold: f64,
    /// Capacity of the in-memory decision ring.
    pub decision_ring_capacity: usize,
    /// Storage probes slower than this are reported as degraded.
    pub storage_latency_warn: Duration,
    /// Minimum live ingestion workers before the probe degrades.
    pub min_active_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reward_per_click: dec!(1.0),
            epoch_duration_hours: 24,
            ip_hourly_limit: 10,
            session_hourly_limit: 5,
            min_click_interval_secs: 30,
            validity_threshold: 70,
            eligibility_threshold: 30,
            batch_min_amount: dec!(10),
            batch_min_affiliates: 5,
            batch_max_interval_hours: 24,
            batch_cooldown_hours: 4,
            cost_base: dec!(0.5),
            cost_per_recipient: dec!(0.1),
            cost_ceiling: dec!(2.0),
            health_check_interval: Duration::from_secs(30),
            evaluation_interval: Duration::from_secs(300),
            scheduled_batch_interval: Duration::from_secs(6 * 3600),
            pattern_confidence_threshold: 0.8,
            pattern_anomaly_threshold: 0.7,
            decision_ring_capacity: 100,
            storage_latency_warn: Duration::from_millis(250),
            min_active_workers: 1,
        }
    }
}

impl EngineConfig {
    /// Validate the configuration, consuming and returning it.
    ///
    /// ## Errors
    /// Returns [`ConfigError::Invalid`] on the first inconsistency found.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.reward_per_click <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "reward_per_click must be positive".into(),
            ));
        }
        let h = self.epoch_duration_hours;
        if h == 0 || (h < 24 && 24 % h != 0) || (h > 24 && h % 24 != 0) {
            return Err(ConfigError::Invalid(format!(
                "epoch_duration_hours {} must divide 24 or be a whole number of days",
                h
            )));
        }
        if self.eligibility_threshold >= self.validity_threshold {
            return Err(ConfigError::Invalid(format!(
                "eligibility_threshold {} must be strictly below validity_threshold {}",
                self.eligibility_threshold, self.validity_threshold
            )));
        }
        if self.validity_threshold > 100 {
            return Err(ConfigError::Invalid(
                "validity_threshold must be at most 100".into(),
            ));
        }
        if self.min_click_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "min_click_interval_secs must be positive".into(),
            ));
        }
        if self.batch_min_affiliates == 0 {
            return Err(ConfigError::Invalid(
                "batch_min_affiliates must be at least 1".into(),
            ));
        }
        if self.batch_max_interval_hours == 0 || self.batch_cooldown_hours == 0 {
            return Err(ConfigError::Invalid(
                "batch interval and cooldown hours must be positive".into(),
            ));
        }
        if self.cost_base < Decimal::ZERO || self.cost_per_recipient < Decimal::ZERO {
            return Err(ConfigError::Invalid("costs must be non-negative".into()));
        }
        if self.cost_ceiling <= Decimal::ZERO {
            return Err(ConfigError::Invalid("cost_ceiling must be positive".into()));
        }
        for (name, interval) in [
            ("health_check_interval", self.health_check_interval),
            ("evaluation_interval", self.evaluation_interval),
            ("scheduled_batch_interval", self.scheduled_batch_interval),
        ] {
            if interval.is_zero() {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        for (name, value) in [
            (
                "pattern_confidence_threshold",
                self.pattern_confidence_threshold,
            ),
            ("pattern_anomaly_threshold", self.pattern_anomaly_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0..=1.0",
                    name
                )));
            }
        }
        if self.decision_ring_capacity == 0 {
            return Err(ConfigError::Invalid(
                "decision_ring_capacity must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}
