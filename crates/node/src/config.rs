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

//! Environment-driven configuration loading.
//!
//! ## Purpose
//! Builds an [`EngineConfig`] from defaults overridden by `REFWARD_*`
//! environment variables, then validates it once. Parse failures name the
//! offending variable so a broken deployment fails at startup with a usable
//! message, never mid-run.
//!
//! ## Variables
//! One variable per config field, e.g. `REFWARD_REWARD_PER_CLICK`,
//! `REFWARD_EPOCH_DURATION_HOURS`, `REFWARD_BATCH_MIN_AMOUNT`. Intervals are
//! plain integers: `_SECS` suffixed variables in seconds, `_MS` in
//! milliseconds. Storage backend selection (`REFWARD_STORAGE`) lives in the
//! builder, not here.

use crate::error::{NodeError, NodeResult};
use refward_core::EngineConfig;
use std::str::FromStr;
use std::time::Duration;

/// Load the engine configuration: defaults, env overrides, validation.
pub fn load_config() -> NodeResult<EngineConfig> {
    let mut config = EngineConfig::default();

    parse_env("REFWARD_REWARD_PER_CLICK", &mut config.reward_per_click)?;
    parse_env(
        "REFWARD_EPOCH_DURATION_HOURS",
        &mut config.epoch_duration_hours,
    )?;
    parse_env("REFWARD_IP_HOURLY_LIMIT", &mut config.ip_hourly_limit)?;
    parse_env(
        "REFWARD_SESSION_HOURLY_LIMIT",
        &mut config.session_hourly_limit,
    )?;
    parse_env(
        "REFWARD_MIN_CLICK_INTERVAL_SECS",
        &mut config.min_click_interval_secs,
    )?;
    parse_env("REFWARD_VALIDITY_THRESHOLD", &mut config.validity_threshold)?;
    parse_env(
        "REFWARD_ELIGIBILITY_THRESHOLD",
        &mut config.eligibility_threshold,
    )?;
    parse_env("REFWARD_BATCH_MIN_AMOUNT", &mut config.batch_min_amount)?;
    parse_env(
        "REFWARD_BATCH_MIN_AFFILIATES",
        &mut config.batch_min_affiliates,
    )?;
    parse_env(
        "REFWARD_BATCH_MAX_INTERVAL_HOURS",
        &mut config.batch_max_interval_hours,
    )?;
    parse_env(
        "REFWARD_BATCH_COOLDOWN_HOURS",
        &mut config.batch_cooldown_hours,
    )?;
    parse_env("REFWARD_COST_BASE", &mut config.cost_base)?;
    parse_env("REFWARD_COST_PER_RECIPIENT", &mut config.cost_per_recipient)?;
    parse_env("REFWARD_COST_CEILING", &mut config.cost_ceiling)?;
    parse_secs(
        "REFWARD_HEALTH_CHECK_INTERVAL_SECS",
        &mut config.health_check_interval,
    )?;
    parse_secs(
        "REFWARD_EVALUATION_INTERVAL_SECS",
        &mut config.evaluation_interval,
    )?;
    parse_secs(
        "REFWARD_SCHEDULED_BATCH_INTERVAL_SECS",
        &mut config.scheduled_batch_interval,
    )?;
    parse_env(
        "REFWARD_PATTERN_CONFIDENCE_THRESHOLD",
        &mut config.pattern_confidence_threshold,
    )?;
    parse_env(
        "REFWARD_PATTERN_ANOMALY_THRESHOLD",
        &mut config.pattern_anomaly_threshold,
    )?;
    parse_env(
        "REFWARD_DECISION_RING_CAPACITY",
        &mut config.decision_ring_capacity,
    )?;
    parse_millis(
        "REFWARD_STORAGE_LATENCY_WARN_MS",
        &mut config.storage_latency_warn,
    )?;
    parse_env("REFWARD_MIN_ACTIVE_WORKERS", &mut config.min_active_workers)?;

    Ok(config.validated()?)
}

fn parse_env<T>(var: &str, slot: &mut T) -> NodeResult<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(var) {
        *slot = raw.trim().parse().map_err(|e: T::Err| NodeError::InvalidEnv {
            var: var.to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

fn parse_secs(var: &str, slot: &mut Duration) -> NodeResult<()> {
    let mut secs = slot.as_secs();
    parse_env(var, &mut secs)?;
    *slot = Duration::from_secs(secs);
    Ok(())
}

fn parse_millis(var: &str, slot: &mut Duration) -> NodeResult<()> {
    let mut millis = slot.as_millis() as u64;
    parse_env(var, &mut millis)?;
    *slot = Duration::from_millis(millis);
    Ok(())
}
