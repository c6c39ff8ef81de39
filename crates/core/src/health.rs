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

//! Health snapshot types.
//!
//! ## Purpose
//! The supervisor recomputes a [`HealthSnapshot`] on every health tick and
//! keeps only the latest one live. Overall status aggregation: any component
//! `Offline` makes the system `Critical`; otherwise any `Degraded` makes it
//! `Warning`; otherwise it is `Healthy`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Overall system health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// All components online.
    Healthy,
    /// At least one component degraded, none offline.
    Warning,
    /// At least one component unreachable.
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Status of one probed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Responsive within the latency budget.
    Online,
    /// Responsive but slow, or partially available.
    Degraded,
    /// Probe failed.
    Offline,
}

/// Result of probing one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name: `storage`, `payment`, `ingestion`, `scoring`.
    pub name: String,
    /// Probe verdict.
    pub status: ComponentStatus,
    /// Human-readable probe detail.
    pub detail: String,
    /// Probe round-trip time, when measured.
    pub latency: Option<Duration>,
}

/// Rolling operational metrics attached to each snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RollingMetrics {
    /// Clicks appended in the trailing 24 hours.
    pub clicks_24h: u64,
    /// `1 − valid/total` over the trailing 24 hours (0 when no clicks).
    pub fraud_rate: f64,
    /// Distinct affiliates with rewards awaiting distribution.
    pub pending_rewards: u64,
}

/// Point-in-time health picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Aggregated status.
    pub status: HealthStatus,
    /// Per-component probe results.
    pub components: Vec<ComponentHealth>,
    /// Rolling metrics collected alongside the probes.
    pub metrics: RollingMetrics,
    /// When the snapshot was taken.
    pub checked_at: DateTime<Utc>,
}

impl HealthSnapshot {
    /// Aggregate component statuses per the documented precedence.
    pub fn aggregate(
        components: Vec<ComponentHealth>,
        metrics: RollingMetrics,
        checked_at: DateTime<Utc>,
    ) -> Self {
        let status = if components
            .iter()
            .any(|c| c.status == ComponentStatus::Offline)
        {
            HealthStatus::Critical
        } else if components
            .iter()
            .any(|c| c.status == ComponentStatus::Degraded)
        {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };
        Self {
            status,
            components,
            metrics,
            checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn component(name: &str, status: ComponentStatus) -> ComponentHealth {
        ComponentHealth {
            name: name.to_string(),
            status,
            detail: String::new(),
            latency: None,
        }
    }

    #[test]
    fn offline_dominates_degraded() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let snapshot = HealthSnapshot::aggregate(
            vec![
                component("storage", ComponentStatus::Degraded),
                component("payment", ComponentStatus::Offline),
            ],
            RollingMetrics::default(),
            now,
        );
        assert_eq!(snapshot.status, HealthStatus::Critical);
    }

    #[test]
    fn degraded_yields_warning() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let snapshot = HealthSnapshot::aggregate(
            vec![
                component("storage", ComponentStatus::Online),
                component("ingestion", ComponentStatus::Degraded),
            ],
            RollingMetrics::default(),
            now,
        );
        assert_eq!(snapshot.status, HealthStatus::Warning);
    }

    #[test]
    fn all_online_is_healthy() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let snapshot = HealthSnapshot::aggregate(
            vec![component("storage", ComponentStatus::Online)],
            RollingMetrics::default(),
            now,
        );
        assert_eq!(snapshot.status, HealthStatus::Healthy);
    }
}
