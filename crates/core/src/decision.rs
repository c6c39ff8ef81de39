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

//! Decision audit entries.
//!
//! ## Purpose
//! Every consequential autonomous decision (a fraud override, a batch
//! trigger, a refusal, a safe-mode entry) is serialized as a [`Decision`]
//! and appended to the decision journal: durable log first, capped in-memory
//! ring second, live subscribers best-effort last.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What kind of decision was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCategory {
    /// Scoring verdicts and pattern-analysis overrides.
    FraudDetection,
    /// Epoch reward calculations.
    RewardApproval,
    /// Batch evaluations, executions, and refusals.
    BatchTrigger,
    /// Health transitions, safe-mode entries, lifecycle events.
    AnomalyResponse,
}

impl DecisionCategory {
    /// Stable string form used by the SQL backend and log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FraudDetection => "fraud_detection",
            Self::RewardApproval => "reward_approval",
            Self::BatchTrigger => "batch_trigger",
            Self::AnomalyResponse => "anomaly_response",
        }
    }
}

impl fmt::Display for DecisionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fraud_detection" => Ok(Self::FraudDetection),
            "reward_approval" => Ok(Self::RewardApproval),
            "batch_trigger" => Ok(Self::BatchTrigger),
            "anomaly_response" => Ok(Self::AnomalyResponse),
            other => Err(format!("unknown decision category '{}'", other)),
        }
    }
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique entry id.
    pub id: Uuid,
    /// Decision category.
    pub category: DecisionCategory,
    /// Confidence in `0.0..=1.0`. Deterministic decisions use 1.0.
    pub confidence: f64,
    /// Short human-readable statement of what was decided.
    pub decision: String,
    /// Supporting reasons, one per line of reasoning.
    pub reasoning: Vec<String>,
    /// Actions taken (or recommended, for advisory entries).
    pub actions: Vec<String>,
    /// When the decision was taken.
    pub recorded_at: DateTime<Utc>,
}

impl Decision {
    /// Create a new decision with empty reasoning and actions.
    pub fn new(
        category: DecisionCategory,
        confidence: f64,
        decision: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            confidence: confidence.clamp(0.0, 1.0),
            decision: decision.into(),
            reasoning: Vec::new(),
            actions: Vec::new(),
            recorded_at,
        }
    }

    /// Append one reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reasoning.push(reason.into());
        self
    }

    /// Append multiple reasons.
    pub fn with_reasons<I, S>(mut self, reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reasoning.extend(reasons.into_iter().map(Into::into));
        self
    }

    /// Append one action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }
}
