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

//! # Refward Fraud
//!
//! ## Purpose
//! Real-time click fraud scoring. The [`FraudScorer`] turns a raw
//! [`ClickContext`] into a scored, appendable click event; the
//! [`PatternAnalyzer`] is the supervisor's secondary anomaly pass, allowed
//! to *tighten* a verdict but never to loosen one.
//!
//! ## Scoring model
//! Additive weighted signals, saturating at 100:
//!
//! | signal | weight |
//! |---|---|
//! | IP velocity over the hourly ceiling | +40 |
//! | session velocity over the hourly ceiling | +30 |
//! | automation user-agent signature | +50 |
//! | (link, IP) inter-click gap below minimum | +35 |
//! | claimed affiliate does not resolve | +25 |
//! | link unknown or inactive | +100 (hard invalidation) |
//!
//! Verdicts: `is_valid = score < 70`, `is_reward_eligible = score < 30`,
//! both gates strict and both thresholds configurable.
//!
//! ## Failure policy
//! Storage errors during window lookups fail CLOSED: the click is scored
//! maximally suspicious and the error is logged, never swallowed and never
//! thrown past the scorer. Absent optional fields degrade signal weight;
//! they never abort scoring.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod pattern;
pub mod scorer;

pub use error::{FraudError, FraudResult};
pub use pattern::{PatternAnalyzer, PatternVerdict, HARD_ANOMALY_BAR};
pub use scorer::{ClickContext, FraudScorer};
