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

//! # Refward Core
//!
//! ## Purpose
//! Domain types shared by every Refward crate: click events with their fraud
//! assessment, calendar-aligned epochs, reward records with their lifecycle
//! status, decision audit entries, health snapshots, the engine configuration,
//! and the injectable clock abstraction.
//!
//! ## Architecture Context
//! Refward is a referral reward engine built from small collaborating crates:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ refward-supervisor  (lifecycle, health, periodic ticks)  │
//! │   ├─ refward-fraud         (scoring + pattern analysis)  │
//! │   ├─ refward-rewards       (idempotent epoch rewards)    │
//! │   ├─ refward-distribution  (batch payout orchestration)  │
//! │   └─ refward-journal       (decision audit trail)        │
//! │          all backed by refward-ledger (storage traits)   │
//! └──────────────────────────────────────────────────────────┘
//!                  everything speaks refward-core types
//! ```
//!
//! ## Key Components
//! - [`ClickEvent`] / [`FraudAssessment`]: immutable click records
//! - [`EpochId`]: calendar-aligned aggregation window identifier
//! - [`RewardRecord`] / [`RewardStatus`]: per-(affiliate, epoch) ledger rows
//! - [`BatchDecision`]: ephemeral batch-evaluation result
//! - [`Decision`] / [`DecisionCategory`]: audit trail entries
//! - [`HealthSnapshot`]: latest system health picture
//! - [`EngineConfig`]: single validated configuration struct
//! - [`Clock`]: injectable time source ([`SystemClock`], [`ManualClock`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod click;
pub mod clock;
pub mod config;
pub mod decision;
pub mod epoch;
pub mod health;
pub mod registry;
pub mod reward;

pub use click::{derive_session_id, ClickEvent, ClickStats, FraudAssessment};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use decision::{Decision, DecisionCategory};
pub use epoch::{EpochError, EpochId};
pub use health::{
    ComponentHealth, ComponentStatus, HealthSnapshot, HealthStatus, RollingMetrics,
};
pub use registry::{AffiliateAccount, AffiliateLink};
pub use reward::{BatchDecision, RewardRecord, RewardStatus};
