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

//! # Refward
//!
//! ## Purpose
//! Referral reward engine: real-time click fraud scoring, idempotent
//! epoch-bounded reward calculation, and autonomous health-gated batch
//! distribution.
//!
//! This umbrella crate re-exports the domain types at the root and each
//! service crate as a module:
//!
//! - [`fraud`]: click scoring and secondary pattern analysis
//! - [`ledger`]: storage collaborator traits and backends
//! - [`journal`]: the decision audit trail
//! - [`rewards`]: per-epoch reward calculation
//! - [`distribution`]: threshold-gated batch payouts
//! - [`supervisor`]: the autonomous control loop
//! - [`node`]: composition root and standalone binary
//!
//! ## Quick start
//! ```rust,no_run
//! use refward::node::{NodeBuilder, StorageSpec};
//! use refward::EngineConfig;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let node = NodeBuilder::new(EngineConfig::default())
//!     .storage(StorageSpec::Memory)
//!     .build()
//!     .await?;
//! node.supervisor.start().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use refward_core::*;

pub use refward_distribution as distribution;
pub use refward_fraud as fraud;
pub use refward_journal as journal;
pub use refward_ledger as ledger;
pub use refward_node as node;
pub use refward_rewards as rewards;
pub use refward_supervisor as supervisor;
