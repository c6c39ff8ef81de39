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

//! # Refward Rewards
//!
//! ## Purpose
//! Epoch-bounded reward calculation. For each epoch, eligible clicks are
//! grouped by resolved affiliate and one [`refward_core::RewardRecord`] per
//! affiliate is persisted exactly once:
//!
//! - **Idempotent**: recomputing an already-calculated epoch returns the
//!   stored records untouched, never duplicates
//! - **Atomic**: any lookup or persistence error aborts the whole epoch;
//!   partial epochs are never observable
//! - **Exact**: `amount = eligible_clicks × reward_per_click` in decimal
//!   arithmetic, no float rounding
//!
//! Clicks whose affiliate never resolved are excluded entirely; a
//! legitimate-but-unlinked click must not produce a reward row.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calculator;
pub mod error;

pub use calculator::{EpochCalculation, EpochRewardCalculator, EpochStats};
pub use error::{RewardError, RewardResult};
