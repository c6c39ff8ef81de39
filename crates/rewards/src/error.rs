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

//! Error types for epoch reward calculation.
//!
//! Every failure carries the originating epoch id: calculations abort
//! atomically, so a reported epoch is always safe to retry.

use refward_core::EpochError;
use thiserror::Error;

/// Result type for reward calculation operations.
pub type RewardResult<T> = Result<T, RewardError>;

/// Errors that can occur during epoch reward calculation.
#[derive(Debug, Error)]
pub enum RewardError {
    /// Epoch id or duration arithmetic failed
    #[error("Epoch error: {0}")]
    Epoch(#[from] EpochError),

    /// A ledger or store operation failed; nothing was persisted
    #[error("Epoch {epoch} aborted: {source}")]
    Aborted {
        /// The epoch whose calculation was abandoned.
        epoch: String,
        /// The underlying storage failure.
        #[source]
        source: refward_ledger::LedgerError,
    },
}
