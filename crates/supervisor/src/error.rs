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

//! Error types for the supervision loop.

use refward_distribution::DistributionError;
use refward_fraud::FraudError;
use refward_journal::JournalError;
use refward_ledger::LedgerError;
use refward_rewards::RewardError;
use thiserror::Error;

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Errors surfaced by the supervisor's synchronous entry points.
///
/// The background tickers never return these; failures inside a tick are
/// logged and the loop keeps going.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Click screening failed.
    #[error("Fraud error: {0}")]
    Fraud(#[from] FraudError),

    /// Epoch calculation failed.
    #[error("Reward error: {0}")]
    Reward(#[from] RewardError),

    /// Batch orchestration failed.
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    /// A decision could not be journaled.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// A storage collaborator failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
