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

//! Error types for batch distribution.
//!
//! A refused batch (threshold, cooldown, cost ceiling) is NOT an error; it
//! comes back as `DistributionOutcome::Refused`. Errors here are the cases
//! where the orchestrator could not complete its protocol at all.

use crate::payment::PaymentError;
use refward_journal::JournalError;
use refward_ledger::LedgerError;
use thiserror::Error;

/// Result type for distribution operations.
pub type DistributionResult<T> = Result<T, DistributionError>;

/// Errors that can occur while evaluating or executing a batch.
#[derive(Debug, Error)]
pub enum DistributionError {
    /// Another execution holds the batch mutex right now.
    #[error("A batch execution is already in progress")]
    AlreadyProcessing,

    /// The payment collaborator rejected or failed the batch.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// A reward store or registry operation failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The decision journal could not record an audit entry.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),
}
