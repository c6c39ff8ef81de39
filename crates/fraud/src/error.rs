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

//! Error types for fraud scoring.
//!
//! Window-lookup failures never surface here: scoring fails closed with a
//! maximal-suspicion assessment instead. These errors cover the append path
//! and other genuinely unrecoverable conditions.

use refward_ledger::LedgerError;
use thiserror::Error;

/// Result type for fraud scoring operations.
pub type FraudResult<T> = Result<T, FraudError>;

/// Errors that can occur while processing a click.
#[derive(Debug, Error)]
pub enum FraudError {
    /// Ledger error on the append path
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
