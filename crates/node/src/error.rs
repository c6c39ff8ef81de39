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

//! Error types for node composition and startup.

use refward_core::ConfigError;
use refward_journal::JournalError;
use refward_ledger::LedgerError;
use refward_supervisor::SupervisorError;
use thiserror::Error;

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Errors that can occur while composing or starting a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// An environment variable held an unparseable value.
    #[error("Invalid value for {var}: {message}")]
    InvalidEnv {
        /// The offending variable name.
        var: String,
        /// What went wrong parsing it.
        message: String,
    },

    /// The assembled configuration failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `REFWARD_STORAGE` named a backend this build does not know.
    #[error("Unsupported storage backend '{0}': expected 'memory' or 'sqlite:<path>'")]
    UnknownBackend(String),

    /// A storage backend failed to open.
    #[error("Storage error: {0}")]
    Ledger(#[from] LedgerError),

    /// The decision store failed to open.
    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    /// The supervisor failed to start or stop.
    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),
}
