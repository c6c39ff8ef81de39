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

//! # Refward Ledger
//!
//! ## Purpose
//! Storage collaborator traits for the reward engine, plus their backends:
//!
//! - [`ClickLedger`]: append-only click record store with the windowed count
//!   queries the fraud scorer needs and the range queries the epoch
//!   calculator needs
//! - [`LinkRegistry`]: affiliate and link lookups for referential-integrity
//!   checks and payout addresses
//! - [`RewardStore`]: per-(affiliate, epoch) reward rows with all-or-nothing
//!   insertion and status transitions
//!
//! ## Consistency
//! All reads are point-in-time consistent with prior appends from the same
//! process. Cross-process consistency is delegated to the underlying store.
//!
//! ## Backend Support
//! - **InMemory**: RwLock'd maps (always available)
//! - **SQLite**: persistent, single-node (feature: `sql-backend`)
//!
//! ## Testing
//! ```bash
//! # Run tests (in-memory backend)
//! cargo test -p refward-ledger
//!
//! # Test with the SQL backend
//! cargo test -p refward-ledger --features sql-backend
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use refward_core::{
    AffiliateAccount, AffiliateLink, ClickEvent, ClickStats, EpochId, RewardRecord, RewardStatus,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub mod error;
pub mod memory;

#[cfg(feature = "sql-backend")]
pub mod sql;

pub use error::{LedgerError, LedgerResult};
pub use memory::{InMemoryClickLedger, InMemoryLinkRegistry, InMemoryRewardStore};

#[cfg(feature = "sql-backend")]
pub use sql::{SqliteClickLedger, SqliteRewardStore};

/// Append-only click record store.
///
/// Clicks are written exactly once, with their fraud assessment embedded,
/// and never mutated. Window queries are the scorer's fast path and must be
/// bounded operations.
#[async_trait]
pub trait ClickLedger: Send + Sync {
    /// Append one click with its assessment. Returns the click id.
    async fn append(&self, event: &ClickEvent) -> LedgerResult<Uuid>;

    /// Count clicks from this IP since `since` (inclusive).
    async fn count_by_ip_since(&self, ip: &str, since: DateTime<Utc>) -> LedgerResult<u64>;

    /// Count clicks from this session since `since` (inclusive).
    async fn count_by_session_since(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> LedgerResult<u64>;

    /// Timestamp of the most recent click on this (link, IP) pair, if any.
    async fn last_click_at(&self, link_id: &str, ip: &str)
        -> LedgerResult<Option<DateTime<Utc>>>;

    /// All clicks in `[start, end)`, regardless of verdict.
    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<ClickEvent>>;

    /// Reward-eligible clicks in `[start, end)`.
    async fn eligible_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<ClickEvent>>;

    /// Aggregate statistics over `[start, end)`.
    async fn stats_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<ClickStats>;

    /// Count all clicks since `since` (health metric fast path).
    async fn count_since(&self, since: DateTime<Utc>) -> LedgerResult<u64>;
}

/// Affiliate and link lookups.
///
/// Treated as a simple CRUD collaborator: point lookups by key plus upserts
/// for the composition root and tests.
#[async_trait]
pub trait LinkRegistry: Send + Sync {
    /// Look up a link by id.
    async fn link(&self, link_id: &str) -> LedgerResult<Option<AffiliateLink>>;

    /// Look up an affiliate account by id.
    async fn affiliate(&self, affiliate_id: &str) -> LedgerResult<Option<AffiliateAccount>>;

    /// Insert or replace a link.
    async fn upsert_link(&self, link: AffiliateLink) -> LedgerResult<()>;

    /// Insert or replace an affiliate account.
    async fn upsert_affiliate(&self, account: AffiliateAccount) -> LedgerResult<()>;
}

/// Reward record store.
#[async_trait]
pub trait RewardStore: Send + Sync {
    /// Insert every record or none of them (one epoch is one atomic unit).
    ///
    /// ## Errors
    /// [`LedgerError::Duplicate`] if any (affiliate, epoch) pair already has
    /// a row; nothing is persisted in that case.
    async fn insert_all(&self, records: &[RewardRecord]) -> LedgerResult<()>;

    /// All records for one epoch.
    async fn by_epoch(&self, epoch: &EpochId) -> LedgerResult<Vec<RewardRecord>>;

    /// All records in one status.
    async fn by_status(&self, status: RewardStatus) -> LedgerResult<Vec<RewardRecord>>;

    /// Transition records to `Distributed`, recording the payment reference.
    async fn mark_distributed(&self, ids: &[Uuid], payment_ref: &str) -> LedgerResult<()>;

    /// Transition records to `Failed`.
    async fn mark_failed(&self, ids: &[Uuid], reason: &str) -> LedgerResult<()>;

    /// Sum of `Calculated` amounts and the distinct affiliates behind them.
    async fn pending_total(&self) -> LedgerResult<(Decimal, usize)>;
}
