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

//! # Refward Journal
//!
//! ## Purpose
//! The decision audit trail. Every consequential autonomous decision is
//! recorded through [`DecisionJournal::record`], which writes in this order:
//!
//! 1. durable [`DecisionStore`] append — synchronous and authoritative;
//!    errors propagate to the caller
//! 2. capped in-memory ring — evicts the oldest entry at capacity
//! 3. `tokio::sync::broadcast` publish — best-effort; lagging live
//!    subscribers may miss entries
//!
//! The durable write is the delivery contract; the ring and the broadcast
//! channel are conveniences for dashboards and tests.
//!
//! ## Backend Support
//! - **InMemory**: Vec-backed (always available)
//! - **SQLite**: persistent (feature: `sql-backend`)

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use refward_core::{Decision, DecisionCategory};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

pub mod error;
pub mod memory;

#[cfg(feature = "sql-backend")]
pub mod sql;

pub use error::{JournalError, JournalResult};
pub use memory::InMemoryDecisionStore;

#[cfg(feature = "sql-backend")]
pub use sql::SqliteDecisionStore;

/// Durable decision log sink.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append one decision.
    async fn append(&self, decision: &Decision) -> JournalResult<()>;

    /// The most recent `limit` decisions, newest first.
    async fn recent(&self, limit: usize) -> JournalResult<Vec<Decision>>;

    /// Page through decisions of one category, newest first.
    async fn by_category(
        &self,
        category: DecisionCategory,
        offset: usize,
        limit: usize,
    ) -> JournalResult<Vec<Decision>>;

    /// Total number of stored decisions.
    async fn count(&self) -> JournalResult<u64>;
}

/// Decision journal service: durable store + capped ring + live fan-out.
pub struct DecisionJournal {
    store: Arc<dyn DecisionStore>,
    ring: RwLock<VecDeque<Decision>>,
    capacity: usize,
    live: broadcast::Sender<Decision>,
}

impl DecisionJournal {
    /// Create a journal over the given durable store.
    pub fn new(store: Arc<dyn DecisionStore>, ring_capacity: usize) -> Self {
        let (live, _) = broadcast::channel(ring_capacity.max(16));
        Self {
            store,
            ring: RwLock::new(VecDeque::with_capacity(ring_capacity)),
            capacity: ring_capacity,
            live,
        }
    }

    /// Record one decision: durable write first, then ring, then broadcast.
    ///
    /// ## Errors
    /// Fails only when the durable write fails; in that case nothing is
    /// pushed to the ring or to subscribers.
    pub async fn record(&self, decision: Decision) -> JournalResult<()> {
        self.store.append(&decision).await?;

        {
            let mut ring = self.ring.write().await;
            if ring.len() == self.capacity {
                ring.pop_front();
            }
            ring.push_back(decision.clone());
        }

        metrics::counter!("refward_decisions_recorded_total").increment(1);
        debug!(
            category = %decision.category,
            decision = %decision.decision,
            "decision recorded"
        );

        // Best-effort: no receivers (or lagging ones) are fine.
        let _ = self.live.send(decision);
        Ok(())
    }

    /// The most recent `limit` decisions from the in-memory ring, newest
    /// first.
    pub async fn recent(&self, limit: usize) -> Vec<Decision> {
        let ring = self.ring.read().await;
        ring.iter().rev().take(limit).cloned().collect()
    }

    /// Page through the durable store by category, newest first.
    pub async fn by_category(
        &self,
        category: DecisionCategory,
        offset: usize,
        limit: usize,
    ) -> JournalResult<Vec<Decision>> {
        self.store.by_category(category, offset, limit).await
    }

    /// Total decisions in the durable store.
    pub async fn count(&self) -> JournalResult<u64> {
        self.store.count().await
    }

    /// Subscribe to live decisions (best-effort delivery).
    pub fn subscribe(&self) -> broadcast::Receiver<Decision> {
        self.live.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn decision(n: usize) -> Decision {
        Decision::new(
            DecisionCategory::BatchTrigger,
            1.0,
            format!("decision {}", n),
            Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, n as u32 % 60).unwrap(),
        )
    }

    #[tokio::test]
    async fn ring_caps_while_store_keeps_everything() {
        let store = Arc::new(InMemoryDecisionStore::new());
        let journal = DecisionJournal::new(store.clone(), 3);

        for n in 0..5 {
            journal.record(decision(n)).await.unwrap();
        }

        let ring = journal.recent(10).await;
        assert_eq!(ring.len(), 3);
        assert_eq!(ring[0].decision, "decision 4");
        assert_eq!(ring[2].decision, "decision 2");

        assert_eq!(journal.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn by_category_pages_newest_first() {
        let store = Arc::new(InMemoryDecisionStore::new());
        let journal = DecisionJournal::new(store, 10);

        for n in 0..4 {
            journal.record(decision(n)).await.unwrap();
        }
        journal
            .record(Decision::new(
                DecisionCategory::FraudDetection,
                0.9,
                "override",
                Utc.with_ymd_and_hms(2025, 1, 15, 1, 0, 0).unwrap(),
            ))
            .await
            .unwrap();

        let page = journal
            .by_category(DecisionCategory::BatchTrigger, 1, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].decision, "decision 2");
        assert_eq!(page[1].decision, "decision 1");

        let fraud = journal
            .by_category(DecisionCategory::FraudDetection, 0, 10)
            .await
            .unwrap();
        assert_eq!(fraud.len(), 1);
    }

    #[tokio::test]
    async fn live_subscribers_see_new_decisions() {
        let store = Arc::new(InMemoryDecisionStore::new());
        let journal = DecisionJournal::new(store, 10);

        let mut rx = journal.subscribe();
        journal.record(decision(1)).await.unwrap();

        let seen = rx.recv().await.unwrap();
        assert_eq!(seen.decision, "decision 1");
    }
}
