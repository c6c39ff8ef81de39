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

//! In-memory decision store for testing and single-process deployments.

use crate::{DecisionStore, JournalResult};
use async_trait::async_trait;
use refward_core::{Decision, DecisionCategory};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Vec-backed decision store. Entries keep append order.
#[derive(Clone, Default)]
pub struct InMemoryDecisionStore {
    entries: Arc<RwLock<Vec<Decision>>>,
}

impl InMemoryDecisionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DecisionStore for InMemoryDecisionStore {
    async fn append(&self, decision: &Decision) -> JournalResult<()> {
        self.entries.write().await.push(decision.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> JournalResult<Vec<Decision>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn by_category(
        &self,
        category: DecisionCategory,
        offset: usize,
        limit: usize,
    ) -> JournalResult<Vec<Decision>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|d| d.category == category)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> JournalResult<u64> {
        Ok(self.entries.read().await.len() as u64)
    }
}
