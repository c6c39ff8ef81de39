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

//! Node composition.
//!
//! ## Purpose
//! [`NodeBuilder`] is the one composition root: it validates the config,
//! opens the chosen storage backend, wires every service behind shared
//! `Arc`s, and hands back a [`Node`]. No service reaches for globals; all
//! collaborators arrive through constructors.

use crate::error::{NodeError, NodeResult};
use refward_core::{Clock, EngineConfig, SystemClock};
use refward_distribution::{DistributionOrchestrator, MockPaymentClient, PaymentClient};
use refward_fraud::{FraudScorer, PatternAnalyzer};
use refward_journal::{DecisionJournal, DecisionStore, InMemoryDecisionStore};
use refward_ledger::{
    ClickLedger, InMemoryClickLedger, InMemoryLinkRegistry, InMemoryRewardStore, LinkRegistry,
    RewardStore,
};
use refward_rewards::EpochRewardCalculator;
use refward_supervisor::{HealthMonitor, Supervisor, WorkerPool};
use std::sync::Arc;
use tracing::info;

/// Which click/reward/decision backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSpec {
    /// RwLock'd in-process maps; state dies with the process.
    Memory,
    /// SQLite file at the given path (feature: `sql-backend`).
    #[cfg(feature = "sql-backend")]
    Sqlite(String),
}

impl StorageSpec {
    /// Read `REFWARD_STORAGE` (`memory` when unset).
    pub fn from_env() -> NodeResult<Self> {
        let raw = std::env::var("REFWARD_STORAGE").unwrap_or_else(|_| "memory".to_string());
        Self::parse(&raw)
    }

    /// Parse a backend spec: `memory` or `sqlite:<path>`.
    pub fn parse(raw: &str) -> NodeResult<Self> {
        if raw == "memory" {
            return Ok(Self::Memory);
        }
        if let Some(path) = raw.strip_prefix("sqlite:") {
            #[cfg(feature = "sql-backend")]
            {
                return Ok(Self::Sqlite(path.to_string()));
            }
            #[cfg(not(feature = "sql-backend"))]
            {
                let _ = path;
                return Err(NodeError::UnknownBackend(format!(
                    "{} (built without the sql-backend feature)",
                    raw
                )));
            }
        }
        Err(NodeError::UnknownBackend(raw.to_string()))
    }
}

/// A fully wired engine instance.
pub struct Node {
    /// The autonomous control loop.
    pub supervisor: Arc<Supervisor>,
    /// The real-time scoring pipeline.
    pub scorer: Arc<FraudScorer>,
    /// Epoch reward calculation (manual backfills go through here).
    pub calculator: Arc<EpochRewardCalculator>,
    /// Batch payout orchestration.
    pub orchestrator: Arc<DistributionOrchestrator>,
    /// The decision audit trail.
    pub journal: Arc<DecisionJournal>,
    /// Affiliate and link registry (seeding, admin).
    pub registry: Arc<dyn LinkRegistry>,
    /// Ingestion worker pool handle.
    pub workers: Arc<WorkerPool>,
}

/// Builds a [`Node`] from config, storage choice, and a payment client.
pub struct NodeBuilder {
    config: EngineConfig,
    storage: StorageSpec,
    payment: Arc<dyn PaymentClient>,
    clock: Arc<dyn Clock>,
}

impl NodeBuilder {
    /// Start from a config with in-memory storage and the mock payment
    /// client. Production deployments swap in a real [`PaymentClient`].
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            storage: StorageSpec::Memory,
            payment: Arc::new(MockPaymentClient::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Choose the storage backend.
    pub fn storage(mut self, storage: StorageSpec) -> Self {
        self.storage = storage;
        self
    }

    /// Use this payment client instead of the mock.
    pub fn payment(mut self, payment: Arc<dyn PaymentClient>) -> Self {
        self.payment = payment;
        self
    }

    /// Override the clock (tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, open storage, and wire everything.
    pub async fn build(self) -> NodeResult<Node> {
        let config = Arc::new(self.config.validated()?);
        let clock = self.clock;

        let ledger: Arc<dyn ClickLedger>;
        let reward_store: Arc<dyn RewardStore>;
        let decision_store: Arc<dyn DecisionStore>;
        match &self.storage {
            StorageSpec::Memory => {
                info!("opening in-memory storage");
                ledger = Arc::new(InMemoryClickLedger::new());
                reward_store = Arc::new(InMemoryRewardStore::new());
                decision_store = Arc::new(InMemoryDecisionStore::new());
            }
            #[cfg(feature = "sql-backend")]
            StorageSpec::Sqlite(path) => {
                info!(path = %path, "opening sqlite storage");
                ledger = Arc::new(refward_ledger::SqliteClickLedger::new(path).await?);
                reward_store = Arc::new(refward_ledger::SqliteRewardStore::new(path).await?);
                decision_store = Arc::new(refward_journal::SqliteDecisionStore::new(path).await?);
            }
        }
        // Affiliate/link CRUD stays in memory on every backend; it is seeded
        // by the operator at startup.
        let registry: Arc<dyn LinkRegistry> = Arc::new(InMemoryLinkRegistry::new());

        let journal = Arc::new(DecisionJournal::new(
            decision_store,
            config.decision_ring_capacity,
        ));
        let scorer = Arc::new(FraudScorer::new(
            ledger.clone(),
            registry.clone(),
            config.clone(),
            clock.clone(),
        ));
        let analyzer = Arc::new(PatternAnalyzer::new(
            ledger.clone(),
            config.clone(),
            clock.clone(),
        ));
        let calculator = Arc::new(EpochRewardCalculator::new(
            ledger.clone(),
            reward_store.clone(),
            config.clone(),
            clock.clone(),
        ));
        let orchestrator = Arc::new(DistributionOrchestrator::new(
            reward_store.clone(),
            registry.clone(),
            self.payment.clone(),
            journal.clone(),
            config.clone(),
            clock.clone(),
        ));

        let workers = Arc::new(WorkerPool::new());
        // The binary's ingestion loop is the one worker on a standalone node.
        workers.register();

        let monitor = Arc::new(HealthMonitor::new(
            ledger,
            reward_store,
            self.payment,
            scorer.clone(),
            workers.clone(),
            config.clone(),
            clock.clone(),
        ));
        let supervisor = Arc::new(Supervisor::new(
            scorer.clone(),
            analyzer,
            calculator.clone(),
            orchestrator.clone(),
            journal.clone(),
            monitor,
            config,
            clock,
        ));

        Ok(Node {
            supervisor,
            scorer,
            calculator,
            orchestrator,
            journal,
            registry,
            workers,
        })
    }
}
