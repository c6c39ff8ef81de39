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

//! Component health probing.
//!
//! ## Purpose
//! [`HealthMonitor::check`] probes storage, payment, ingestion, and scoring,
//! gathers the trailing-24h rolling metrics, and aggregates everything into
//! one [`HealthSnapshot`]. A probe failure downgrades its component; it never
//! panics and never aborts the check, so the supervisor always gets a full
//! picture even when half the system is down.

use chrono::Duration;
use refward_core::{
    Clock, ComponentHealth, ComponentStatus, EngineConfig, HealthSnapshot, RollingMetrics,
};
use refward_distribution::PaymentClient;
use refward_fraud::FraudScorer;
use refward_ledger::{ClickLedger, RewardStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Counter of live ingestion workers.
///
/// Workers register on startup and deregister on shutdown; the health
/// monitor only reads the count.
#[derive(Default)]
pub struct WorkerPool {
    active: AtomicUsize,
}

impl WorkerPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one worker.
    pub fn register(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    /// Deregister one worker.
    pub fn deregister(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Currently registered workers.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Probes every component and assembles health snapshots.
pub struct HealthMonitor {
    ledger: Arc<dyn ClickLedger>,
    store: Arc<dyn RewardStore>,
    payment: Arc<dyn PaymentClient>,
    scorer: Arc<FraudScorer>,
    workers: Arc<WorkerPool>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl HealthMonitor {
    /// Wire a monitor over the components it probes.
    pub fn new(
        ledger: Arc<dyn ClickLedger>,
        store: Arc<dyn RewardStore>,
        payment: Arc<dyn PaymentClient>,
        scorer: Arc<FraudScorer>,
        workers: Arc<WorkerPool>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            store,
            payment,
            scorer,
            workers,
            config,
            clock,
        }
    }

    /// Probe all components and aggregate a snapshot.
    pub async fn check(&self) -> HealthSnapshot {
        let now = self.clock.now();
        let day_ago = now - Duration::hours(24);
        let mut components = Vec::with_capacity(4);
        let mut rolling = RollingMetrics::default();

        // Storage: one timed count doubles as the clicks_24h metric.
        let started = Instant::now();
        match self.ledger.count_since(day_ago).await {
            Ok(count) => {
                let latency = started.elapsed();
                rolling.clicks_24h = count;
                let status = if latency > self.config.storage_latency_warn {
                    ComponentStatus::Degraded
                } else {
                    ComponentStatus::Online
                };
                components.push(ComponentHealth {
                    name: "storage".into(),
                    status,
                    detail: format!("{} clicks in 24h, probe {:?}", count, latency),
                    latency: Some(latency),
                });
            }
            Err(e) => {
                warn!(error = %e, "storage health probe failed");
                components.push(ComponentHealth {
                    name: "storage".into(),
                    status: ComponentStatus::Offline,
                    detail: e.to_string(),
                    latency: None,
                });
            }
        }

        match self.payment.health_check().await {
            Ok(()) => components.push(ComponentHealth {
                name: "payment".into(),
                status: ComponentStatus::Online,
                detail: "reachable".into(),
                latency: None,
            }),
            Err(e) => {
                warn!(error = %e, "payment health probe failed");
                components.push(ComponentHealth {
                    name: "payment".into(),
                    status: ComponentStatus::Offline,
                    detail: e.to_string(),
                    latency: None,
                });
            }
        }

        let active = self.workers.active();
        components.push(ComponentHealth {
            name: "ingestion".into(),
            status: if active >= self.config.min_active_workers {
                ComponentStatus::Online
            } else {
                ComponentStatus::Degraded
            },
            detail: format!(
                "{} of {} required workers active",
                active, self.config.min_active_workers
            ),
            latency: None,
        });

        components.push(ComponentHealth {
            name: "scoring".into(),
            status: if self.scorer.ready().await {
                ComponentStatus::Online
            } else {
                ComponentStatus::Offline
            },
            detail: "ledger window probe".into(),
            latency: None,
        });

        match self.ledger.stats_in_range(day_ago, now).await {
            Ok(stats) if stats.total > 0 => {
                rolling.fraud_rate = 1.0 - stats.valid as f64 / stats.total as f64;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "fraud-rate lookup failed"),
        }
        match self.store.pending_total().await {
            Ok((_, affiliates)) => rolling.pending_rewards = affiliates as u64,
            Err(e) => warn!(error = %e, "pending-rewards lookup failed"),
        }

        HealthSnapshot::aggregate(components, rolling, now)
    }
}
