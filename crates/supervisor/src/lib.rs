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

//! # Refward Supervisor
//!
//! ## Purpose
//! The autonomous control loop over the whole engine. A started
//! [`Supervisor`] runs three tickers:
//!
//! - **health** (`health_check_interval`): probe every component, keep the
//!   latest [`HealthSnapshot`], and journal a safe-mode entry on each
//!   transition into `Critical`
//! - **evaluation** (`evaluation_interval`): calculate the previous epoch's
//!   rewards, then run one batch cycle on the orchestrator
//! - **scheduled** (`scheduled_batch_interval`): a coarse extra batch cycle
//!   so payouts happen even when the evaluation cadence never catches a
//!   trigger window
//!
//! While the system is `Critical`, both batching tickers skip orchestration;
//! scoring and the decision journal stay live. [`Supervisor::stop`] halts
//! the tickers and waits for in-flight work, so a batch that already went to
//! the payment backend always completes and records its outcome.
//!
//! ## Screening
//! [`Supervisor::screen`] is the supervised ingestion path: base scoring,
//! then the pattern pass, whose verdict may only tighten the assessment
//! before the click is appended.

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use refward_core::{
    ClickEvent, Clock, ComponentStatus, Decision, DecisionCategory, EngineConfig, EpochId,
    HealthSnapshot, HealthStatus,
};
use refward_distribution::{
    CycleOutcome, DistributionError, DistributionOrchestrator, DistributionOutcome,
};
use refward_fraud::{ClickContext, FraudScorer, PatternAnalyzer, HARD_ANOMALY_BAR};
use refward_journal::DecisionJournal;
use refward_rewards::EpochRewardCalculator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

pub mod error;
pub mod health;

pub use error::{SupervisorError, SupervisorResult};
pub use health::{HealthMonitor, WorkerPool};

/// Point-in-time view of the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorStatus {
    /// Whether the tickers are running.
    pub running: bool,
    /// When the current run started, if running.
    pub started_at: Option<DateTime<Utc>>,
    /// Latest health snapshot, once the first health tick has completed.
    pub health: Option<HealthSnapshot>,
}

/// The autonomous supervision loop.
pub struct Supervisor {
    scorer: Arc<FraudScorer>,
    analyzer: Arc<PatternAnalyzer>,
    calculator: Arc<EpochRewardCalculator>,
    orchestrator: Arc<DistributionOrchestrator>,
    journal: Arc<DecisionJournal>,
    monitor: Arc<HealthMonitor>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    running: AtomicBool,
    critical: AtomicBool,
    started_at: RwLock<Option<DateTime<Utc>>>,
    latest_health: RwLock<Option<HealthSnapshot>>,
    shutdown: Notify,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Supervisor {
    /// Wire a supervisor over its collaborators. Nothing runs until
    /// [`Supervisor::start`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scorer: Arc<FraudScorer>,
        analyzer: Arc<PatternAnalyzer>,
        calculator: Arc<EpochRewardCalculator>,
        orchestrator: Arc<DistributionOrchestrator>,
        journal: Arc<DecisionJournal>,
        monitor: Arc<HealthMonitor>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scorer,
            analyzer,
            calculator,
            orchestrator,
            journal,
            monitor,
            config,
            clock,
            running: AtomicBool::new(false),
            critical: AtomicBool::new(false),
            started_at: RwLock::new(None),
            latest_health: RwLock::new(None),
            shutdown: Notify::new(),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Start the supervision tickers. A no-op (returning current status)
    /// when already running.
    pub async fn start(self: &Arc<Self>) -> SupervisorResult<SupervisorStatus> {
        if self.running.load(Ordering::SeqCst) {
            debug!("supervisor already running");
            return Ok(self.status().await);
        }
        let now = self.clock.now();
        self.journal
            .record(
                Decision::new(
                    DecisionCategory::AnomalyResponse,
                    1.0,
                    "supervisor started",
                    now,
                )
                .with_reason(format!(
                    "health every {:?}, evaluation every {:?}, scheduled batch every {:?}",
                    self.config.health_check_interval,
                    self.config.evaluation_interval,
                    self.config.scheduled_batch_interval
                ))
                .with_action("spawn supervision tickers"),
            )
            .await?;

        self.running.store(true, Ordering::SeqCst);
        *self.started_at.write().await = Some(now);
        {
            let mut handles = self.handles.lock().await;
            handles.push(self.spawn_health_ticker());
            handles.push(self.spawn_evaluation_ticker());
            handles.push(self.spawn_scheduled_ticker());
        }
        info!("supervisor started");
        Ok(self.status().await)
    }

    /// Stop the tickers, waiting for any in-flight tick body (including a
    /// batch execution) to finish. A no-op when already stopped.
    pub async fn stop(&self) -> SupervisorResult<SupervisorStatus> {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("supervisor already stopped");
            return Ok(self.status().await);
        }
        self.shutdown.notify_waiters();
        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "supervision task panicked");
            }
        }
        *self.started_at.write().await = None;

        let now = self.clock.now();
        self.journal
            .record(
                Decision::new(
                    DecisionCategory::AnomalyResponse,
                    1.0,
                    "supervisor stopped",
                    now,
                )
                .with_action("tickers halted after in-flight work completed"),
            )
            .await?;
        info!("supervisor stopped");
        Ok(self.status().await)
    }

    /// Current lifecycle state and latest health snapshot.
    pub async fn status(&self) -> SupervisorStatus {
        SupervisorStatus {
            running: self.running.load(Ordering::SeqCst),
            started_at: *self.started_at.read().await,
            health: self.latest_health.read().await.clone(),
        }
    }

    /// Score, pattern-check, and append one click.
    ///
    /// The pattern verdict can only tighten the base assessment: above both
    /// configured gates eligibility is withdrawn, and above the hard anomaly
    /// bar validity goes too. Every override is journaled before the click
    /// is appended.
    pub async fn screen(&self, ctx: &ClickContext) -> SupervisorResult<ClickEvent> {
        let mut event = self.scorer.assess(ctx).await?;
        let verdict = self.analyzer.analyze(&event).await?;

        if verdict.confidence > self.config.pattern_confidence_threshold
            && verdict.anomaly_score > self.config.pattern_anomaly_threshold
        {
            let hard = verdict.anomaly_score > HARD_ANOMALY_BAR;
            let reason = format!(
                "pattern anomaly {:.2} at confidence {:.2}",
                verdict.anomaly_score, verdict.confidence
            );
            if hard {
                event.assessment.invalidate(reason.clone());
            } else {
                event.assessment.withdraw_eligibility(reason.clone());
            }
            metrics::counter!("refward_pattern_overrides_total").increment(1);
            self.journal
                .record(
                    Decision::new(
                        DecisionCategory::FraudDetection,
                        verdict.confidence,
                        "tighten click verdict",
                        event.occurred_at,
                    )
                    .with_reasons(verdict.indicators.iter().cloned())
                    .with_reason(reason)
                    .with_action(if hard {
                        "invalidate click"
                    } else {
                        "withdraw reward eligibility"
                    }),
                )
                .await?;
        }

        self.scorer.append(&event).await?;
        Ok(event)
    }

    fn spawn_health_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let s = Arc::clone(self);
        tokio::spawn(async move {
            let period = s.config.health_check_interval;
            let mut tick = interval_at(Instant::now() + period, period);
            loop {
                let stopped = s.shutdown.notified();
                if !s.running.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    _ = stopped => break,
                    _ = tick.tick() => s.health_tick().await,
                }
            }
            debug!("health ticker stopped");
        })
    }

    fn spawn_evaluation_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let s = Arc::clone(self);
        tokio::spawn(async move {
            let period = s.config.evaluation_interval;
            let mut tick = interval_at(Instant::now() + period, period);
            loop {
                let stopped = s.shutdown.notified();
                if !s.running.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    _ = stopped => break,
                    _ = tick.tick() => s.evaluation_tick().await,
                }
            }
            debug!("evaluation ticker stopped");
        })
    }

    fn spawn_scheduled_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let s = Arc::clone(self);
        tokio::spawn(async move {
            let period = s.config.scheduled_batch_interval;
            let mut tick = interval_at(Instant::now() + period, period);
            loop {
                let stopped = s.shutdown.notified();
                if !s.running.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    _ = stopped => break,
                    _ = tick.tick() => {
                        if s.critical.load(Ordering::SeqCst) {
                            debug!("skipping scheduled batch while critical");
                        } else {
                            s.batch_cycle("scheduled").await;
                        }
                    }
                }
            }
            debug!("scheduled ticker stopped");
        })
    }

    async fn health_tick(&self) {
        let snapshot = self.monitor.check().await;
        let is_critical = snapshot.status == HealthStatus::Critical;
        let was_critical = self.critical.swap(is_critical, Ordering::SeqCst);

        if is_critical && !was_critical {
            warn!("system critical, entering safe mode");
            metrics::counter!("refward_safe_mode_entries_total").increment(1);
            let offline: Vec<String> = snapshot
                .components
                .iter()
                .filter(|c| c.status == ComponentStatus::Offline)
                .map(|c| format!("{}: {}", c.name, c.detail))
                .collect();
            let decision = Decision::new(
                DecisionCategory::AnomalyResponse,
                1.0,
                "enter safe mode",
                snapshot.checked_at,
            )
            .with_reasons(offline)
            .with_action("pause batch distribution")
            .with_action("alert operator");
            if let Err(e) = self.journal.record(decision).await {
                error!(error = %e, "failed to journal safe-mode entry");
            }
        } else if !is_critical && was_critical {
            info!(status = %snapshot.status, "leaving safe mode");
        }

        *self.latest_health.write().await = Some(snapshot);
    }

    async fn evaluation_tick(&self) {
        if self.critical.load(Ordering::SeqCst) {
            debug!("skipping evaluation while critical");
            return;
        }

        let now = self.clock.now();
        let hours = self.config.epoch_duration_hours;
        match EpochId::for_timestamp(now, hours).and_then(|e| e.previous(hours)) {
            Ok(epoch) => match self.calculator.calculate(&epoch).await {
                Ok(calc) if !calc.already_calculated && !calc.rewards.is_empty() => {
                    let decision = Decision::new(
                        DecisionCategory::RewardApproval,
                        1.0,
                        format!("calculated epoch {}", calc.epoch),
                        now,
                    )
                    .with_reason(format!(
                        "{} eligible of {} clicks",
                        calc.stats.eligible_clicks, calc.stats.total_clicks
                    ))
                    .with_action(format!(
                        "stored {} reward records totalling {}",
                        calc.rewards.len(),
                        calc.stats.total_amount
                    ));
                    if let Err(e) = self.journal.record(decision).await {
                        error!(error = %e, "failed to journal epoch calculation");
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "epoch calculation failed"),
            },
            Err(e) => warn!(error = %e, "epoch arithmetic failed"),
        }

        self.batch_cycle("evaluation").await;
    }

    async fn batch_cycle(&self, origin: &str) {
        match self.orchestrator.run_cycle().await {
            Ok(CycleOutcome::Idle(_)) => debug!(origin, "no batch trigger"),
            Ok(CycleOutcome::Acted { outcome, .. }) => match outcome {
                DistributionOutcome::Executed {
                    recipients, amount, ..
                } => info!(origin, recipients, amount = %amount, "batch executed"),
                DistributionOutcome::Refused { reason } => {
                    debug!(origin, reason = %reason, "batch refused")
                }
            },
            Err(DistributionError::AlreadyProcessing) => {
                debug!(origin, "batch already in progress")
            }
            Err(e) => warn!(origin, error = %e, "batch cycle failed"),
        }
    }
}
