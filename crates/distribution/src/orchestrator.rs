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

//! Batch payout orchestration.
//!
//! ## Purpose
//! [`DistributionOrchestrator`] turns pending reward records into payout
//! batches under three gates:
//!
//! 1. **Trigger** ([`DistributionOrchestrator::evaluate`]): pending amount,
//!    distinct pending affiliates, or elapsed time since the last successful
//!    batch. First match wins.
//! 2. **Cooldown**: a minimum gap between successful batches, enforced at
//!    execution time.
//! 3. **Cost ceiling**: execution is refused when the cost estimate from the
//!    evaluated decision exceeds the configured ceiling.
//!
//! A gate that does not pass is a refusal, not an error: the records stay
//! `Calculated` and the next cycle re-evaluates them. Only one execution can
//! run at a time; a second caller gets
//! [`DistributionError::AlreadyProcessing`] immediately instead of queueing.

use crate::error::{DistributionError, DistributionResult};
use crate::payment::{PaymentClient, PaymentItem};
use chrono::{DateTime, Duration, Utc};
use refward_core::{
    BatchDecision, Clock, Decision, DecisionCategory, EngineConfig, RewardStatus,
};
use refward_journal::DecisionJournal;
use refward_ledger::{LinkRegistry, RewardStore};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Running totals across the orchestrator's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributionMetrics {
    /// Successful batches executed.
    pub total_batches: u64,
    /// Sum of all distributed amounts.
    pub total_amount: Decimal,
    /// Sum of recipients across all batches.
    pub total_recipients: u64,
    /// Accumulated execution cost (base + per-recipient, per batch).
    pub total_cost: Decimal,
    /// Completion instant of the most recent successful batch.
    pub last_batch_at: Option<DateTime<Utc>>,
}

/// What one `execute` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionOutcome {
    /// The batch went out and the records transitioned.
    Executed {
        /// Backend payment reference now stored on every included record.
        payment_ref: String,
        /// How many recipients were paid.
        recipients: usize,
        /// Total amount distributed.
        amount: Decimal,
    },
    /// A gate declined the batch; nothing changed.
    Refused {
        /// Which gate declined and why.
        reason: String,
    },
}

/// Result of one evaluate-then-maybe-execute cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No trigger fired; nothing was attempted.
    Idle(BatchDecision),
    /// A trigger fired and execution was attempted.
    Acted {
        /// The decision that fired.
        decision: BatchDecision,
        /// What execution did with it.
        outcome: DistributionOutcome,
    },
}

/// Threshold-gated batch payout driver.
pub struct DistributionOrchestrator {
    store: Arc<dyn RewardStore>,
    registry: Arc<dyn LinkRegistry>,
    payment: Arc<dyn PaymentClient>,
    journal: Arc<DecisionJournal>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    executing: Mutex<()>,
    metrics: RwLock<DistributionMetrics>,
}

impl DistributionOrchestrator {
    /// Wire an orchestrator over its collaborators.
    pub fn new(
        store: Arc<dyn RewardStore>,
        registry: Arc<dyn LinkRegistry>,
        payment: Arc<dyn PaymentClient>,
        journal: Arc<DecisionJournal>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            registry,
            payment,
            journal,
            config,
            clock,
            executing: Mutex::new(()),
            metrics: RwLock::new(DistributionMetrics::default()),
        }
    }

    /// Evaluate the batch triggers against current pending state.
    ///
    /// Triggers are checked in order; the first one that fires wins and its
    /// reason is recorded on the decision. With nothing pending the decision
    /// is never triggered.
    pub async fn evaluate(&self) -> DistributionResult<BatchDecision> {
        let (pending_amount, pending_affiliates) = self.store.pending_total().await?;
        let now = self.clock.now();
        let estimated_cost = self.config.cost_base
            + self.config.cost_per_recipient * Decimal::from(pending_affiliates as u64);

        let mut triggered = false;
        let mut reasons = Vec::new();

        if pending_affiliates == 0 {
            reasons.push("no pending rewards".to_string());
        } else if pending_amount >= self.config.batch_min_amount {
            triggered = true;
            reasons.push(format!(
                "pending amount {} meets batch_min_amount {}",
                pending_amount, self.config.batch_min_amount
            ));
        } else if pending_affiliates >= self.config.batch_min_affiliates {
            triggered = true;
            reasons.push(format!(
                "{} pending affiliates meets batch_min_affiliates {}",
                pending_affiliates, self.config.batch_min_affiliates
            ));
        } else {
            let max_interval = Duration::hours(i64::from(self.config.batch_max_interval_hours));
            match self.metrics.read().await.last_batch_at {
                None => {
                    triggered = true;
                    reasons.push(format!(
                        "no batch has run yet and {} affiliates are pending",
                        pending_affiliates
                    ));
                }
                Some(last) if now - last >= max_interval => {
                    triggered = true;
                    reasons.push(format!(
                        "batch_max_interval_hours {} elapsed since last batch with {} affiliates pending",
                        self.config.batch_max_interval_hours, pending_affiliates
                    ));
                }
                Some(_) => {
                    reasons.push(format!(
                        "pending amount {} below {} and {} affiliates below {}",
                        pending_amount,
                        self.config.batch_min_amount,
                        pending_affiliates,
                        self.config.batch_min_affiliates
                    ));
                }
            }
        }

        Ok(BatchDecision {
            triggered,
            reasons,
            pending_affiliates,
            pending_amount,
            estimated_cost,
            evaluated_at: now,
        })
    }

    /// Execute a batch for an evaluated decision.
    ///
    /// ## Errors
    /// [`DistributionError::AlreadyProcessing`] when another execution holds
    /// the mutex; payment and storage failures propagate after the failure is
    /// journaled. Gate declines come back as
    /// [`DistributionOutcome::Refused`], never as errors.
    pub async fn execute(
        &self,
        decision: &BatchDecision,
    ) -> DistributionResult<DistributionOutcome> {
        let _guard = self
            .executing
            .try_lock()
            .map_err(|_| DistributionError::AlreadyProcessing)?;
        let now = self.clock.now();

        if !decision.triggered {
            return self.refuse("no batch trigger fired", now).await;
        }

        let cooldown = Duration::hours(i64::from(self.config.batch_cooldown_hours));
        if let Some(last) = self.metrics.read().await.last_batch_at {
            if now - last < cooldown {
                return self
                    .refuse(
                        &format!(
                            "cooldown: last batch at {} is within batch_cooldown_hours {}",
                            last, self.config.batch_cooldown_hours
                        ),
                        now,
                    )
                    .await;
            }
        }

        if decision.estimated_cost > self.config.cost_ceiling {
            return self
                .refuse(
                    &format!(
                        "estimated cost {} exceeds cost_ceiling {}",
                        decision.estimated_cost, self.config.cost_ceiling
                    ),
                    now,
                )
                .await;
        }

        let pending = self.store.by_status(RewardStatus::Calculated).await?;
        if pending.is_empty() {
            return self.refuse("no pending reward records", now).await;
        }

        // One payout per affiliate, summed across epochs.
        let mut per_affiliate: BTreeMap<&str, (Decimal, Vec<Uuid>)> = BTreeMap::new();
        let mut epoch_ids = Vec::new();
        for record in &pending {
            let entry = per_affiliate
                .entry(record.affiliate_id.as_str())
                .or_default();
            entry.0 += record.amount;
            entry.1.push(record.id);
            let epoch = record.epoch_id.as_str();
            if !epoch_ids.iter().any(|e| e == epoch) {
                epoch_ids.push(epoch.to_string());
            }
        }
        let epoch_hint = epoch_ids.join(",");

        let mut items = Vec::new();
        let mut included_ids = Vec::new();
        for (affiliate_id, (amount, record_ids)) in &per_affiliate {
            match self.registry.affiliate(affiliate_id).await? {
                Some(account) if account.active => {
                    items.push(PaymentItem::new(
                        account.payout_address,
                        *amount,
                        *affiliate_id,
                    ));
                    included_ids.extend_from_slice(record_ids);
                }
                Some(_) => {
                    warn!(affiliate = %affiliate_id, "skipping payout for inactive affiliate");
                }
                None => {
                    warn!(affiliate = %affiliate_id, "skipping payout for unregistered affiliate");
                }
            }
        }
        if items.is_empty() {
            return self.refuse("no payable recipients after resolution", now).await;
        }

        let batch_amount: Decimal = items.iter().map(|i| i.amount).sum();
        match self.payment.submit_batch(&items, &epoch_hint).await {
            Ok(receipt) => {
                self.store
                    .mark_distributed(&included_ids, &receipt.payment_ref)
                    .await?;

                let batch_cost = self.config.cost_base
                    + self.config.cost_per_recipient * Decimal::from(items.len() as u64);
                {
                    let mut m = self.metrics.write().await;
                    m.total_batches += 1;
                    m.total_amount += batch_amount;
                    m.total_recipients += items.len() as u64;
                    m.total_cost += batch_cost;
                    m.last_batch_at = Some(now);
                }
                metrics::counter!("refward_batches_executed_total").increment(1);

                self.journal
                    .record(
                        Decision::new(DecisionCategory::BatchTrigger, 1.0, "execute batch", now)
                            .with_reasons(decision.reasons.iter().cloned())
                            .with_reason(format!("batch cost {}", batch_cost))
                            .with_action(format!(
                                "paid {} recipients {} total, ref {}",
                                items.len(),
                                batch_amount,
                                receipt.payment_ref
                            )),
                    )
                    .await?;
                info!(
                    recipients = items.len(),
                    amount = %batch_amount,
                    payment_ref = %receipt.payment_ref,
                    epochs = %epoch_hint,
                    "batch distributed"
                );

                Ok(DistributionOutcome::Executed {
                    payment_ref: receipt.payment_ref,
                    recipients: items.len(),
                    amount: batch_amount,
                })
            }
            Err(e) => {
                metrics::counter!("refward_batches_failed_total").increment(1);
                self.journal
                    .record(
                        Decision::new(
                            DecisionCategory::BatchTrigger,
                            1.0,
                            "batch execution failed",
                            now,
                        )
                        .with_reason(e.to_string())
                        .with_action("records remain pending for the next cycle"),
                    )
                    .await?;
                warn!(error = %e, recipients = items.len(), "batch payment failed");
                Err(e.into())
            }
        }
    }

    /// Evaluate and, if a trigger fired, execute. The unit the supervisor
    /// schedules.
    pub async fn run_cycle(&self) -> DistributionResult<CycleOutcome> {
        let decision = self.evaluate().await?;
        if !decision.triggered {
            return Ok(CycleOutcome::Idle(decision));
        }
        let outcome = self.execute(&decision).await?;
        Ok(CycleOutcome::Acted { decision, outcome })
    }

    /// Snapshot of the running totals.
    pub async fn metrics(&self) -> DistributionMetrics {
        self.metrics.read().await.clone()
    }

    async fn refuse(
        &self,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DistributionResult<DistributionOutcome> {
        metrics::counter!("refward_batches_refused_total").increment(1);
        self.journal
            .record(
                Decision::new(DecisionCategory::BatchTrigger, 1.0, "refuse batch", now)
                    .with_reason(reason.to_string())
                    .with_action("records remain pending"),
            )
            .await?;
        info!(reason = %reason, "batch refused");
        Ok(DistributionOutcome::Refused {
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{MockPaymentClient, PaymentError};
    use chrono::TimeZone;
    use refward_core::{AffiliateAccount, EpochId, ManualClock, RewardRecord};
    use refward_journal::InMemoryDecisionStore;
    use refward_ledger::{InMemoryLinkRegistry, InMemoryRewardStore};
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;

    struct Harness {
        store: Arc<InMemoryRewardStore>,
        registry: Arc<InMemoryLinkRegistry>,
        payment: Arc<MockPaymentClient>,
        clock: Arc<ManualClock>,
        orchestrator: Arc<DistributionOrchestrator>,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap()
    }

    fn harness(payment: MockPaymentClient) -> Harness {
        let store = Arc::new(InMemoryRewardStore::new());
        let registry = Arc::new(InMemoryLinkRegistry::new());
        let payment = Arc::new(payment);
        let clock = Arc::new(ManualClock::new(start()));
        let journal = Arc::new(DecisionJournal::new(
            Arc::new(InMemoryDecisionStore::new()),
            100,
        ));
        let orchestrator = Arc::new(DistributionOrchestrator::new(
            store.clone(),
            registry.clone(),
            payment.clone(),
            journal,
            Arc::new(EngineConfig::default()),
            clock.clone(),
        ));
        Harness {
            store,
            registry,
            payment,
            clock,
            orchestrator,
        }
    }

    async fn register(registry: &InMemoryLinkRegistry, affiliate_id: &str, active: bool) {
        registry
            .upsert_affiliate(AffiliateAccount {
                id: affiliate_id.to_string(),
                display_name: affiliate_id.to_string(),
                payout_address: format!("addr-{}", affiliate_id),
                active,
            })
            .await
            .unwrap();
    }

    async fn seed(
        store: &InMemoryRewardStore,
        epoch: &str,
        affiliates: &[(&str, Decimal)],
        now: DateTime<Utc>,
    ) {
        let epoch = EpochId::parse(epoch).unwrap();
        let records: Vec<RewardRecord> = affiliates
            .iter()
            .map(|(id, amount)| {
                RewardRecord::calculated(*id, epoch.clone(), 5, 5, 1, *amount, now)
            })
            .collect();
        store.insert_all(&records).await.unwrap();
    }

    #[tokio::test]
    async fn nothing_pending_never_triggers() {
        let h = harness(MockPaymentClient::new());
        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(!decision.triggered);
        assert_eq!(decision.pending_affiliates, 0);

        match h.orchestrator.run_cycle().await.unwrap() {
            CycleOutcome::Idle(d) => assert!(!d.triggered),
            other => panic!("expected idle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn amount_trigger_wins_and_batch_distributes() {
        let h = harness(MockPaymentClient::new());
        register(&h.registry, "aff-1", true).await;
        register(&h.registry, "aff-2", true).await;
        seed(
            &h.store,
            "2025-01-15",
            &[("aff-1", dec!(8)), ("aff-2", dec!(4))],
            h.clock.now(),
        )
        .await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        assert!(decision.reasons[0].contains("batch_min_amount"));
        assert_eq!(decision.pending_amount, dec!(12));
        assert_eq!(decision.estimated_cost, dec!(0.7));

        let outcome = h.orchestrator.execute(&decision).await.unwrap();
        let payment_ref = match outcome {
            DistributionOutcome::Executed {
                payment_ref,
                recipients,
                amount,
            } => {
                assert_eq!(recipients, 2);
                assert_eq!(amount, dec!(12));
                payment_ref
            }
            other => panic!("expected executed, got {:?}", other),
        };

        let distributed = h.store.by_status(RewardStatus::Distributed).await.unwrap();
        assert_eq!(distributed.len(), 2);
        assert!(distributed
            .iter()
            .all(|r| r.payment_ref.as_deref() == Some(payment_ref.as_str())));
        assert_eq!(h.store.pending_total().await.unwrap(), (dec!(0), 0));

        let batches = h.payment.submitted().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].epoch_hint, "2025-01-15");

        let m = h.orchestrator.metrics().await;
        assert_eq!(m.total_batches, 1);
        assert_eq!(m.total_amount, dec!(12));
        assert_eq!(m.total_recipients, 2);
        assert_eq!(m.total_cost, dec!(0.7));
        assert_eq!(m.last_batch_at, Some(start()));
    }

    #[tokio::test]
    async fn affiliate_count_triggers_below_amount_threshold() {
        let h = harness(MockPaymentClient::new());
        let affiliates: Vec<(String, Decimal)> = (0..5)
            .map(|n| (format!("aff-{}", n), dec!(0.5)))
            .collect();
        let refs: Vec<(&str, Decimal)> = affiliates
            .iter()
            .map(|(id, amount)| (id.as_str(), *amount))
            .collect();
        seed(&h.store, "2025-01-15", &refs, h.clock.now()).await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        assert!(decision.reasons[0].contains("batch_min_affiliates"));
        assert_eq!(decision.pending_amount, dec!(2.5));
    }

    #[tokio::test]
    async fn liveness_triggers_when_both_thresholds_are_unmet() {
        let h = harness(MockPaymentClient::new());
        register(&h.registry, "aff-1", true).await;
        seed(&h.store, "2025-01-15", &[("aff-1", dec!(2))], h.clock.now()).await;

        // Never batched: elapsed-interval trigger fires on any pending.
        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        assert!(decision.reasons[0].contains("no batch has run yet"));
        h.orchestrator.execute(&decision).await.unwrap();

        // One hour later with fresh pending: nothing fires.
        h.clock.advance(Duration::hours(1));
        seed(&h.store, "2025-01-16", &[("aff-1", dec!(2))], h.clock.now()).await;
        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(!decision.triggered);

        // Past the max interval it fires again.
        h.clock.advance(Duration::hours(24));
        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        assert!(decision.reasons[0].contains("batch_max_interval_hours"));
    }

    #[tokio::test]
    async fn cooldown_refuses_until_elapsed() {
        let h = harness(MockPaymentClient::new());
        register(&h.registry, "aff-1", true).await;
        seed(&h.store, "2025-01-15", &[("aff-1", dec!(20))], h.clock.now()).await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        h.orchestrator.execute(&decision).await.unwrap();

        h.clock.advance(Duration::hours(1));
        seed(&h.store, "2025-01-16", &[("aff-1", dec!(20))], h.clock.now()).await;
        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        match h.orchestrator.execute(&decision).await.unwrap() {
            DistributionOutcome::Refused { reason } => assert!(reason.contains("cooldown")),
            other => panic!("expected refusal, got {:?}", other),
        }
        assert_eq!(h.orchestrator.metrics().await.total_batches, 1);

        h.clock.advance(Duration::hours(4));
        let decision = h.orchestrator.evaluate().await.unwrap();
        match h.orchestrator.execute(&decision).await.unwrap() {
            DistributionOutcome::Executed { recipients, .. } => assert_eq!(recipients, 1),
            other => panic!("expected executed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cost_ceiling_refuses_triggered_batch() {
        let h = harness(MockPaymentClient::new());
        let affiliates: Vec<(String, Decimal)> =
            (0..16).map(|n| (format!("aff-{}", n), dec!(1))).collect();
        let refs: Vec<(&str, Decimal)> = affiliates
            .iter()
            .map(|(id, amount)| (id.as_str(), *amount))
            .collect();
        seed(&h.store, "2025-01-15", &refs, h.clock.now()).await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        assert_eq!(decision.estimated_cost, dec!(2.1));

        match h.orchestrator.execute(&decision).await.unwrap() {
            DistributionOutcome::Refused { reason } => assert!(reason.contains("cost_ceiling")),
            other => panic!("expected refusal, got {:?}", other),
        }
        assert_eq!(h.store.pending_total().await.unwrap().1, 16);
    }

    #[tokio::test]
    async fn concurrent_execute_is_rejected_not_queued() {
        let h = harness(MockPaymentClient::with_latency(StdDuration::from_millis(
            200,
        )));
        register(&h.registry, "aff-1", true).await;
        seed(&h.store, "2025-01-15", &[("aff-1", dec!(20))], h.clock.now()).await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        let first = {
            let orchestrator = h.orchestrator.clone();
            let decision = decision.clone();
            tokio::spawn(async move { orchestrator.execute(&decision).await })
        };
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        match h.orchestrator.execute(&decision).await {
            Err(DistributionError::AlreadyProcessing) => {}
            other => panic!("expected AlreadyProcessing, got {:?}", other),
        }

        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, DistributionOutcome::Executed { .. }));
        assert_eq!(h.orchestrator.metrics().await.total_batches, 1);
    }

    #[tokio::test]
    async fn payment_failure_leaves_records_pending() {
        let h = harness(MockPaymentClient::new());
        register(&h.registry, "aff-1", true).await;
        seed(&h.store, "2025-01-15", &[("aff-1", dec!(20))], h.clock.now()).await;
        h.payment
            .fail_next(PaymentError::Unavailable("backend down".into()))
            .await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        match h.orchestrator.execute(&decision).await {
            Err(DistributionError::Payment(_)) => {}
            other => panic!("expected payment error, got {:?}", other),
        }

        assert_eq!(h.store.pending_total().await.unwrap(), (dec!(20), 1));
        assert_eq!(h.orchestrator.metrics().await.total_batches, 0);

        // The retry on the next cycle succeeds.
        h.clock.advance(Duration::hours(1));
        match h.orchestrator.run_cycle().await.unwrap() {
            CycleOutcome::Acted { outcome, .. } => {
                assert!(matches!(outcome, DistributionOutcome::Executed { .. }));
            }
            other => panic!("expected acted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unresolvable_affiliates_are_skipped_not_fatal() {
        let h = harness(MockPaymentClient::new());
        register(&h.registry, "aff-known", true).await;
        register(&h.registry, "aff-inactive", false).await;
        seed(
            &h.store,
            "2025-01-15",
            &[
                ("aff-known", dec!(6)),
                ("aff-inactive", dec!(5)),
                ("aff-ghost", dec!(4)),
            ],
            h.clock.now(),
        )
        .await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        match h.orchestrator.execute(&decision).await.unwrap() {
            DistributionOutcome::Executed {
                recipients, amount, ..
            } => {
                assert_eq!(recipients, 1);
                assert_eq!(amount, dec!(6));
            }
            other => panic!("expected executed, got {:?}", other),
        }

        // Skipped records stay pending for a later fix-up.
        assert_eq!(h.store.pending_total().await.unwrap(), (dec!(9), 2));
        let batches = h.payment.submitted().await;
        assert_eq!(batches[0].items.len(), 1);
        assert_eq!(batches[0].items[0].recipient_address, "addr-aff-known");
    }

    #[tokio::test]
    async fn multi_epoch_pending_is_aggregated_per_affiliate() {
        let h = harness(MockPaymentClient::new());
        register(&h.registry, "aff-1", true).await;
        seed(&h.store, "2025-01-14", &[("aff-1", dec!(7))], h.clock.now()).await;
        seed(&h.store, "2025-01-15", &[("aff-1", dec!(5))], h.clock.now()).await;

        let decision = h.orchestrator.evaluate().await.unwrap();
        assert!(decision.triggered);
        match h.orchestrator.execute(&decision).await.unwrap() {
            DistributionOutcome::Executed {
                recipients, amount, ..
            } => {
                assert_eq!(recipients, 1);
                assert_eq!(amount, dec!(12));
            }
            other => panic!("expected executed, got {:?}", other),
        }

        let batches = h.payment.submitted().await;
        assert_eq!(batches[0].epoch_hint, "2025-01-14,2025-01-15");
    }
}
