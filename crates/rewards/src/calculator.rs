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

//! The epoch reward calculator.

use crate::error::{RewardError, RewardResult};
use refward_core::{ClickEvent, Clock, EngineConfig, EpochId, RewardRecord};
use refward_ledger::{ClickLedger, RewardStore};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Epoch-level aggregates returned alongside the per-affiliate records.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    /// Every click in the epoch, fraudulent or not.
    pub total_clicks: u64,
    /// Reward-eligible clicks in the epoch.
    pub eligible_clicks: u64,
    /// Sum of all reward amounts.
    pub total_amount: Decimal,
    /// Distinct affiliates that earned a record.
    pub affiliate_count: usize,
}

/// Result of one epoch calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochCalculation {
    /// The calculated epoch.
    pub epoch: EpochId,
    /// Epoch-level aggregates.
    pub stats: EpochStats,
    /// One record per rewarded affiliate.
    pub rewards: Vec<RewardRecord>,
    /// True when stored records were returned instead of recomputing.
    pub already_calculated: bool,
}

/// Calculates and persists per-epoch rewards, exactly once per epoch.
pub struct EpochRewardCalculator {
    ledger: Arc<dyn ClickLedger>,
    store: Arc<dyn RewardStore>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl EpochRewardCalculator {
    /// Create a calculator over the given collaborators.
    pub fn new(
        ledger: Arc<dyn ClickLedger>,
        store: Arc<dyn RewardStore>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            store,
            config,
            clock,
        }
    }

    /// Calculate rewards for one epoch.
    ///
    /// Idempotent: if records already exist for the epoch they are returned
    /// unchanged with `already_calculated = true`. Otherwise the whole epoch
    /// is computed and persisted as one atomic unit; on any error nothing
    /// is committed and the epoch is safe to retry.
    pub async fn calculate(&self, epoch: &EpochId) -> RewardResult<EpochCalculation> {
        let (start, end) = epoch.bounds(self.config.epoch_duration_hours)?;
        let abort = |source| RewardError::Aborted {
            epoch: epoch.as_str().to_string(),
            source,
        };

        let existing = self.store.by_epoch(epoch).await.map_err(abort)?;
        if !existing.is_empty() {
            debug!(epoch = %epoch, records = existing.len(), "epoch already calculated");
            return Ok(EpochCalculation {
                epoch: epoch.clone(),
                stats: stats_from_records(&existing),
                rewards: existing,
                already_calculated: true,
            });
        }

        let clicks = self.ledger.in_range(start, end).await.map_err(abort)?;

        // Group by resolved affiliate; unresolved clicks are dropped, not
        // pooled into an "unknown" group.
        let mut groups: BTreeMap<&str, AffiliateTally> = BTreeMap::new();
        let mut total_clicks = 0u64;
        let mut eligible_clicks = 0u64;
        for click in &clicks {
            total_clicks += 1;
            if click.assessment.is_reward_eligible {
                eligible_clicks += 1;
            }
            if let Some(affiliate) = click.affiliate_id.as_deref() {
                groups.entry(affiliate).or_default().observe(click);
            }
        }

        let now = self.clock.now();
        let mut records = Vec::new();
        let mut total_amount = Decimal::ZERO;
        for (affiliate, tally) in &groups {
            if tally.eligible == 0 {
                continue;
            }
            let amount = Decimal::from(tally.eligible) * self.config.reward_per_click;
            total_amount += amount;
            records.push(RewardRecord::calculated(
                *affiliate,
                epoch.clone(),
                tally.total,
                tally.valid,
                tally.eligible,
                amount,
                now,
            ));
        }

        if !records.is_empty() {
            self.store.insert_all(&records).await.map_err(abort)?;
        }

        metrics::counter!("refward_epochs_calculated_total").increment(1);
        info!(
            epoch = %epoch,
            affiliates = records.len(),
            total = %total_amount,
            "epoch rewards calculated"
        );

        Ok(EpochCalculation {
            epoch: epoch.clone(),
            stats: EpochStats {
                total_clicks,
                eligible_clicks,
                total_amount,
                affiliate_count: records.len(),
            },
            rewards: records,
            already_calculated: false,
        })
    }

    /// Calculate every epoch in the inclusive range `[from, to]`, in order.
    ///
    /// Idempotence makes re-runs and overlaps safe; epochs independently
    /// calculated out of order elsewhere are simply returned as stored.
    pub async fn backfill(
        &self,
        from: &EpochId,
        to: &EpochId,
    ) -> RewardResult<Vec<EpochCalculation>> {
        let hours = self.config.epoch_duration_hours;
        let mut results = Vec::new();
        let mut current = from.clone();
        loop {
            results.push(self.calculate(&current).await?);
            if &current >= to {
                break;
            }
            current = current.next(hours)?;
        }
        Ok(results)
    }
}

#[derive(Default)]
struct AffiliateTally {
    total: u64,
    valid: u64,
    eligible: u64,
}

impl AffiliateTally {
    fn observe(&mut self, click: &ClickEvent) {
        self.total += 1;
        if click.assessment.is_valid {
            self.valid += 1;
        }
        if click.assessment.is_reward_eligible {
            self.eligible += 1;
        }
    }
}

fn stats_from_records(records: &[RewardRecord]) -> EpochStats {
    let mut stats = EpochStats {
        total_clicks: 0,
        eligible_clicks: 0,
        total_amount: Decimal::ZERO,
        affiliate_count: records.len(),
    };
    for record in records {
        stats.total_clicks += record.total_clicks;
        stats.eligible_clicks += record.eligible_clicks;
        stats.total_amount += record.amount;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use refward_core::{derive_session_id, FraudAssessment, ManualClock, RewardStatus};
    use refward_ledger::memory::{InMemoryClickLedger, InMemoryRewardStore};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn ts(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, d, h, 0, 0).unwrap()
    }

    fn click(affiliate: Option<&str>, at: DateTime<Utc>, score: u32) -> ClickEvent {
        ClickEvent {
            id: Uuid::new_v4(),
            link_id: "l1".into(),
            affiliate_id: affiliate.map(String::from),
            ip: "1.2.3.4".into(),
            user_agent: "Mozilla/5.0".into(),
            referrer: None,
            country: None,
            city: None,
            session_id: derive_session_id("1.2.3.4", "Mozilla/5.0", at),
            occurred_at: at,
            assessment: FraudAssessment::from_score(score, vec![], 70, 30),
        }
    }

    async fn calculator() -> (
        EpochRewardCalculator,
        Arc<InMemoryClickLedger>,
        Arc<InMemoryRewardStore>,
    ) {
        let ledger = Arc::new(InMemoryClickLedger::new());
        let store = Arc::new(InMemoryRewardStore::new());
        let config = Arc::new(EngineConfig {
            reward_per_click: dec!(0.25),
            ..Default::default()
        });
        let clock = Arc::new(ManualClock::new(ts(16, 0)));
        let calc = EpochRewardCalculator::new(ledger.clone(), store.clone(), config, clock);
        (calc, ledger, store)
    }

    #[tokio::test]
    async fn rewards_are_eligible_count_times_rate() {
        let (calc, ledger, _) = calculator().await;
        for h in [1, 2, 3] {
            ledger.append(&click(Some("a1"), ts(15, h), 10)).await.unwrap();
        }
        ledger.append(&click(Some("a1"), ts(15, 4), 50)).await.unwrap(); // valid, not eligible
        ledger.append(&click(Some("a2"), ts(15, 5), 0)).await.unwrap();

        let epoch = EpochId::parse("2025-01-15").unwrap();
        let result = calc.calculate(&epoch).await.unwrap();

        assert!(!result.already_calculated);
        assert_eq!(result.rewards.len(), 2);
        let a1 = result.rewards.iter().find(|r| r.affiliate_id == "a1").unwrap();
        assert_eq!(a1.amount, dec!(0.75));
        assert_eq!(a1.eligible_clicks, 3);
        assert_eq!(a1.valid_clicks, 4);
        assert_eq!(a1.total_clicks, 4);
        assert_eq!(a1.status, RewardStatus::Calculated);

        assert_eq!(result.stats.total_clicks, 5);
        assert_eq!(result.stats.eligible_clicks, 4);
        assert_eq!(result.stats.total_amount, dec!(1.00));
        assert_eq!(result.stats.affiliate_count, 2);
    }

    #[tokio::test]
    async fn recalculation_returns_stored_records_without_duplicates() {
        let (calc, ledger, store) = calculator().await;
        for h in [1, 2, 3] {
            ledger.append(&click(Some("a1"), ts(15, h), 0)).await.unwrap();
        }

        let epoch = EpochId::parse("2025-01-15").unwrap();
        let first = calc.calculate(&epoch).await.unwrap();
        let second = calc.calculate(&epoch).await.unwrap();

        assert!(!first.already_calculated);
        assert!(second.already_calculated);
        assert_eq!(first.rewards, second.rewards);
        assert_eq!(store.by_epoch(&epoch).await.unwrap().len(), 1);

        // Even after more clicks arrive, the stored epoch stays frozen.
        ledger.append(&click(Some("a1"), ts(15, 6), 0)).await.unwrap();
        let third = calc.calculate(&epoch).await.unwrap();
        assert_eq!(third.rewards, first.rewards);
    }

    #[tokio::test]
    async fn unresolved_affiliates_never_earn_records() {
        let (calc, ledger, _) = calculator().await;
        ledger.append(&click(None, ts(15, 1), 0)).await.unwrap();
        ledger.append(&click(None, ts(15, 2), 0)).await.unwrap();
        ledger.append(&click(Some("a1"), ts(15, 3), 0)).await.unwrap();

        let epoch = EpochId::parse("2025-01-15").unwrap();
        let result = calc.calculate(&epoch).await.unwrap();

        assert_eq!(result.rewards.len(), 1);
        assert_eq!(result.rewards[0].affiliate_id, "a1");
        assert_eq!(result.stats.total_clicks, 3);
    }

    #[tokio::test]
    async fn clicks_outside_epoch_bounds_are_excluded() {
        let (calc, ledger, _) = calculator().await;
        ledger.append(&click(Some("a1"), ts(14, 23), 0)).await.unwrap();
        ledger.append(&click(Some("a1"), ts(15, 0), 0)).await.unwrap();
        // Midnight of the 16th belongs to the next epoch ([start, end)).
        ledger.append(&click(Some("a1"), ts(16, 0), 0)).await.unwrap();

        let epoch = EpochId::parse("2025-01-15").unwrap();
        let result = calc.calculate(&epoch).await.unwrap();
        assert_eq!(result.rewards[0].eligible_clicks, 1);
    }

    #[tokio::test]
    async fn affiliate_with_no_eligible_clicks_gets_no_record() {
        let (calc, ledger, _) = calculator().await;
        ledger.append(&click(Some("a1"), ts(15, 1), 50)).await.unwrap();
        ledger.append(&click(Some("a1"), ts(15, 2), 95)).await.unwrap();

        let epoch = EpochId::parse("2025-01-15").unwrap();
        let result = calc.calculate(&epoch).await.unwrap();
        assert!(result.rewards.is_empty());
        assert_eq!(result.stats.total_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn backfill_walks_the_range_in_order() {
        let (calc, ledger, _) = calculator().await;
        ledger.append(&click(Some("a1"), ts(13, 1), 0)).await.unwrap();
        ledger.append(&click(Some("a1"), ts(15, 1), 0)).await.unwrap();

        let from = EpochId::parse("2025-01-13").unwrap();
        let to = EpochId::parse("2025-01-15").unwrap();
        let results = calc.backfill(&from, &to).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].epoch.as_str(), "2025-01-13");
        assert_eq!(results[1].epoch.as_str(), "2025-01-14");
        assert_eq!(results[2].epoch.as_str(), "2025-01-15");
        assert_eq!(results[0].rewards.len(), 1);
        assert!(results[1].rewards.is_empty());
        assert_eq!(results[2].rewards.len(), 1);

        // Backfilling again is a no-op thanks to per-epoch idempotence.
        let again = calc.backfill(&from, &to).await.unwrap();
        assert!(again[0].already_calculated);
        assert_eq!(again[0].rewards, results[0].rewards);
        assert_eq!(again[2].rewards, results[2].rewards);
    }
}
