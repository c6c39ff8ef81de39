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

//! In-memory ledger backends.
//!
//! ## Purpose
//! RwLock'd implementations for testing and single-process deployments.
//! Reads are point-in-time consistent with prior appends from the same
//! process.
//!
//! ## Limitations
//! - Not persistent (data lost on restart)
//! - Not distributed (single process only)

use crate::{ClickLedger, LedgerError, LedgerResult, LinkRegistry, RewardStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use refward_core::{
    AffiliateAccount, AffiliateLink, ClickEvent, ClickStats, EpochId, RewardRecord, RewardStatus,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

/// In-memory append-only click ledger.
#[derive(Clone, Default)]
pub struct InMemoryClickLedger {
    clicks: Arc<RwLock<Vec<ClickEvent>>>,
}

impl InMemoryClickLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClickLedger for InMemoryClickLedger {
    async fn append(&self, event: &ClickEvent) -> LedgerResult<Uuid> {
        let mut clicks = self.clicks.write().await;
        clicks.push(event.clone());
        Ok(event.id)
    }

    async fn count_by_ip_since(&self, ip: &str, since: DateTime<Utc>) -> LedgerResult<u64> {
        let clicks = self.clicks.read().await;
        Ok(clicks
            .iter()
            .filter(|c| c.ip == ip && c.occurred_at >= since)
            .count() as u64)
    }

    async fn count_by_session_since(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> LedgerResult<u64> {
        let clicks = self.clicks.read().await;
        Ok(clicks
            .iter()
            .filter(|c| c.session_id == session_id && c.occurred_at >= since)
            .count() as u64)
    }

    async fn last_click_at(
        &self,
        link_id: &str,
        ip: &str,
    ) -> LedgerResult<Option<DateTime<Utc>>> {
        let clicks = self.clicks.read().await;
        Ok(clicks
            .iter()
            .filter(|c| c.link_id == link_id && c.ip == ip)
            .map(|c| c.occurred_at)
            .max())
    }

    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<ClickEvent>> {
        let clicks = self.clicks.read().await;
        Ok(clicks
            .iter()
            .filter(|c| c.occurred_at >= start && c.occurred_at < end)
            .cloned()
            .collect())
    }

    async fn eligible_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<ClickEvent>> {
        let clicks = self.clicks.read().await;
        Ok(clicks
            .iter()
            .filter(|c| {
                c.assessment.is_reward_eligible && c.occurred_at >= start && c.occurred_at < end
            })
            .cloned()
            .collect())
    }

    async fn stats_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<ClickStats> {
        let clicks = self.clicks.read().await;
        let mut stats = ClickStats::default();
        let mut score_sum: u64 = 0;
        for click in clicks
            .iter()
            .filter(|c| c.occurred_at >= start && c.occurred_at < end)
        {
            stats.total += 1;
            score_sum += click.assessment.fraud_score as u64;
            if click.assessment.is_valid {
                stats.valid += 1;
            }
            if click.assessment.is_reward_eligible {
                stats.eligible += 1;
            }
        }
        if stats.total > 0 {
            stats.avg_fraud_score = score_sum as f64 / stats.total as f64;
        }
        Ok(stats)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> LedgerResult<u64> {
        let clicks = self.clicks.read().await;
        Ok(clicks.iter().filter(|c| c.occurred_at >= since).count() as u64)
    }
}

/// In-memory affiliate/link registry.
#[derive(Clone, Default)]
pub struct InMemoryLinkRegistry {
    links: Arc<RwLock<HashMap<String, AffiliateLink>>>,
    affiliates: Arc<RwLock<HashMap<String, AffiliateAccount>>>,
}

impl InMemoryLinkRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRegistry for InMemoryLinkRegistry {
    async fn link(&self, link_id: &str) -> LedgerResult<Option<AffiliateLink>> {
        Ok(self.links.read().await.get(link_id).cloned())
    }

    async fn affiliate(&self, affiliate_id: &str) -> LedgerResult<Option<AffiliateAccount>> {
        Ok(self.affiliates.read().await.get(affiliate_id).cloned())
    }

    async fn upsert_link(&self, link: AffiliateLink) -> LedgerResult<()> {
        self.links.write().await.insert(link.id.clone(), link);
        Ok(())
    }

    async fn upsert_affiliate(&self, account: AffiliateAccount) -> LedgerResult<()> {
        self.affiliates
            .write()
            .await
            .insert(account.id.clone(), account);
        Ok(())
    }
}

/// In-memory reward record store.
#[derive(Clone, Default)]
pub struct InMemoryRewardStore {
    records: Arc<RwLock<Vec<RewardRecord>>>,
}

impl InMemoryRewardStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RewardStore for InMemoryRewardStore {
    async fn insert_all(&self, records: &[RewardRecord]) -> LedgerResult<()> {
        let mut stored = self.records.write().await;
        // Single write section: either every row lands or none does.
        let mut seen: HashSet<(String, String)> = stored
            .iter()
            .map(|r| (r.affiliate_id.clone(), r.epoch_id.as_str().to_string()))
            .collect();
        for record in records {
            let key = (
                record.affiliate_id.clone(),
                record.epoch_id.as_str().to_string(),
            );
            if !seen.insert(key) {
                return Err(LedgerError::Duplicate(format!(
                    "reward for affiliate {} in epoch {} already exists",
                    record.affiliate_id, record.epoch_id
                )));
            }
        }
        stored.extend(records.iter().cloned());
        Ok(())
    }

    async fn by_epoch(&self, epoch: &EpochId) -> LedgerResult<Vec<RewardRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| &r.epoch_id == epoch)
            .cloned()
            .collect())
    }

    async fn by_status(&self, status: RewardStatus) -> LedgerResult<Vec<RewardRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn mark_distributed(&self, ids: &[Uuid], payment_ref: &str) -> LedgerResult<()> {
        let mut records = self.records.write().await;
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let now = Utc::now();
        for record in records.iter_mut().filter(|r| wanted.contains(&r.id)) {
            record.status = RewardStatus::Distributed;
            record.payment_ref = Some(payment_ref.to_string());
            record.updated_at = now;
        }
        Ok(())
    }

    async fn mark_failed(&self, ids: &[Uuid], reason: &str) -> LedgerResult<()> {
        let mut records = self.records.write().await;
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let now = Utc::now();
        for record in records.iter_mut().filter(|r| wanted.contains(&r.id)) {
            warn!(record_id = %record.id, reason, "marking reward record failed");
            record.status = RewardStatus::Failed;
            record.updated_at = now;
        }
        Ok(())
    }

    async fn pending_total(&self) -> LedgerResult<(Decimal, usize)> {
        let records = self.records.read().await;
        let mut total = Decimal::ZERO;
        let mut affiliates = HashSet::new();
        for record in records
            .iter()
            .filter(|r| r.status == RewardStatus::Calculated)
        {
            total += record.amount;
            affiliates.insert(record.affiliate_id.as_str());
        }
        Ok((total, affiliates.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refward_core::{derive_session_id, FraudAssessment};
    use rust_decimal_macros::dec;

    fn click(ip: &str, link: &str, at: DateTime<Utc>, score: u32) -> ClickEvent {
        ClickEvent {
            id: Uuid::new_v4(),
            link_id: link.to_string(),
            affiliate_id: Some("aff-1".to_string()),
            ip: ip.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            referrer: None,
            country: None,
            city: None,
            session_id: derive_session_id(ip, "Mozilla/5.0", at),
            occurred_at: at,
            assessment: FraudAssessment::from_score(score, vec![], 70, 30),
        }
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2025, 1, 15, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn window_counts_respect_since() {
        let ledger = InMemoryClickLedger::new();
        ledger.append(&click("1.2.3.4", "l1", ts(10, 0), 0)).await.unwrap();
        ledger.append(&click("1.2.3.4", "l1", ts(11, 30), 0)).await.unwrap();
        ledger.append(&click("5.6.7.8", "l1", ts(11, 45), 0)).await.unwrap();

        let count = ledger
            .count_by_ip_since("1.2.3.4", ts(11, 0))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(ledger.count_since(ts(11, 0)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn last_click_is_per_link_and_ip() {
        let ledger = InMemoryClickLedger::new();
        ledger.append(&click("1.2.3.4", "l1", ts(10, 0), 0)).await.unwrap();
        ledger.append(&click("1.2.3.4", "l1", ts(10, 5), 0)).await.unwrap();
        ledger.append(&click("1.2.3.4", "l2", ts(10, 9), 0)).await.unwrap();

        let last = ledger.last_click_at("l1", "1.2.3.4").await.unwrap();
        assert_eq!(last, Some(ts(10, 5)));
        assert_eq!(ledger.last_click_at("l3", "1.2.3.4").await.unwrap(), None);
    }

    #[tokio::test]
    async fn range_queries_are_half_open() {
        let ledger = InMemoryClickLedger::new();
        ledger.append(&click("1.2.3.4", "l1", ts(10, 0), 10)).await.unwrap();
        ledger.append(&click("1.2.3.4", "l1", ts(12, 0), 10)).await.unwrap();

        let in_range = ledger.in_range(ts(10, 0), ts(12, 0)).await.unwrap();
        assert_eq!(in_range.len(), 1, "end bound must be exclusive");
    }

    #[tokio::test]
    async fn stats_aggregate_verdicts_and_scores() {
        let ledger = InMemoryClickLedger::new();
        ledger.append(&click("1.2.3.4", "l1", ts(10, 0), 10)).await.unwrap(); // eligible
        ledger.append(&click("1.2.3.4", "l1", ts(10, 1), 40)).await.unwrap(); // valid only
        ledger.append(&click("1.2.3.4", "l1", ts(10, 2), 100)).await.unwrap(); // invalid

        let stats = ledger.stats_in_range(ts(10, 0), ts(11, 0)).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid, 2);
        assert_eq!(stats.eligible, 1);
        assert_eq!(stats.avg_fraud_score, 50.0);

        let eligible = ledger
            .eligible_in_range(ts(10, 0), ts(11, 0))
            .await
            .unwrap();
        assert_eq!(eligible.len(), 1);
    }

    #[tokio::test]
    async fn reward_insert_is_all_or_nothing() {
        let store = InMemoryRewardStore::new();
        let epoch = EpochId::parse("2025-01-15").unwrap();
        let now = ts(0, 0);

        let first = RewardRecord::calculated("a1", epoch.clone(), 3, 3, 3, dec!(0.75), now);
        store.insert_all(std::slice::from_ref(&first)).await.unwrap();

        // Second batch includes a duplicate (a1, epoch): nothing may land.
        let dup = RewardRecord::calculated("a1", epoch.clone(), 1, 1, 1, dec!(0.25), now);
        let fresh = RewardRecord::calculated("a2", epoch.clone(), 2, 2, 2, dec!(0.50), now);
        let result = store.insert_all(&[fresh, dup]).await;
        assert!(matches!(result, Err(LedgerError::Duplicate(_))));

        let rows = store.by_epoch(&epoch).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].affiliate_id, "a1");
    }

    #[tokio::test]
    async fn status_transitions_and_pending_totals() {
        let store = InMemoryRewardStore::new();
        let epoch = EpochId::parse("2025-01-15").unwrap();
        let now = ts(0, 0);
        let r1 = RewardRecord::calculated("a1", epoch.clone(), 3, 3, 3, dec!(0.75), now);
        let r2 = RewardRecord::calculated("a2", epoch.clone(), 2, 2, 2, dec!(0.50), now);
        store.insert_all(&[r1.clone(), r2.clone()]).await.unwrap();

        let (total, affiliates) = store.pending_total().await.unwrap();
        assert_eq!(total, dec!(1.25));
        assert_eq!(affiliates, 2);

        store.mark_distributed(&[r1.id], "pay-123").await.unwrap();
        let distributed = store.by_status(RewardStatus::Distributed).await.unwrap();
        assert_eq!(distributed.len(), 1);
        assert_eq!(distributed[0].payment_ref.as_deref(), Some("pay-123"));

        let (total, affiliates) = store.pending_total().await.unwrap();
        assert_eq!(total, dec!(0.50));
        assert_eq!(affiliates, 1);

        store.mark_failed(&[r2.id], "recipient rejected").await.unwrap();
        let (total, affiliates) = store.pending_total().await.unwrap();
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(affiliates, 0);
    }

    #[tokio::test]
    async fn registry_upserts_and_lookups() {
        let registry = InMemoryLinkRegistry::new();
        registry
            .upsert_affiliate(AffiliateAccount {
                id: "a1".into(),
                display_name: "Alice".into(),
                payout_address: "0xabc".into(),
                active: true,
            })
            .await
            .unwrap();
        registry
            .upsert_link(AffiliateLink {
                id: "l1".into(),
                affiliate_id: "a1".into(),
                destination: "https://example.com".into(),
                active: true,
            })
            .await
            .unwrap();

        assert!(registry.link("l1").await.unwrap().is_some());
        assert!(registry.link("l2").await.unwrap().is_none());
        assert_eq!(
            registry.affiliate("a1").await.unwrap().unwrap().payout_address,
            "0xabc"
        );
    }
}
