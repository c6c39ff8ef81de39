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

//! End-to-end pipeline tests over a fully wired node: click ingestion
//! through fraud scoring, epoch calculation, and batch payout.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use refward::distribution::{DistributionOutcome, MockPaymentClient};
use refward::fraud::ClickContext;
use refward::ledger::LinkRegistry;
use refward::node::{Node, NodeBuilder};
use refward::supervisor::SupervisorStatus;
use refward::{
    AffiliateAccount, AffiliateLink, DecisionCategory, EngineConfig, EpochId, ManualClock,
    RewardStatus,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

async fn seed_registry(node: &Node) {
    node.registry
        .upsert_affiliate(AffiliateAccount {
            id: "a1".into(),
            display_name: "Alice".into(),
            payout_address: "0xa1".into(),
            active: true,
        })
        .await
        .unwrap();
    node.registry
        .upsert_link(AffiliateLink {
            id: "l1".into(),
            affiliate_id: "a1".into(),
            destination: "https://shop.example".into(),
            active: true,
        })
        .await
        .unwrap();
}

fn click(ip: &str, user_agent: &str) -> ClickContext {
    ClickContext {
        link_id: "l1".into(),
        affiliate_id: Some("a1".into()),
        ip: ip.into(),
        user_agent: user_agent.into(),
        referrer: Some("https://blog.example".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn clicks_flow_from_scoring_to_payout() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
    ));
    let payment = Arc::new(MockPaymentClient::new());
    let config = EngineConfig {
        reward_per_click: dec!(0.25),
        ..Default::default()
    };
    let node = NodeBuilder::new(config)
        .payment(payment.clone())
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    seed_registry(&node).await;

    // Three clean clicks from distinct devices, plus one automation click
    // that stays valid but never earns.
    for n in 0..3 {
        clock.advance(ChronoDuration::minutes(1));
        let event = node
            .scorer
            .process(&click(&format!("10.0.0.{}", n), "Mozilla/5.0 (Macintosh)"))
            .await
            .unwrap();
        assert!(event.assessment.is_reward_eligible);
    }
    clock.advance(ChronoDuration::minutes(1));
    let bot = node
        .scorer
        .process(&click("66.6.6.6", "Mozilla/5.0 compatible; Googlebot"))
        .await
        .unwrap();
    assert!(bot.assessment.is_valid);
    assert!(!bot.assessment.is_reward_eligible);

    // Next day: yesterday's epoch is closed and calculable.
    clock.advance(ChronoDuration::hours(20));
    let epoch = EpochId::parse("2025-01-15").unwrap();
    let calc = node.calculator.calculate(&epoch).await.unwrap();
    assert!(!calc.already_calculated);
    assert_eq!(calc.stats.total_clicks, 4);
    assert_eq!(calc.stats.eligible_clicks, 3);
    assert_eq!(calc.rewards.len(), 1);
    assert_eq!(calc.rewards[0].affiliate_id, "a1");
    assert_eq!(calc.rewards[0].amount, dec!(0.75));

    // First-ever batch: the liveness trigger fires on any pending reward.
    let decision = node.orchestrator.evaluate().await.unwrap();
    assert!(decision.triggered);
    let outcome = node.orchestrator.execute(&decision).await.unwrap();
    match outcome {
        DistributionOutcome::Executed {
            recipients, amount, ..
        } => {
            assert_eq!(recipients, 1);
            assert_eq!(amount, dec!(0.75));
        }
        other => panic!("expected executed batch, got {:?}", other),
    }

    let batches = payment.submitted().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].epoch_hint, "2025-01-15");
    assert_eq!(batches[0].items[0].recipient_address, "0xa1");

    // The audit trail saw the batch.
    let triggers = node
        .journal
        .by_category(DecisionCategory::BatchTrigger, 0, 10)
        .await
        .unwrap();
    assert!(triggers.iter().any(|d| d.decision == "execute batch"));
}

#[tokio::test]
async fn distributed_epochs_are_frozen_on_recalculation() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
    ));
    let node = NodeBuilder::new(EngineConfig::default())
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    seed_registry(&node).await;

    node.scorer
        .process(&click("10.0.0.1", "Mozilla/5.0 (Macintosh)"))
        .await
        .unwrap();
    clock.advance(ChronoDuration::hours(20));

    let epoch = EpochId::parse("2025-01-15").unwrap();
    node.calculator.calculate(&epoch).await.unwrap();
    let decision = node.orchestrator.evaluate().await.unwrap();
    node.orchestrator.execute(&decision).await.unwrap();

    // More clicks land late for the already-paid epoch; recalculation must
    // return the stored records, not double-pay.
    clock.set(Utc.with_ymd_and_hms(2025, 1, 15, 23, 0, 0).unwrap());
    node.scorer
        .process(&click("10.0.0.2", "Mozilla/5.0 (Macintosh)"))
        .await
        .unwrap();
    clock.set(Utc.with_ymd_and_hms(2025, 1, 16, 8, 0, 0).unwrap());

    let again = node.calculator.calculate(&epoch).await.unwrap();
    assert!(again.already_calculated);
    assert_eq!(again.rewards.len(), 1);
    assert_eq!(again.rewards[0].amount, dec!(1.0));
    assert_eq!(again.rewards[0].status, RewardStatus::Distributed);
    assert_eq!(node.orchestrator.metrics().await.total_batches, 1);
}

#[tokio::test]
async fn supervisor_pays_out_autonomously() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
    ));
    let payment = Arc::new(MockPaymentClient::new());
    let config = EngineConfig {
        reward_per_click: dec!(0.25),
        health_check_interval: Duration::from_millis(10),
        evaluation_interval: Duration::from_millis(25),
        ..Default::default()
    };
    let node = NodeBuilder::new(config)
        .payment(payment.clone())
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    seed_registry(&node).await;

    for n in 0..3 {
        clock.advance(ChronoDuration::minutes(1));
        node.scorer
            .process(&click(&format!("10.0.0.{}", n), "Mozilla/5.0 (Macintosh)"))
            .await
            .unwrap();
    }
    clock.advance(ChronoDuration::hours(20));

    let SupervisorStatus { running, .. } = node.supervisor.start().await.unwrap();
    assert!(running);
    tokio::time::sleep(Duration::from_millis(150)).await;
    node.supervisor.stop().await.unwrap();

    let metrics = node.orchestrator.metrics().await;
    assert_eq!(metrics.total_batches, 1);
    assert_eq!(metrics.total_amount, dec!(0.75));
    assert_eq!(payment.submitted().await.len(), 1);

    let approvals = node
        .journal
        .by_category(DecisionCategory::RewardApproval, 0, 10)
        .await
        .unwrap();
    assert_eq!(approvals.len(), 1);
}

#[tokio::test]
async fn coordinated_burst_is_tightened_and_journaled() {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
    ));
    let node = NodeBuilder::new(EngineConfig::default())
        .clock(clock.clone())
        .build()
        .await
        .unwrap();
    seed_registry(&node).await;

    // One device hammering the link without referrers. Early clicks pass,
    // the pattern pass catches up as history accumulates.
    let burst = ClickContext {
        referrer: None,
        ..click("9.9.9.9", "Mozilla/5.0 (Macintosh)")
    };
    let mut last = None;
    for _ in 0..10 {
        clock.advance(ChronoDuration::seconds(31));
        last = Some(node.supervisor.screen(&burst).await.unwrap());
    }

    let final_event = last.unwrap();
    assert!(!final_event.assessment.is_valid, "burst tail must be cut off");

    let overrides = node
        .journal
        .by_category(DecisionCategory::FraudDetection, 0, 50)
        .await
        .unwrap();
    assert!(!overrides.is_empty(), "overrides must be journaled");
}
