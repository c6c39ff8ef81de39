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

//! Additive fraud scoring.

use crate::error::FraudResult;
use chrono::Duration;
use refward_core::{derive_session_id, ClickEvent, Clock, EngineConfig, FraudAssessment};
use refward_ledger::{ClickLedger, LinkRegistry};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// User-agent substrings that mark automation, matched case-insensitively.
const UA_DENYLIST: &[&str] = &[
    "bot", "crawler", "spider", "scraper", "headless", "curl", "wget", "python", "phantom",
    "selenium",
];

const WEIGHT_IP_VELOCITY: u32 = 40;
const WEIGHT_SESSION_VELOCITY: u32 = 30;
const WEIGHT_UA_PATTERN: u32 = 50;
const WEIGHT_CLICK_TIMING: u32 = 35;
const WEIGHT_UNKNOWN_AFFILIATE: u32 = 25;
const WEIGHT_BAD_LINK: u32 = 100;

/// Contextual signals of one incoming click, before scoring.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    /// Clicked link id.
    pub link_id: String,
    /// Affiliate id as claimed by the caller, if any. The link's owner wins
    /// over this when both are present.
    pub affiliate_id: Option<String>,
    /// Source IP.
    pub ip: String,
    /// Raw user-agent string.
    pub user_agent: String,
    /// Referrer URL, when present.
    pub referrer: Option<String>,
    /// Geo country, when known.
    pub country: Option<String>,
    /// Geo city, when known.
    pub city: Option<String>,
}

/// Real-time fraud scorer.
///
/// Pure(ish): scoring consults the ledger's trailing windows and the link
/// registry but has no side effects of its own; persistence happens in
/// [`FraudScorer::process`].
pub struct FraudScorer {
    ledger: Arc<dyn ClickLedger>,
    registry: Arc<dyn LinkRegistry>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl FraudScorer {
    /// Create a scorer over the given collaborators.
    pub fn new(
        ledger: Arc<dyn ClickLedger>,
        registry: Arc<dyn LinkRegistry>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            registry,
            config,
            clock,
        }
    }

    /// Score a click and build the (not yet appended) event.
    ///
    /// The resolved affiliate is the link's owner when the link resolves;
    /// the claimed affiliate id is only a fallback for unresolvable links.
    pub async fn assess(&self, ctx: &ClickContext) -> FraudResult<ClickEvent> {
        let now = self.clock.now();
        let mut score: u32 = 0;
        let mut reasons: Vec<String> = Vec::new();
        let mut fail_closed = false;

        // IP velocity over the trailing hour. The incoming click is not in
        // the ledger yet, so a count at the ceiling means this click is the
        // one that exceeds it.
        let hour_ago = now - Duration::minutes(60);
        match self.ledger.count_by_ip_since(&ctx.ip, hour_ago).await {
            Ok(count) if count >= self.config.ip_hourly_limit => {
                score += WEIGHT_IP_VELOCITY;
                reasons.push(format!(
                    "ip velocity: {} clicks from {} in the last hour (limit {})",
                    count, ctx.ip, self.config.ip_hourly_limit
                ));
            }
            Ok(_) => {}
            Err(e) => {
                error!(ip = %ctx.ip, error = %e, "ip window lookup failed, failing closed");
                fail_closed = true;
                reasons.push("history lookup failed: click treated as suspicious".to_string());
            }
        }

        // Session velocity over the trailing hour.
        let session_id = derive_session_id(&ctx.ip, &ctx.user_agent, now);
        match self
            .ledger
            .count_by_session_since(&session_id, hour_ago)
            .await
        {
            Ok(count) if count >= self.config.session_hourly_limit => {
                score += WEIGHT_SESSION_VELOCITY;
                reasons.push(format!(
                    "session velocity: {} clicks in the last hour (limit {})",
                    count, self.config.session_hourly_limit
                ));
            }
            Ok(_) => {}
            Err(e) => {
                error!(session = %session_id, error = %e, "session window lookup failed, failing closed");
                fail_closed = true;
                reasons.push("history lookup failed: click treated as suspicious".to_string());
            }
        }

        // Automation signatures in the user-agent.
        let ua_lower = ctx.user_agent.to_lowercase();
        if let Some(signature) = UA_DENYLIST.iter().find(|s| ua_lower.contains(*s)) {
            score += WEIGHT_UA_PATTERN;
            reasons.push(format!("user-agent matches automation signature '{}'", signature));
        }

        // Inter-click timing on the same (link, IP) pair.
        match self.ledger.last_click_at(&ctx.link_id, &ctx.ip).await {
            Ok(Some(last)) => {
                let gap = (now - last).num_seconds();
                if gap < self.config.min_click_interval_secs as i64 {
                    score += WEIGHT_CLICK_TIMING;
                    reasons.push(format!(
                        "inter-click gap {}s below minimum {}s",
                        gap, self.config.min_click_interval_secs
                    ));
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(link = %ctx.link_id, error = %e, "last-click lookup failed, failing closed");
                fail_closed = true;
                reasons.push("history lookup failed: click treated as suspicious".to_string());
            }
        }

        // Referential integrity: the link decides the owning affiliate.
        let mut resolved_affiliate = ctx.affiliate_id.clone();
        match self.registry.link(&ctx.link_id).await {
            Ok(Some(link)) if link.active => {
                resolved_affiliate = Some(link.affiliate_id);
            }
            Ok(Some(_)) => {
                score += WEIGHT_BAD_LINK;
                reasons.push(format!("link {} is not active", ctx.link_id));
            }
            Ok(None) => {
                score += WEIGHT_BAD_LINK;
                reasons.push(format!("link {} does not resolve", ctx.link_id));
            }
            Err(e) => {
                error!(link = %ctx.link_id, error = %e, "link lookup failed, failing closed");
                fail_closed = true;
                reasons.push("registry lookup failed: click treated as suspicious".to_string());
            }
        }

        if let Some(claimed) = &ctx.affiliate_id {
            match self.registry.affiliate(claimed).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    score += WEIGHT_UNKNOWN_AFFILIATE;
                    reasons.push(format!("claimed affiliate {} does not resolve", claimed));
                }
                Err(e) => {
                    error!(affiliate = %claimed, error = %e, "affiliate lookup failed, failing closed");
                    fail_closed = true;
                    reasons
                        .push("registry lookup failed: click treated as suspicious".to_string());
                }
            }
        }

        let assessment = if fail_closed {
            let mut a = FraudAssessment::rejected("scoring degraded: history unavailable");
            a.reasons.extend(reasons);
            a
        } else {
            FraudAssessment::from_score(
                score,
                reasons,
                self.config.validity_threshold,
                self.config.eligibility_threshold,
            )
        };

        debug!(
            link = %ctx.link_id,
            ip = %ctx.ip,
            score = assessment.fraud_score,
            valid = assessment.is_valid,
            eligible = assessment.is_reward_eligible,
            "click scored"
        );

        Ok(ClickEvent {
            id: Uuid::new_v4(),
            link_id: ctx.link_id.clone(),
            affiliate_id: resolved_affiliate,
            ip: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
            referrer: ctx.referrer.clone(),
            country: ctx.country.clone(),
            city: ctx.city.clone(),
            session_id,
            occurred_at: now,
            assessment,
        })
    }

    /// Score a click and append it to the ledger.
    pub async fn process(&self, ctx: &ClickContext) -> FraudResult<ClickEvent> {
        let event = self.assess(ctx).await?;
        self.append(&event).await?;
        Ok(event)
    }

    /// Append an already-scored event.
    pub async fn append(&self, event: &ClickEvent) -> FraudResult<()> {
        self.ledger.append(event).await?;
        metrics::counter!("refward_clicks_scored_total").increment(1);
        if !event.assessment.is_valid {
            metrics::counter!("refward_clicks_invalid_total").increment(1);
        } else if !event.assessment.is_reward_eligible {
            metrics::counter!("refward_clicks_ineligible_total").increment(1);
        }
        Ok(())
    }

    /// Cheap readiness probe for the health monitor: the scorer is ready
    /// when its ledger answers a trivial window query.
    pub async fn ready(&self) -> bool {
        let probe = self.clock.now() - Duration::minutes(1);
        match self.ledger.count_since(probe).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "scorer readiness probe failed");
                false
            }
        }
    }
}
