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

//! Secondary pattern analysis.
//!
//! ## Purpose
//! An independent anomaly pass run by the supervisor on top of the base
//! score. Its verdict can only ever TIGHTEN the base verdict: when both the
//! confidence and the anomaly score clear their configured gates the
//! supervisor withdraws eligibility (and validity, above the hard bar).
//!
//! ## Failure policy
//! Analysis is advisory. Ledger errors here return a zero-confidence
//! verdict (no override possible) and a warning, the opposite of the base
//! scorer's fail-closed policy: an advisory pass must not reject traffic
//! just because it could not look.

use crate::error::FraudResult;
use chrono::Duration;
use refward_core::{ClickEvent, Clock, EngineConfig};
use refward_ledger::ClickLedger;
use std::sync::Arc;
use tracing::warn;

/// Anomaly score above which validity (not just eligibility) is withdrawn.
pub const HARD_ANOMALY_BAR: f64 = 0.9;

/// Result of one pattern-analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternVerdict {
    /// Independent anomaly score in `0.0..=1.0`.
    pub anomaly_score: f64,
    /// Confidence in the anomaly score, grows with sample size.
    pub confidence: f64,
    /// Human-readable indicators that contributed.
    pub indicators: Vec<String>,
}

impl PatternVerdict {
    fn none() -> Self {
        Self {
            anomaly_score: 0.0,
            confidence: 0.0,
            indicators: Vec::new(),
        }
    }
}

/// Heuristic anomaly detector over recent ledger history.
pub struct PatternAnalyzer {
    ledger: Arc<dyn ClickLedger>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl PatternAnalyzer {
    /// Create an analyzer over the given ledger.
    pub fn new(
        ledger: Arc<dyn ClickLedger>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            config,
            clock,
        }
    }

    /// Analyze one click against its recent IP/session history.
    pub async fn analyze(&self, event: &ClickEvent) -> FraudResult<PatternVerdict> {
        let now = self.clock.now();
        let hour_ago = now - Duration::minutes(60);
        let burst_window = now - Duration::minutes(5);

        let ip_hour = match self.ledger.count_by_ip_since(&event.ip, hour_ago).await {
            Ok(n) => n,
            Err(e) => {
                warn!(ip = %event.ip, error = %e, "pattern analysis skipped: ledger unavailable");
                return Ok(PatternVerdict::none());
            }
        };
        let ip_burst = match self.ledger.count_by_ip_since(&event.ip, burst_window).await {
            Ok(n) => n,
            Err(e) => {
                warn!(ip = %event.ip, error = %e, "pattern analysis skipped: ledger unavailable");
                return Ok(PatternVerdict::none());
            }
        };
        let session_hour = match self
            .ledger
            .count_by_session_since(&event.session_id, hour_ago)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                warn!(session = %event.session_id, error = %e, "pattern analysis skipped: ledger unavailable");
                return Ok(PatternVerdict::none());
            }
        };

        let mut anomaly: f64 = 0.0;
        let mut indicators = Vec::new();

        // Burst ratio: most of the hour's traffic packed into five minutes.
        if ip_hour >= 3 {
            let ratio = ip_burst as f64 / ip_hour as f64;
            if ratio > 0.8 {
                anomaly += 0.4;
                indicators.push(format!(
                    "burst: {}/{} of hourly clicks within 5 minutes",
                    ip_burst, ip_hour
                ));
            }
        }

        // Session monotony: a single session accounting for the whole IP.
        if session_hour >= self.config.session_hourly_limit && session_hour == ip_hour {
            anomaly += 0.3;
            indicators.push(format!(
                "monotony: one session drove all {} clicks from this ip",
                session_hour
            ));
        }

        // Referrerless velocity: organic traffic at speed carries referrers.
        if event.referrer.is_none() && ip_hour >= self.config.ip_hourly_limit / 2 {
            anomaly += 0.3;
            indicators.push(format!(
                "no referrer across {} clicks in the last hour",
                ip_hour
            ));
        }

        // Confidence grows with how much history backs the verdict.
        let confidence = (ip_hour as f64 / 10.0).min(1.0);

        Ok(PatternVerdict {
            anomaly_score: anomaly.min(1.0),
            confidence,
            indicators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use refward_core::{derive_session_id, FraudAssessment, ManualClock};
    use refward_ledger::memory::InMemoryClickLedger;
    use uuid::Uuid;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn click(ip: &str, ua: &str, at: DateTime<Utc>, referrer: Option<&str>) -> ClickEvent {
        ClickEvent {
            id: Uuid::new_v4(),
            link_id: "l1".into(),
            affiliate_id: Some("a1".into()),
            ip: ip.into(),
            user_agent: ua.into(),
            referrer: referrer.map(String::from),
            country: None,
            city: None,
            session_id: derive_session_id(ip, ua, at),
            occurred_at: at,
            assessment: FraudAssessment::from_score(0, vec![], 70, 30),
        }
    }

    #[tokio::test]
    async fn quiet_history_yields_no_anomaly() {
        let clock = Arc::new(ManualClock::new(start()));
        let ledger = Arc::new(InMemoryClickLedger::new());
        let analyzer = PatternAnalyzer::new(
            ledger.clone(),
            Arc::new(EngineConfig::default()),
            clock.clone(),
        );

        let event = click("1.2.3.4", "Mozilla/5.0", clock.now(), Some("https://x"));
        ledger.append(&event).await.unwrap();

        let verdict = analyzer.analyze(&event).await.unwrap();
        assert_eq!(verdict.anomaly_score, 0.0);
        assert!(verdict.confidence < 0.5);
    }

    #[tokio::test]
    async fn referrerless_burst_is_anomalous_with_confidence() {
        let clock = Arc::new(ManualClock::new(start()));
        let ledger = Arc::new(InMemoryClickLedger::new());
        let analyzer = PatternAnalyzer::new(
            ledger.clone(),
            Arc::new(EngineConfig::default()),
            clock.clone(),
        );

        // Ten referrerless clicks inside five minutes, one session.
        for _ in 0..10 {
            clock.advance(chrono::Duration::seconds(20));
            let event = click("1.2.3.4", "Mozilla/5.0", clock.now(), None);
            ledger.append(&event).await.unwrap();
        }
        let probe = click("1.2.3.4", "Mozilla/5.0", clock.now(), None);

        let verdict = analyzer.analyze(&probe).await.unwrap();
        assert!(verdict.anomaly_score > 0.7, "got {}", verdict.anomaly_score);
        assert!(verdict.confidence >= 0.8, "got {}", verdict.confidence);
        assert!(!verdict.indicators.is_empty());
    }
}
