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

//! SQLite ledger backends.
//!
//! ## Purpose
//! Persistent single-node backends for the click ledger and reward store.
//!
//! ## Schema
//! ```sql
//! CREATE TABLE click_events (
//!     id TEXT PRIMARY KEY,
//!     link_id TEXT NOT NULL,
//!     affiliate_id TEXT,
//!     ip TEXT NOT NULL,
//!     user_agent TEXT NOT NULL,
//!     referrer TEXT,
//!     country TEXT,
//!     city TEXT,
//!     session_id TEXT NOT NULL,
//!     occurred_at BIGINT NOT NULL,      -- unix seconds
//!     is_valid INTEGER NOT NULL,
//!     is_reward_eligible INTEGER NOT NULL,
//!     fraud_score INTEGER NOT NULL,
//!     reasons TEXT NOT NULL             -- JSON array
//! );
//!
//! CREATE TABLE reward_records (
//!     id TEXT PRIMARY KEY,
//!     affiliate_id TEXT NOT NULL,
//!     epoch_id TEXT NOT NULL,
//!     total_clicks BIGINT NOT NULL,
//!     valid_clicks BIGINT NOT NULL,
//!     eligible_clicks BIGINT NOT NULL,
//!     amount TEXT NOT NULL,             -- exact decimal, TEXT-encoded
//!     status TEXT NOT NULL,
//!     payment_ref TEXT,
//!     created_at BIGINT NOT NULL,
//!     updated_at BIGINT NOT NULL,
//!     UNIQUE(affiliate_id, epoch_id)
//! );
//! ```
//! Amounts are TEXT-encoded decimals so no precision is lost to float
//! columns; timestamps are unix seconds.

use crate::{ClickLedger, LedgerError, LedgerResult, RewardStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use refward_core::{ClickEvent, ClickStats, EpochId, FraudAssessment, RewardRecord, RewardStatus};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

fn to_secs(ts: DateTime<Utc>) -> i64 {
    ts.timestamp()
}

fn from_secs(secs: i64) -> LedgerResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| LedgerError::CorruptRecord(format!("timestamp {} out of range", secs)))
}

async fn connect(path: &str) -> LedgerResult<Pool<Sqlite>> {
    // A pooled :memory: database is per-connection; cap the pool at one so
    // every query sees the same database.
    let (url, max_connections) = if path == ":memory:" {
        ("sqlite::memory:".to_string(), 1)
    } else {
        (format!("sqlite://{}?mode=rwc", path), 5)
    };
    Ok(SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?)
}

/// SQLite-backed click ledger.
#[derive(Clone)]
pub struct SqliteClickLedger {
    pool: Pool<Sqlite>,
}

impl SqliteClickLedger {
    /// Open (or create) a click ledger at `path`; ":memory:" is supported.
    pub async fn new(path: &str) -> LedgerResult<Self> {
        let pool = connect(path).await?;
        Self::with_pool(pool).await
    }

    /// Build on an existing pool, bootstrapping the schema.
    pub async fn with_pool(pool: Pool<Sqlite>) -> LedgerResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS click_events (
                id TEXT PRIMARY KEY,
                link_id TEXT NOT NULL,
                affiliate_id TEXT,
                ip TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                referrer TEXT,
                country TEXT,
                city TEXT,
                session_id TEXT NOT NULL,
                occurred_at BIGINT NOT NULL,
                is_valid INTEGER NOT NULL,
                is_reward_eligible INTEGER NOT NULL,
                fraud_score INTEGER NOT NULL,
                reasons TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_click_ip_time ON click_events(ip, occurred_at)",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_click_session_time
             ON click_events(session_id, occurred_at)",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_click_link_ip
             ON click_events(link_id, ip, occurred_at)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> LedgerResult<ClickEvent> {
        let id: String = row.get("id");
        let reasons: String = row.get("reasons");
        Ok(ClickEvent {
            id: Uuid::parse_str(&id)
                .map_err(|e| LedgerError::CorruptRecord(format!("click id {}: {}", id, e)))?,
            link_id: row.get("link_id"),
            affiliate_id: row.get("affiliate_id"),
            ip: row.get("ip"),
            user_agent: row.get("user_agent"),
            referrer: row.get("referrer"),
            country: row.get("country"),
            city: row.get("city"),
            session_id: row.get("session_id"),
            occurred_at: from_secs(row.get("occurred_at"))?,
            assessment: FraudAssessment {
                is_valid: row.get::<i64, _>("is_valid") != 0,
                is_reward_eligible: row.get::<i64, _>("is_reward_eligible") != 0,
                fraud_score: row.get::<i64, _>("fraud_score") as u8,
                reasons: serde_json::from_str(&reasons)?,
            },
        })
    }
}

#[async_trait]
impl ClickLedger for SqliteClickLedger {
    async fn append(&self, event: &ClickEvent) -> LedgerResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO click_events (
                id, link_id, affiliate_id, ip, user_agent, referrer, country, city,
                session_id, occurred_at, is_valid, is_reward_eligible, fraud_score, reasons
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.link_id)
        .bind(&event.affiliate_id)
        .bind(&event.ip)
        .bind(&event.user_agent)
        .bind(&event.referrer)
        .bind(&event.country)
        .bind(&event.city)
        .bind(&event.session_id)
        .bind(to_secs(event.occurred_at))
        .bind(event.assessment.is_valid as i64)
        .bind(event.assessment.is_reward_eligible as i64)
        .bind(event.assessment.fraud_score as i64)
        .bind(serde_json::to_string(&event.assessment.reasons)?)
        .execute(&self.pool)
        .await?;
        Ok(event.id)
    }

    async fn count_by_ip_since(&self, ip: &str, since: DateTime<Utc>) -> LedgerResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM click_events WHERE ip = ? AND occurred_at >= ?",
        )
        .bind(ip)
        .bind(to_secs(since))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn count_by_session_since(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> LedgerResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM click_events WHERE session_id = ? AND occurred_at >= ?",
        )
        .bind(session_id)
        .bind(to_secs(since))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    async fn last_click_at(
        &self,
        link_id: &str,
        ip: &str,
    ) -> LedgerResult<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT MAX(occurred_at) AS t FROM click_events WHERE link_id = ? AND ip = ?",
        )
        .bind(link_id)
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;
        match row.get::<Option<i64>, _>("t") {
            Some(secs) => Ok(Some(from_secs(secs)?)),
            None => Ok(None),
        }
    }

    async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<ClickEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM click_events WHERE occurred_at >= ? AND occurred_at < ?
             ORDER BY occurred_at",
        )
        .bind(to_secs(start))
        .bind(to_secs(end))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_event).collect()
    }

    async fn eligible_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<Vec<ClickEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM click_events
             WHERE is_reward_eligible = 1 AND occurred_at >= ? AND occurred_at < ?
             ORDER BY occurred_at",
        )
        .bind(to_secs(start))
        .bind(to_secs(end))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_event).collect()
    }

    async fn stats_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LedgerResult<ClickStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(is_valid), 0) AS valid,
                   COALESCE(SUM(is_reward_eligible), 0) AS eligible,
                   COALESCE(AVG(fraud_score), 0.0) AS avg_score
            FROM click_events WHERE occurred_at >= ? AND occurred_at < ?
            "#,
        )
        .bind(to_secs(start))
        .bind(to_secs(end))
        .fetch_one(&self.pool)
        .await?;
        Ok(ClickStats {
            total: row.get::<i64, _>("total") as u64,
            valid: row.get::<i64, _>("valid") as u64,
            eligible: row.get::<i64, _>("eligible") as u64,
            avg_fraud_score: row.get::<f64, _>("avg_score"),
        })
    }

    async fn count_since(&self, since: DateTime<Utc>) -> LedgerResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM click_events WHERE occurred_at >= ?")
            .bind(to_secs(since))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

/// SQLite-backed reward store.
#[derive(Clone)]
pub struct SqliteRewardStore {
    pool: Pool<Sqlite>,
}

impl SqliteRewardStore {
    /// Open (or create) a reward store at `path`; ":memory:" is supported.
    pub async fn new(path: &str) -> LedgerResult<Self> {
        let pool = connect(path).await?;
        Self::with_pool(pool).await
    }

    /// Build on an existing pool, bootstrapping the schema.
    pub async fn with_pool(pool: Pool<Sqlite>) -> LedgerResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reward_records (
                id TEXT PRIMARY KEY,
                affiliate_id TEXT NOT NULL,
                epoch_id TEXT NOT NULL,
                total_clicks BIGINT NOT NULL,
                valid_clicks BIGINT NOT NULL,
                eligible_clicks BIGINT NOT NULL,
                amount TEXT NOT NULL,
                status TEXT NOT NULL,
                payment_ref TEXT,
                created_at BIGINT NOT NULL,
                updated_at BIGINT NOT NULL,
                UNIQUE(affiliate_id, epoch_id)
            )
            "#,
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reward_status ON reward_records(status)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> LedgerResult<RewardRecord> {
        let id: String = row.get("id");
        let epoch: String = row.get("epoch_id");
        let amount: String = row.get("amount");
        let status: String = row.get("status");
        Ok(RewardRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| LedgerError::CorruptRecord(format!("record id {}: {}", id, e)))?,
            affiliate_id: row.get("affiliate_id"),
            epoch_id: EpochId::parse(&epoch)
                .map_err(|e| LedgerError::CorruptRecord(e.to_string()))?,
            total_clicks: row.get::<i64, _>("total_clicks") as u64,
            valid_clicks: row.get::<i64, _>("valid_clicks") as u64,
            eligible_clicks: row.get::<i64, _>("eligible_clicks") as u64,
            amount: Decimal::from_str(&amount)
                .map_err(|e| LedgerError::CorruptRecord(format!("amount {}: {}", amount, e)))?,
            status: status
                .parse::<RewardStatus>()
                .map_err(LedgerError::CorruptRecord)?,
            payment_ref: row.get("payment_ref"),
            created_at: from_secs(row.get("created_at"))?,
            updated_at: from_secs(row.get("updated_at"))?,
        })
    }
}

#[async_trait]
impl RewardStore for SqliteRewardStore {
    async fn insert_all(&self, records: &[RewardRecord]) -> LedgerResult<()> {
        // One transaction per epoch insertion: partial epochs are never
        // observable.
        let mut tx = self.pool.begin().await?;
        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO reward_records (
                    id, affiliate_id, epoch_id, total_clicks, valid_clicks,
                    eligible_clicks, amount, status, payment_ref, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.id.to_string())
            .bind(&record.affiliate_id)
            .bind(record.epoch_id.as_str())
            .bind(record.total_clicks as i64)
            .bind(record.valid_clicks as i64)
            .bind(record.eligible_clicks as i64)
            .bind(record.amount.to_string())
            .bind(record.status.as_str())
            .bind(&record.payment_ref)
            .bind(to_secs(record.created_at))
            .bind(to_secs(record.updated_at))
            .execute(&mut *tx)
            .await;
            if let Err(e) = result {
                tx.rollback().await?;
                if let sqlx::Error::Database(ref db) = e {
                    if db.is_unique_violation() {
                        return Err(LedgerError::Duplicate(format!(
                            "reward for affiliate {} in epoch {} already exists",
                            record.affiliate_id, record.epoch_id
                        )));
                    }
                }
                return Err(e.into());
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn by_epoch(&self, epoch: &EpochId) -> LedgerResult<Vec<RewardRecord>> {
        let rows = sqlx::query("SELECT * FROM reward_records WHERE epoch_id = ?")
            .bind(epoch.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn by_status(&self, status: RewardStatus) -> LedgerResult<Vec<RewardRecord>> {
        let rows = sqlx::query("SELECT * FROM reward_records WHERE status = ?")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_record).collect()
    }

    async fn mark_distributed(&self, ids: &[Uuid], payment_ref: &str) -> LedgerResult<()> {
        let now = to_secs(Utc::now());
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query(
                "UPDATE reward_records SET status = ?, payment_ref = ?, updated_at = ?
                 WHERE id = ?",
            )
            .bind(RewardStatus::Distributed.as_str())
            .bind(payment_ref)
            .bind(now)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn mark_failed(&self, ids: &[Uuid], reason: &str) -> LedgerResult<()> {
        tracing::warn!(count = ids.len(), reason, "marking reward records failed");
        let now = to_secs(Utc::now());
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("UPDATE reward_records SET status = ?, updated_at = ? WHERE id = ?")
                .bind(RewardStatus::Failed.as_str())
                .bind(now)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn pending_total(&self) -> LedgerResult<(Decimal, usize)> {
        // Amounts are TEXT decimals: sum in Rust, not in SQL.
        let pending = self.by_status(RewardStatus::Calculated).await?;
        let mut total = Decimal::ZERO;
        let mut affiliates = std::collections::HashSet::new();
        for record in &pending {
            total += record.amount;
            affiliates.insert(record.affiliate_id.as_str());
        }
        Ok((total, affiliates.len()))
    }
}
