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

//! SQLite decision store.
//!
//! ## Schema
//! ```sql
//! CREATE TABLE decisions (
//!     id TEXT PRIMARY KEY,
//!     category TEXT NOT NULL,
//!     confidence REAL NOT NULL,
//!     decision TEXT NOT NULL,
//!     reasoning TEXT NOT NULL,   -- JSON array
//!     actions TEXT NOT NULL,     -- JSON array
//!     recorded_at BIGINT NOT NULL
//! );
//! ```
//! Paging orders by the autoincrement rowid so two decisions recorded in the
//! same second page stably.

use crate::{DecisionStore, JournalError, JournalResult};
use async_trait::async_trait;
use chrono::DateTime;
use refward_core::{Decision, DecisionCategory};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use uuid::Uuid;

/// SQLite-backed decision store.
#[derive(Clone)]
pub struct SqliteDecisionStore {
    pool: Pool<Sqlite>,
}

impl SqliteDecisionStore {
    /// Open (or create) a decision store at `path`; ":memory:" is supported.
    pub async fn new(path: &str) -> JournalResult<Self> {
        // A pooled :memory: database is per-connection; cap the pool at one
        // so every query sees the same database.
        let (url, max_connections) = if path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite://{}?mode=rwc", path), 5)
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;
        Self::with_pool(pool).await
    }

    /// Build on an existing pool, bootstrapping the schema.
    pub async fn with_pool(pool: Pool<Sqlite>) -> JournalResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decisions (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                confidence REAL NOT NULL,
                decision TEXT NOT NULL,
                reasoning TEXT NOT NULL,
                actions TEXT NOT NULL,
                recorded_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_decisions_category
             ON decisions(category, recorded_at)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    fn row_to_decision(row: &sqlx::sqlite::SqliteRow) -> JournalResult<Decision> {
        let id: String = row.get("id");
        let category: String = row.get("category");
        let reasoning: String = row.get("reasoning");
        let actions: String = row.get("actions");
        let recorded_at: i64 = row.get("recorded_at");
        Ok(Decision {
            id: Uuid::parse_str(&id)
                .map_err(|e| JournalError::CorruptEntry(format!("decision id {}: {}", id, e)))?,
            category: category
                .parse::<DecisionCategory>()
                .map_err(JournalError::CorruptEntry)?,
            confidence: row.get("confidence"),
            decision: row.get("decision"),
            reasoning: serde_json::from_str(&reasoning)?,
            actions: serde_json::from_str(&actions)?,
            recorded_at: DateTime::from_timestamp(recorded_at, 0).ok_or_else(|| {
                JournalError::CorruptEntry(format!("timestamp {} out of range", recorded_at))
            })?,
        })
    }
}

#[async_trait]
impl DecisionStore for SqliteDecisionStore {
    async fn append(&self, decision: &Decision) -> JournalResult<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions (id, category, confidence, decision, reasoning, actions, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(decision.id.to_string())
        .bind(decision.category.as_str())
        .bind(decision.confidence)
        .bind(&decision.decision)
        .bind(serde_json::to_string(&decision.reasoning)?)
        .bind(serde_json::to_string(&decision.actions)?)
        .bind(decision.recorded_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> JournalResult<Vec<Decision>> {
        let rows = sqlx::query("SELECT * FROM decisions ORDER BY rowid DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_decision).collect()
    }

    async fn by_category(
        &self,
        category: DecisionCategory,
        offset: usize,
        limit: usize,
    ) -> JournalResult<Vec<Decision>> {
        let rows = sqlx::query(
            "SELECT * FROM decisions WHERE category = ?
             ORDER BY rowid DESC LIMIT ? OFFSET ?",
        )
        .bind(category.as_str())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_decision).collect()
    }

    async fn count(&self) -> JournalResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM decisions")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}
