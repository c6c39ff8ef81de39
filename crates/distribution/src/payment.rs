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

//! Payment collaborator boundary.
//!
//! ## Purpose
//! [`PaymentClient`] is the one seam to the money-moving side. A batch is a
//! single `submit_batch` call: either the whole batch confirms with a
//! payment reference or the whole batch fails and no record transitions.
//!
//! [`MockPaymentClient`] ships in the crate (not behind `cfg(test)`) so the
//! node demo and downstream integration tests can run without a real payment
//! backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Result type for payment operations.
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Errors surfaced by a payment collaborator.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The backend rejected the batch.
    #[error("Payment rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("Payment backend unavailable: {0}")]
    Unavailable(String),
}

/// One payout line inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentItem {
    /// Where the amount goes.
    pub recipient_address: String,
    /// How much, exact decimal.
    pub amount: Decimal,
    /// The affiliate behind the address, for reconciliation.
    pub affiliate_id: String,
}

impl PaymentItem {
    /// Build one payout line.
    pub fn new(
        recipient_address: impl Into<String>,
        amount: Decimal,
        affiliate_id: impl Into<String>,
    ) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            amount,
            affiliate_id: affiliate_id.into(),
        }
    }
}

/// Confirmation of a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Backend-assigned reference, stored on every distributed record.
    pub payment_ref: String,
    /// When the backend confirmed the batch.
    pub confirmed_at: DateTime<Utc>,
}

/// Boundary to the payment backend.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Submit one batch of payouts. All-or-nothing from the caller's view.
    async fn submit_batch(
        &self,
        items: &[PaymentItem],
        epoch_hint: &str,
    ) -> PaymentResult<PaymentReceipt>;

    /// Cheap reachability probe for the health monitor.
    async fn health_check(&self) -> PaymentResult<()> {
        Ok(())
    }
}

/// A batch as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedBatch {
    /// The items the orchestrator handed over.
    pub items: Vec<PaymentItem>,
    /// The epoch hint that accompanied them.
    pub epoch_hint: String,
}

/// In-process payment double with configurable latency, scripted failures,
/// and a health toggle.
pub struct MockPaymentClient {
    latency: Duration,
    healthy: AtomicBool,
    failures: Mutex<VecDeque<PaymentError>>,
    batches: Mutex<Vec<SubmittedBatch>>,
}

impl Default for MockPaymentClient {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            healthy: AtomicBool::new(true),
            failures: Mutex::new(VecDeque::new()),
            batches: Mutex::new(Vec::new()),
        }
    }
}

impl MockPaymentClient {
    /// A mock that confirms everything instantly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that sleeps `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Script the next `submit_batch` call to fail.
    pub async fn fail_next(&self, error: PaymentError) {
        self.failures.lock().await.push_back(error);
    }

    /// Toggle what `health_check` reports.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Every batch submitted so far, in order.
    pub async fn submitted(&self) -> Vec<SubmittedBatch> {
        self.batches.lock().await.clone()
    }
}

#[async_trait]
impl PaymentClient for MockPaymentClient {
    async fn submit_batch(
        &self,
        items: &[PaymentItem],
        epoch_hint: &str,
    ) -> PaymentResult<PaymentReceipt> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(error) = self.failures.lock().await.pop_front() {
            return Err(error);
        }
        self.batches.lock().await.push(SubmittedBatch {
            items: items.to_vec(),
            epoch_hint: epoch_hint.to_string(),
        });
        Ok(PaymentReceipt {
            payment_ref: format!("mock-{}", Uuid::new_v4()),
            confirmed_at: Utc::now(),
        })
    }

    async fn health_check(&self) -> PaymentResult<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PaymentError::Unavailable("marked unhealthy".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mock_confirms_and_records_batches() {
        let mock = MockPaymentClient::new();
        let items = vec![PaymentItem::new("addr-1", dec!(1.5), "aff-1")];

        let receipt = mock.submit_batch(&items, "2025-01-15").await.unwrap();
        assert!(receipt.payment_ref.starts_with("mock-"));

        let seen = mock.submitted().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].epoch_hint, "2025-01-15");
        assert_eq!(seen[0].items, items);
    }

    #[tokio::test]
    async fn scripted_failure_fires_once() {
        let mock = MockPaymentClient::new();
        mock.fail_next(PaymentError::Unavailable("maintenance".into()))
            .await;

        let items = vec![PaymentItem::new("addr-1", dec!(1), "aff-1")];
        assert!(mock.submit_batch(&items, "e").await.is_err());
        assert!(mock.submit_batch(&items, "e").await.is_ok());
        assert_eq!(mock.submitted().await.len(), 1);
    }
}
