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

//! # Refward Distribution
//!
//! ## Purpose
//! Batch payout orchestration over pending reward records:
//!
//! - [`DistributionOrchestrator::evaluate`] checks the batch triggers
//!   (pending amount, distinct affiliates, elapsed interval) in order
//! - [`DistributionOrchestrator::execute`] enforces the cooldown and cost
//!   gates, submits one batch through a [`PaymentClient`], and transitions
//!   the included records to `Distributed`
//! - a refused gate is an outcome, not an error; records stay `Calculated`
//!   and the next cycle retries
//! - exactly one execution at a time; contention fails fast with
//!   `AlreadyProcessing`
//!
//! Every evaluation outcome that matters (execution, refusal, failure) is
//! written to the decision journal.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod orchestrator;
pub mod payment;

pub use error::{DistributionError, DistributionResult};
pub use orchestrator::{
    CycleOutcome, DistributionMetrics, DistributionOrchestrator, DistributionOutcome,
};
pub use payment::{
    MockPaymentClient, PaymentClient, PaymentError, PaymentItem, PaymentReceipt, PaymentResult,
    SubmittedBatch,
};
