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

//! # Refward Node
//!
//! ## Purpose
//! Composition root for a standalone Refward engine:
//!
//! - [`load_config`]: defaults + `REFWARD_*` env overrides, validated once
//! - [`NodeBuilder`]: opens the chosen storage backend and wires the scorer,
//!   calculator, orchestrator, journal, and supervisor behind shared `Arc`s
//! - `refward-node` binary: init tracing, build, start the supervisor, run
//!   until ctrl-c, stop cleanly
//!
//! Embedders depend on this crate as a library and call the builder with
//! their own [`refward_distribution::PaymentClient`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod error;
pub mod tracing_setup;

pub use builder::{Node, NodeBuilder, StorageSpec};
pub use config::load_config;
pub use error::{NodeError, NodeResult};
pub use tracing_setup::init_tracing;
