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

//! Standalone Refward node binary.

use refward_node::{init_tracing, load_config, NodeBuilder, StorageSpec};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = load_config()?;
    let storage = StorageSpec::from_env()?;
    let node = NodeBuilder::new(config).storage(storage).build().await?;

    let status = node.supervisor.start().await?;
    info!(started_at = ?status.started_at, "refward node running, ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    node.supervisor.stop().await?;

    Ok(())
}
