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

//! Affiliate registry rows.
//!
//! The registry is a plain CRUD collaborator: the scorer uses it for
//! referential-integrity checks, the orchestrator for payout addresses.

use serde::{Deserialize, Serialize};

/// A registered affiliate account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateAccount {
    /// Unique affiliate id.
    pub id: String,
    /// Display name for operator-facing output.
    pub display_name: String,
    /// Address the payment collaborator pays out to.
    pub payout_address: String,
    /// Inactive affiliates are skipped at payout time.
    pub active: bool,
}

/// A referral link owned by an affiliate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateLink {
    /// Unique link id (what arrives on the click).
    pub id: String,
    /// Owning affiliate.
    pub affiliate_id: String,
    /// Destination URL.
    pub destination: String,
    /// Clicks on inactive links are hard-invalidated.
    pub active: bool,
}
