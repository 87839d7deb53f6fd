// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.


use crate::payload::PayloadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const LEDGER_FIELDS: &[&str] = &[
    "description",
    "amount",
    "entry_type",
    "entry_date",
    "category",
    "payment_method",
    "member_id",
    "department",
    "reference",
    "attachment_urls",
    "notes",
    "recorded_by",
];

const PROFILE_FIELDS: &[&str] = &[
    "full_name",
    "email",
    "phone",
    "birth_date",
    "gender",
    "address",
    "avatar_url",
    "departments",
    "marital_status",
    "baptism_date",
    "membership_status",
    "role",
    "bio",
    "notes",
];

const CATEGORY_FIELDS: &[&str] = &[
    "name",
    "kind",
    "color",
    "icon",
    "parent_id",
    "description",
    "notes",
    "active",
];

/// The three record kinds persisted through the write pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    LedgerEntry,
    MemberProfile,
    Category,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::LedgerEntry,
        RecordKind::MemberProfile,
        RecordKind::Category,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::LedgerEntry => "ledger_entry",
            RecordKind::MemberProfile => "member_profile",
            RecordKind::Category => "category",
        }
    }

    pub fn default_table(self) -> &'static str {
        match self {
            RecordKind::LedgerEntry => "ledger_entries",
            RecordKind::MemberProfile => "profiles",
            RecordKind::Category => "categories",
        }
    }

    /// Closed set of field names a caller may put into a payload of this kind.
    pub fn canonical_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::LedgerEntry => LEDGER_FIELDS,
            RecordKind::MemberProfile => PROFILE_FIELDS,
            RecordKind::Category => CATEGORY_FIELDS,
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::LedgerEntry => &["description", "amount"],
            RecordKind::MemberProfile => &["full_name"],
            RecordKind::Category => &["name"],
        }
    }

    pub fn is_canonical(self, field: &str) -> bool {
        self.canonical_fields().contains(&field)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "ledger" | "ledger_entry" | "ledger_entries" | "entry" => Ok(RecordKind::LedgerEntry),
            "profile" | "member" | "member_profile" | "profiles" => Ok(RecordKind::MemberProfile),
            "category" | "categories" => Ok(RecordKind::Category),
            _ => Err(PayloadError::UnknownKind(s.to_string())),
        }
    }
}
