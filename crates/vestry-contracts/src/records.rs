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


//! Typed inputs for the three editor flows. Each converts into a validated
//! [`Payload`]; blank text and empty lists are left out rather than sent as
//! empty values.

use crate::kinds::RecordKind;
use crate::payload::{Payload, PayloadError};
use crate::value::FieldValue;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    entries: Vec<(String, FieldValue)>,
}

impl FieldCollector {
    fn put(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.entries.push((name.to_string(), value.into()));
        self
    }

    fn put_text(self, name: &str, value: &Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => self.put(name, text),
            _ => self,
        }
    }

    fn put_opt<T: Into<FieldValue> + Clone>(self, name: &str, value: &Option<T>) -> Self {
        match value {
            Some(inner) => self.put(name, inner.clone()),
            None => self,
        }
    }

    fn put_list(self, name: &str, items: &[String]) -> Self {
        if items.is_empty() {
            self
        } else {
            self.put(name, items.to_vec())
        }
    }

    fn finish(self, kind: RecordKind) -> Result<Payload, PayloadError> {
        Payload::build(kind, self.entries)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub description: String,
    pub amount: Decimal,
    #[serde(default)]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub attachment_urls: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

impl LedgerEntry {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
            entry_type: None,
            entry_date: None,
            category: None,
            payment_method: None,
            member_id: None,
            department: None,
            reference: None,
            attachment_urls: Vec::new(),
            notes: None,
            recorded_by: None,
        }
    }

    pub fn to_payload(&self) -> Result<Payload, PayloadError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(PayloadError::MissingRequired {
                kind: RecordKind::LedgerEntry,
                field: "description".to_string(),
            });
        }
        FieldCollector::default()
            .put("description", description)
            .put("amount", self.amount)
            .put_opt(
                "entry_type",
                &self.entry_type.map(|kind| kind.as_str().to_string()),
            )
            .put_opt("entry_date", &self.entry_date)
            .put_text("category", &self.category)
            .put_text("payment_method", &self.payment_method)
            .put_text("member_id", &self.member_id)
            .put_text("department", &self.department)
            .put_text("reference", &self.reference)
            .put_list("attachment_urls", &self.attachment_urls)
            .put_text("notes", &self.notes)
            .put_text("recorded_by", &self.recorded_by)
            .finish(RecordKind::LedgerEntry)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberProfile {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub avatar_url: Option<String>,
    pub departments: Vec<String>,
    pub marital_status: Option<String>,
    pub baptism_date: Option<NaiveDate>,
    pub membership_status: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub notes: Option<String>,
}

impl MemberProfile {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    pub fn to_payload(&self) -> Result<Payload, PayloadError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(PayloadError::MissingRequired {
                kind: RecordKind::MemberProfile,
                field: "full_name".to_string(),
            });
        }
        FieldCollector::default()
            .put("full_name", full_name)
            .put_text("email", &self.email)
            .put_text("phone", &self.phone)
            .put_opt("birth_date", &self.birth_date)
            .put_text("gender", &self.gender)
            .put_text("address", &self.address)
            .put_text("avatar_url", &self.avatar_url)
            .put_list("departments", &self.departments)
            .put_text("marital_status", &self.marital_status)
            .put_opt("baptism_date", &self.baptism_date)
            .put_text("membership_status", &self.membership_status)
            .put_text("role", &self.role)
            .put_text("bio", &self.bio)
            .put_text("notes", &self.notes)
            .finish(RecordKind::MemberProfile)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    #[serde(default)]
    pub kind: Option<EntryType>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            color: None,
            icon: None,
            parent_id: None,
            description: None,
            notes: None,
            active: None,
        }
    }

    pub fn to_payload(&self) -> Result<Payload, PayloadError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PayloadError::MissingRequired {
                kind: RecordKind::Category,
                field: "name".to_string(),
            });
        }
        FieldCollector::default()
            .put("name", name)
            .put_opt("kind", &self.kind.map(|kind| kind.as_str().to_string()))
            .put_text("color", &self.color)
            .put_text("icon", &self.icon)
            .put_text("parent_id", &self.parent_id)
            .put_text("description", &self.description)
            .put_text("notes", &self.notes)
            .put_opt("active", &self.active)
            .finish(RecordKind::Category)
    }
}
