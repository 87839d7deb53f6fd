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


//! Recognises "unknown column" rejections from the store's error text.
//!
//! Only two message shapes are matched, both anchored at the start of the
//! message:
//! - Postgres: `column "X" does not exist`, optionally
//!   `column "X" of relation "T" does not exist`, optionally after `ERROR:`.
//! - Schema cache: `Could not find the 'X' column of 'T' in the schema cache`.
//!
//! Anything else is `NotClassified`, including constraint messages that
//! happen to name a column.

use once_cell::sync::Lazy;
use regex::Regex;
use vestry_contracts::StoreError;

static UNDEFINED_COLUMN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:ERROR:\s*)?column "([^"]+)"(?: of relation "[^"]+")? does not exist"#)
        .expect("valid undefined column regex")
});
static SCHEMA_CACHE_COLUMN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Could not find the '([^']+)' column\b").expect("valid schema cache regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    UnknownField(String),
    NotClassified,
}

pub fn classify_message(message: &str) -> Classification {
    let message = message.trim();
    UNDEFINED_COLUMN_RE
        .captures(message)
        .or_else(|| SCHEMA_CACHE_COLUMN_RE.captures(message))
        .and_then(|captures| captures.get(1))
        .map(|name| Classification::UnknownField(name.as_str().to_string()))
        .unwrap_or(Classification::NotClassified)
}

/// Only store rejections are inspected. Other failures never carry a field
/// name.
pub fn classify_error(error: &StoreError) -> Classification {
    match error.rejection_message() {
        Some(message) => classify_message(message),
        None => Classification::NotClassified,
    }
}
