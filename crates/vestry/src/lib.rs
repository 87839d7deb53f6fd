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


pub mod config;
pub mod pipeline;
pub mod store;

pub use config::{ConfigError, StoreConfig, SynonymOverride, TableNames, VestryConfig};
pub use pipeline::{
    classify_error, classify_message, AttemptBudget, Classification, RecordWriter, Resolution,
    SynonymAction, SynonymRule, SynonymTable, DEFAULT_ATTEMPT_BUDGET,
};
pub use store::{AttemptRecord, BackingStore, MemoryStore, MissingColumnStyle, RestStore};

pub use vestry_contracts as contracts;
pub use vestry_contracts::{
    AdjustmentAction, CategoryRecord, EntryType, FatalCause, FieldAdjustment, FieldValue,
    LedgerEntry, MemberProfile, Payload, PayloadError, RecordKey, RecordKind, StoreError,
    WriteOutcome, WriteTarget,
};
