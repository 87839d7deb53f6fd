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


pub mod error;
pub mod kinds;
pub mod outcome;
pub mod payload;
pub mod records;
pub mod target;
pub mod value;

pub use error::StoreError;
pub use kinds::RecordKind;
pub use outcome::{AdjustmentAction, FatalCause, FieldAdjustment, WriteOutcome};
pub use payload::{Payload, PayloadError};
pub use records::{CategoryRecord, EntryType, LedgerEntry, MemberProfile};
pub use target::{RecordKey, WriteTarget};
pub use value::FieldValue;
