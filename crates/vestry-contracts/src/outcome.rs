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


use crate::error::StoreError;
use crate::kinds::RecordKind;
use crate::payload::Payload;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdjustmentAction {
    Renamed { to: String },
    Merged { into: String, label: String },
    Dropped,
}

/// What happened to one field of the caller's original payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldAdjustment {
    pub field: String,
    #[serde(flatten)]
    pub action: AdjustmentAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FatalCause {
    #[error("{error}")]
    Store { error: StoreError },

    #[error("Attempt budget of {budget} exhausted; last error: {last_error}")]
    BudgetExhausted { budget: u32, last_error: StoreError },

    #[error("Store rejected field '{field}' which is not in the payload: {last_error}")]
    UnresolvableField { field: String, last_error: StoreError },

    #[error("Every field was removed from the payload; last error: {last_error}")]
    NothingToWrite { last_error: StoreError },

    #[error("Payload of kind {found} cannot be written to a {expected} target")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },
}

impl FatalCause {
    /// The store failure that ended the save, verbatim.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            FatalCause::Store { error } => Some(error),
            FatalCause::BudgetExhausted { last_error, .. }
            | FatalCause::UnresolvableField { last_error, .. }
            | FatalCause::NothingToWrite { last_error } => Some(last_error),
            FatalCause::KindMismatch { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    Success {
        fields: Vec<String>,
        attempts: u32,
    },
    PartialSuccess {
        adjustments: Vec<FieldAdjustment>,
        payload: Payload,
        attempts: u32,
    },
    Fatal {
        cause: FatalCause,
        attempts: u32,
    },
}

impl WriteOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            WriteOutcome::Success { attempts, .. }
            | WriteOutcome::PartialSuccess { attempts, .. }
            | WriteOutcome::Fatal { attempts, .. } => *attempts,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !matches!(self, WriteOutcome::Fatal { .. })
    }

    pub fn adjustments(&self) -> &[FieldAdjustment] {
        match self {
            WriteOutcome::PartialSuccess { adjustments, .. } => adjustments,
            _ => &[],
        }
    }

    pub fn fatal_cause(&self) -> Option<&FatalCause> {
        match self {
            WriteOutcome::Fatal { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
