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


use serde::Serialize;
use thiserror::Error;

/// Failure reported by a backing store write call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unauthorised: {0}")]
    Unauthorised(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialisation error: {0}")]
    Serialisation(String),

    #[error("Store rejected write: {message}")]
    Rejected {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
}

impl StoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        StoreError::Rejected {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// Free-text message carried by a rejection, if this is one.
    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            StoreError::Rejected { message, .. } => Some(message),
            _ => None,
        }
    }
}
