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


/// Large enough for every optional field of the widest record kind to be
/// dropped one at a time.
pub const DEFAULT_ATTEMPT_BUDGET: u32 = 15;

/// Upper bound on store calls made by a single save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget {
    max_attempts: u32,
}

impl AttemptBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(self) -> u32 {
        self.max_attempts
    }

    pub fn allows_retry(self, attempts_used: u32) -> bool {
        attempts_used < self.max_attempts
    }
}

impl Default for AttemptBudget {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPT_BUDGET)
    }
}
