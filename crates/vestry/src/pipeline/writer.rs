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


use crate::config::{ConfigError, TableNames, VestryConfig};
use crate::pipeline::budget::AttemptBudget;
use crate::pipeline::classifier::{classify_error, Classification};
use crate::pipeline::synonyms::{Resolution, SynonymTable};
use crate::store::{BackingStore, RestStore};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vestry_contracts::{
    AdjustmentAction, CategoryRecord, FatalCause, FieldAdjustment, FieldValue, LedgerEntry,
    MemberProfile, Payload, PayloadError, RecordKey, RecordKind, WriteOutcome, WriteTarget,
};

/// Working state of one `save` call. Never shared between calls.
struct AttemptState {
    original: Payload,
    working: Payload,
    attempts: u32,
    retired: HashSet<String>,
    /// Working name to the caller's field whose value it carries. Fields
    /// created by a merge have no entry.
    origins: HashMap<String, String>,
    /// Retired name to the name its value moved to.
    moved: HashMap<String, String>,
    adjustments: IndexMap<String, AdjustmentAction>,
}

impl AttemptState {
    fn new(payload: Payload) -> Self {
        let origins = payload
            .field_names()
            .into_iter()
            .map(|name| (name.clone(), name))
            .collect();
        Self {
            original: payload.clone(),
            working: payload,
            attempts: 0,
            retired: HashSet::new(),
            origins,
            moved: HashMap::new(),
            adjustments: IndexMap::new(),
        }
    }

    /// Name currently holding the value first sent as `name`, or `None` if
    /// that value was dropped.
    fn live_name(&self, name: &str) -> Option<String> {
        let mut cursor = name.to_string();
        for _ in 0..=self.moved.len() {
            if !self.retired.contains(&cursor) {
                return Some(cursor);
            }
            cursor = self.moved.get(&cursor)?.clone();
        }
        None
    }

    /// Points merges recorded against `from` at `to`, or marks them dropped.
    fn retarget_merges(&mut self, from: &str, to: Option<&str>) {
        for action in self.adjustments.values_mut() {
            let AdjustmentAction::Merged { into, .. } = action else {
                continue;
            };
            if into.as_str() != from {
                continue;
            }
            match to {
                Some(next) => *into = next.to_string(),
                None => *action = AdjustmentAction::Dropped,
            }
        }
    }

    /// Removes `field` from the working payload and records what became of
    /// its value against the caller's original field name.
    fn apply(&mut self, field: &str, resolution: Resolution) {
        let origin = self.origins.remove(field);
        let value = self.working.remove(field).unwrap_or(FieldValue::Null);
        self.retired.insert(field.to_string());

        let (action, destination) = match resolution {
            Resolution::RenameTo(next) => {
                if !self.working.contains(&next) {
                    self.working.set(next.clone(), value);
                    if let Some(origin) = &origin {
                        self.origins.insert(next.clone(), origin.clone());
                    }
                }
                (AdjustmentAction::Renamed { to: next.clone() }, Some(next))
            }
            Resolution::MergeInto { target, label } => {
                let live = self.live_name(&target).filter(|live| live.as_str() != field);
                match (live, value.merge_text()) {
                    (Some(live), Some(text)) => {
                        let existing = self.working.get(&live).and_then(FieldValue::merge_text);
                        let merged = match existing {
                            Some(existing) => format!("{existing} | {label}: {text}"),
                            None => format!("{label}: {text}"),
                        };
                        self.working.set(live.clone(), FieldValue::Text(merged));
                        (
                            AdjustmentAction::Merged {
                                into: live.clone(),
                                label,
                            },
                            Some(live),
                        )
                    }
                    _ => (AdjustmentAction::Dropped, None),
                }
            }
            Resolution::Drop => (AdjustmentAction::Dropped, None),
        };

        self.retarget_merges(field, destination.as_deref());
        if let Some(next) = destination {
            self.moved.insert(field.to_string(), next);
        }
        if let Some(origin) = origin {
            self.adjustments.insert(origin, action);
        }
    }

    fn fatal(&self, cause: FatalCause) -> WriteOutcome {
        WriteOutcome::Fatal {
            cause,
            attempts: self.attempts,
        }
    }

    fn finish(self, table: &str) -> WriteOutcome {
        if self.adjustments.is_empty() {
            debug!(%table, attempts = self.attempts, "Write succeeded");
            return WriteOutcome::Success {
                fields: self.working.field_names(),
                attempts: self.attempts,
            };
        }

        warn!(
            %table,
            attempts = self.attempts,
            original_fields = self.original.len(),
            sent_fields = self.working.len(),
            adjusted = self.adjustments.len(),
            "Write succeeded with adjusted fields"
        );
        WriteOutcome::PartialSuccess {
            adjustments: self
                .adjustments
                .into_iter()
                .map(|(field, action)| FieldAdjustment { field, action })
                .collect(),
            payload: self.working,
            attempts: self.attempts,
        }
    }
}

/// Persists records through a [`BackingStore`] whose column set may differ
/// from the client's field names.
///
/// Each rejected unknown field is renamed, merged or dropped and the write
/// retried, one field per attempt, until the store accepts the payload or
/// the attempt budget runs out. Every other failure ends the save at once.
#[derive(Clone)]
pub struct RecordWriter {
    store: Arc<dyn BackingStore>,
    synonyms: SynonymTable,
    budget: AttemptBudget,
    tables: TableNames,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self {
            store,
            synonyms: SynonymTable::defaults(),
            budget: AttemptBudget::default(),
            tables: TableNames::default(),
        }
    }

    pub fn from_config(config: &VestryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let store = RestStore::new(&config.store)?;
        Ok(Self::new(Arc::new(store))
            .with_synonyms(config.synonym_table()?)
            .with_budget(AttemptBudget::new(config.attempt_budget))
            .with_tables(config.tables.clone()))
    }

    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn with_budget(mut self, budget: AttemptBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_tables(mut self, tables: TableNames) -> Self {
        self.tables = tables;
        self
    }

    pub fn budget(&self) -> AttemptBudget {
        self.budget
    }

    pub async fn save(&self, target: &WriteTarget, payload: Payload) -> WriteOutcome {
        if payload.kind() != target.kind {
            return WriteOutcome::Fatal {
                cause: FatalCause::KindMismatch {
                    expected: target.kind,
                    found: payload.kind(),
                },
                attempts: 0,
            };
        }

        let table = self.tables.for_kind(target.kind);
        let mut state = AttemptState::new(payload);

        loop {
            state.attempts += 1;
            debug!(
                attempt = state.attempts,
                max_attempts = self.budget.max_attempts(),
                %table,
                store = self.store.store_name(),
                fields = state.working.len(),
                "Writing record"
            );

            let result = match &target.key {
                Some(key) => self.store.update_by_key(table, key, &state.working).await,
                None => self.store.insert(table, &state.working).await,
            };
            let error = match result {
                Ok(()) => return state.finish(table),
                Err(error) => error,
            };

            let field = match classify_error(&error) {
                Classification::UnknownField(field) => field,
                Classification::NotClassified => {
                    warn!(%table, attempt = state.attempts, error = %error, "Write failed");
                    return state.fatal(FatalCause::Store { error });
                }
            };

            if !self.budget.allows_retry(state.attempts) {
                warn!(
                    %table,
                    %field,
                    budget = self.budget.max_attempts(),
                    "Attempt budget exhausted"
                );
                return state.fatal(FatalCause::BudgetExhausted {
                    budget: self.budget.max_attempts(),
                    last_error: error,
                });
            }

            if !state.working.contains(&field) {
                warn!(%table, %field, "Store rejected a field that was not sent");
                return state.fatal(FatalCause::UnresolvableField {
                    field,
                    last_error: error,
                });
            }

            let resolution =
                self.synonyms
                    .resolve(target.kind, &field, &state.working, &state.retired);
            info!(%table, %field, ?resolution, "Store has no such column; adapting payload");
            state.apply(&field, resolution);

            if state.working.is_empty() {
                return state.fatal(FatalCause::NothingToWrite { last_error: error });
            }
        }
    }

    pub async fn save_ledger_entry(
        &self,
        entry: &LedgerEntry,
        key: Option<RecordKey>,
    ) -> Result<WriteOutcome, PayloadError> {
        let payload = entry.to_payload()?;
        Ok(self
            .save(&target_for(RecordKind::LedgerEntry, key), payload)
            .await)
    }

    pub async fn save_member_profile(
        &self,
        profile: &MemberProfile,
        key: Option<RecordKey>,
    ) -> Result<WriteOutcome, PayloadError> {
        let payload = profile.to_payload()?;
        Ok(self
            .save(&target_for(RecordKind::MemberProfile, key), payload)
            .await)
    }

    pub async fn save_category(
        &self,
        category: &CategoryRecord,
        key: Option<RecordKey>,
    ) -> Result<WriteOutcome, PayloadError> {
        let payload = category.to_payload()?;
        Ok(self
            .save(&target_for(RecordKind::Category, key), payload)
            .await)
    }
}

fn target_for(kind: RecordKind, key: Option<RecordKey>) -> WriteTarget {
    WriteTarget { kind, key }
}

impl std::fmt::Debug for RecordWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordWriter")
            .field("store", &self.store.store_name())
            .field("budget", &self.budget)
            .field("tables", &self.tables)
            .finish()
    }
}

