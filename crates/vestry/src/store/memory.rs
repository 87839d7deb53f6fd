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


use super::BackingStore;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;
use vestry_contracts::{FieldValue, Payload, RecordKey, StoreError};

/// Which backend layer the in-memory store imitates when a column is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingColumnStyle {
    #[default]
    Postgres,
    SchemaCache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub table: String,
    pub key: Option<RecordKey>,
    pub fields: Vec<String>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    columns: HashSet<String>,
    non_negative: HashSet<String>,
    rows: IndexMap<String, Map<String, Value>>,
}

/// Store with a fixed column set per table. Rejects unknown columns with the
/// same message text a hosted backend would produce and journals every
/// attempted write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    style: MissingColumnStyle,
    tables: RwLock<HashMap<String, MemoryTable>>,
    journal: RwLock<Vec<AttemptRecord>>,
    injected: Mutex<VecDeque<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: MissingColumnStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_table<S: AsRef<str>>(mut self, table: &str, columns: &[S]) -> Self {
        let entry = self.tables.get_mut().entry(table.to_string()).or_default();
        entry
            .columns
            .extend(columns.iter().map(|column| column.as_ref().to_string()));
        self
    }

    /// Adds a check constraint rejecting negative numbers in `column`.
    pub fn with_non_negative(mut self, table: &str, column: &str) -> Self {
        self.tables
            .get_mut()
            .entry(table.to_string())
            .or_default()
            .non_negative
            .insert(column.to_string());
        self
    }

    pub fn with_row(mut self, table: &str, key: impl Into<RecordKey>, row: Map<String, Value>) -> Self {
        let key = key.into();
        self.tables
            .get_mut()
            .entry(table.to_string())
            .or_default()
            .rows
            .insert(key.to_string(), row);
        self
    }

    /// The next write fails with `error` before any column checks.
    pub async fn fail_next(&self, error: StoreError) {
        self.injected.lock().await.push_back(error);
    }

    pub async fn attempts(&self) -> Vec<AttemptRecord> {
        self.journal.read().await.clone()
    }

    pub async fn rows(&self, table: &str) -> Vec<Map<String, Value>> {
        self.tables
            .read()
            .await
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn row(&self, table: &str, key: &RecordKey) -> Option<Map<String, Value>> {
        self.tables
            .read()
            .await
            .get(table)
            .and_then(|t| t.rows.get(key.as_str()).cloned())
    }

    async fn record_attempt(&self, table: &str, key: Option<&RecordKey>, payload: &Payload) {
        self.journal.write().await.push(AttemptRecord {
            table: table.to_string(),
            key: key.cloned(),
            fields: payload.field_names(),
        });
    }

    fn check(&self, table_name: &str, table: &MemoryTable, payload: &Payload) -> Result<(), StoreError> {
        for (field, value) in payload.iter() {
            if !table.columns.contains(field) {
                return Err(self.missing_column(table_name, field));
            }
            if table.non_negative.contains(field) && is_negative(value) {
                return Err(StoreError::Rejected {
                    status: Some(400),
                    code: Some("23514".to_string()),
                    message: format!(
                        "new row for relation \"{table_name}\" violates check constraint \"{table_name}_{field}_check\""
                    ),
                });
            }
        }
        Ok(())
    }

    fn missing_column(&self, table: &str, field: &str) -> StoreError {
        match self.style {
            MissingColumnStyle::Postgres => StoreError::Rejected {
                status: Some(400),
                code: Some("42703".to_string()),
                message: format!("column \"{field}\" of relation \"{table}\" does not exist"),
            },
            MissingColumnStyle::SchemaCache => StoreError::Rejected {
                status: Some(400),
                code: Some("PGRST204".to_string()),
                message: format!(
                    "Could not find the '{field}' column of '{table}' in the schema cache"
                ),
            },
        }
    }
}

fn is_negative(value: &FieldValue) -> bool {
    match value {
        FieldValue::Integer(int) => *int < 0,
        FieldValue::Decimal(decimal) => decimal.is_sign_negative() && !decimal.is_zero(),
        _ => false,
    }
}

fn missing_table(table: &str) -> StoreError {
    StoreError::Rejected {
        status: Some(404),
        code: Some("42P01".to_string()),
        message: format!("relation \"public.{table}\" does not exist"),
    }
}

fn row_from(payload: &Payload) -> Map<String, Value> {
    payload
        .iter()
        .map(|(field, value)| (field.to_string(), value.to_json()))
        .collect()
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn insert(&self, table: &str, payload: &Payload) -> Result<(), StoreError> {
        self.record_attempt(table, None, payload).await;
        if let Some(error) = self.injected.lock().await.pop_front() {
            return Err(error);
        }

        let mut tables = self.tables.write().await;
        let target = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        self.check(table, target, payload)?;

        let mut row = row_from(payload);
        let id = Uuid::new_v4().to_string();
        row.insert("id".to_string(), Value::String(id.clone()));
        target.rows.insert(id.clone(), row);
        debug!(%table, %id, "Inserted in-memory row");
        Ok(())
    }

    async fn update_by_key(
        &self,
        table: &str,
        key: &RecordKey,
        payload: &Payload,
    ) -> Result<(), StoreError> {
        self.record_attempt(table, Some(key), payload).await;
        if let Some(error) = self.injected.lock().await.pop_front() {
            return Err(error);
        }

        let mut tables = self.tables.write().await;
        let target = tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        self.check(table, target, payload)?;

        let row = target
            .rows
            .get_mut(key.as_str())
            .ok_or_else(|| StoreError::NotFound(format!("{table} {key}")))?;
        row.extend(row_from(payload));
        debug!(%table, %key, "Updated in-memory row");
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
