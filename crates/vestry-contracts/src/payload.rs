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


use crate::kinds::RecordKind;
use crate::value::FieldValue;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Unknown record kind: {0}")]
    UnknownKind(String),
    #[error("Field '{field}' is not a {kind} field")]
    UnknownField { kind: RecordKind, field: String },
    #[error("Field '{0}' given more than once")]
    DuplicateField(String),
    #[error("Required {kind} field '{field}' is missing")]
    MissingRequired { kind: RecordKind, field: String },
    #[error("Field '{field}' has an unsupported value: {reason}")]
    UnsupportedValue { field: String, reason: String },
    #[error("Payload must be a JSON object")]
    NotAnObject,
}

/// Ordered field-name to value mapping for one record.
///
/// `build` and `from_json` only accept the kind's canonical fields. The
/// mutators (`set`, `remove`) skip that check so the write pipeline can
/// carry synonym names on its working copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    kind: RecordKind,
    fields: IndexMap<String, FieldValue>,
}

impl Payload {
    pub fn build<K, I>(kind: RecordKind, entries: I) -> Result<Self, PayloadError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        let mut fields = IndexMap::new();
        for (name, value) in entries {
            let name = name.into();
            if !kind.is_canonical(&name) {
                return Err(PayloadError::UnknownField { kind, field: name });
            }
            if fields.contains_key(&name) {
                return Err(PayloadError::DuplicateField(name));
            }
            fields.insert(name, value);
        }

        for required in kind.required_fields() {
            match fields.get(*required) {
                Some(value) if !value.is_null() => {}
                _ => {
                    return Err(PayloadError::MissingRequired {
                        kind,
                        field: (*required).to_string(),
                    })
                }
            }
        }

        Ok(Self { kind, fields })
    }

    pub fn from_json(kind: RecordKind, value: &Value) -> Result<Self, PayloadError> {
        let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
        let mut entries = Vec::with_capacity(object.len());
        for (name, raw) in object {
            let converted =
                FieldValue::from_json(raw).map_err(|reason| PayloadError::UnsupportedValue {
                    field: name.clone(),
                    reason,
                })?;
            entries.push((name.clone(), converted));
        }
        Self::build(kind, entries)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
