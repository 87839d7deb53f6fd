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


use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A single payload value. Scalars, lists of strings and null are the only
/// shapes the backing store columns accept.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(Decimal),
    Text(String),
    TextList(Vec<String>),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text used when this value is folded into a free-text field.
    /// Returns `None` when there is nothing worth keeping.
    pub fn merge_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            FieldValue::TextList(items) => {
                let kept: Vec<&str> = items
                    .iter()
                    .map(|item| item.trim())
                    .filter(|item| !item.is_empty())
                    .collect();
                (!kept.is_empty()).then(|| kept.join(", "))
            }
            other => Some(other.to_string()),
        }
    }

    /// Converts a JSON value coming from outside the crate (e.g. a payload
    /// file). Objects and mixed arrays are refused.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(FieldValue::Null),
            Value::Bool(flag) => Ok(FieldValue::Bool(*flag)),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    return Ok(FieldValue::Integer(int));
                }
                let text = number.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(FieldValue::Decimal)
                    .map_err(|e| format!("number {text} is not a valid decimal: {e}"))
            }
            Value::String(text) => Ok(FieldValue::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| "lists may only contain strings".to_string())
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::TextList),
            Value::Object(_) => Err("nested objects are not supported".to_string()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(flag) => Value::Bool(*flag),
            FieldValue::Integer(int) => Value::from(*int),
            FieldValue::Decimal(decimal) => Value::String(decimal.to_string()),
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::TextList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            FieldValue::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(flag) => write!(f, "{flag}"),
            FieldValue::Integer(int) => write!(f, "{int}"),
            FieldValue::Decimal(decimal) => write!(f, "{decimal}"),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::TextList(items) => f.write_str(&items.join(", ")),
            FieldValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Bool(flag) => serializer.serialize_bool(*flag),
            FieldValue::Integer(int) => serializer.serialize_i64(*int),
            FieldValue::Decimal(decimal) => serializer.serialize_str(&decimal.to_string()),
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::TextList(items) => items.serialize(serializer),
            FieldValue::Date(date) => {
                serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::TextList(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}
