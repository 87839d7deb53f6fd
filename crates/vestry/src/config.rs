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


use crate::pipeline::budget::DEFAULT_ATTEMPT_BUDGET;
use crate::pipeline::synonyms::{SynonymAction, SynonymTable};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;
use vestry_contracts::RecordKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVariable(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Invalid store URL '{0}'")]
    InvalidUrl(String),
    #[error("Attempt budget must be at least 1")]
    ZeroBudget,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("Synonym rule for {kind} field '{from}' must set exactly one of rename_to or merge_into")]
    InvalidSynonym { kind: RecordKind, from: String },
    #[error("Synonym rules for {kind} loop: {path}")]
    SynonymCycle { kind: RecordKind, path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VestryConfig {
    pub store: StoreConfig,
    #[serde(default = "default_attempt_budget")]
    pub attempt_budget: u32,
    #[serde(default)]
    pub tables: TableNames,
    /// Replacements for the default rule of the same field.
    #[serde(default)]
    pub synonyms: Vec<SynonymOverride>,
}

/// One `[[synonyms]]` entry, e.g.
///
/// ```toml
/// [[synonyms]]
/// kind = "category"
/// from = "icon"
/// rename_to = "glyph"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymOverride {
    pub kind: String,
    pub from: String,
    #[serde(default)]
    pub rename_to: Option<String>,
    #[serde(default)]
    pub merge_into: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    #[serde(default = "default_ledger_table")]
    pub ledger_entries: String,
    #[serde(default = "default_profile_table")]
    pub profiles: String,
    #[serde(default = "default_category_table")]
    pub categories: String,
}

fn default_attempt_budget() -> u32 {
    DEFAULT_ATTEMPT_BUDGET
}
fn default_timeout_seconds() -> u64 {
    30
}
fn default_ledger_table() -> String {
    RecordKind::LedgerEntry.default_table().to_string()
}
fn default_profile_table() -> String {
    RecordKind::MemberProfile.default_table().to_string()
}
fn default_category_table() -> String {
    RecordKind::Category.default_table().to_string()
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            ledger_entries: default_ledger_table(),
            profiles: default_profile_table(),
            categories: default_category_table(),
        }
    }
}

impl TableNames {
    pub fn for_kind(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::LedgerEntry => &self.ledger_entries,
            RecordKind::MemberProfile => &self.profiles,
            RecordKind::Category => &self.categories,
        }
    }
}

impl VestryConfig {
    /// Reads `VESTRY_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let required = |key: &str| -> Result<String, ConfigError> {
            env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
        };
        let parsed = |key: &str, fallback: u64| -> Result<u64, ConfigError> {
            match env::var(key) {
                Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                }),
                Err(_) => Ok(fallback),
            }
        };

        let budget = parsed("VESTRY_ATTEMPT_BUDGET", u64::from(DEFAULT_ATTEMPT_BUDGET))?;
        let attempt_budget = u32::try_from(budget).map_err(|_| ConfigError::InvalidValue {
            key: "VESTRY_ATTEMPT_BUDGET".to_string(),
            value: budget.to_string(),
        })?;

        let mut tables = TableNames::default();
        if let Ok(name) = env::var("VESTRY_TABLE_LEDGER") {
            tables.ledger_entries = name;
        }
        if let Ok(name) = env::var("VESTRY_TABLE_PROFILES") {
            tables.profiles = name;
        }
        if let Ok(name) = env::var("VESTRY_TABLE_CATEGORIES") {
            tables.categories = name;
        }

        let config = Self {
            store: StoreConfig {
                base_url: required("VESTRY_STORE_URL")?,
                api_key: required("VESTRY_STORE_API_KEY")?,
                access_token: env::var("VESTRY_STORE_TOKEN").ok().filter(|t| !t.is_empty()),
                timeout_seconds: parsed("VESTRY_TIMEOUT_SECS", default_timeout_seconds())?,
            },
            attempt_budget,
            tables,
            synonyms: Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempt_budget == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        self.store.parsed_url()?;
        self.synonym_table()?;
        Ok(())
    }

    /// Default rules with this config's overrides applied. Fails if an
    /// override is malformed or makes a rename chain loop.
    pub fn synonym_table(&self) -> Result<SynonymTable, ConfigError> {
        let mut table = SynonymTable::defaults();
        for entry in &self.synonyms {
            let kind: RecordKind = entry.kind.parse().map_err(|_| ConfigError::InvalidValue {
                key: "synonyms.kind".to_string(),
                value: entry.kind.clone(),
            })?;
            let action = match (&entry.rename_to, &entry.merge_into) {
                (Some(next), None) => SynonymAction::RenameTo(next.clone()),
                (None, Some(target)) => SynonymAction::MergeInto {
                    target: target.clone(),
                    label: entry.label.clone().unwrap_or_else(|| entry.from.clone()),
                },
                _ => {
                    return Err(ConfigError::InvalidSynonym {
                        kind,
                        from: entry.from.clone(),
                    })
                }
            };
            table = table.with_override(kind, &entry.from, action);
        }

        for kind in RecordKind::ALL {
            if let Some(path) = table.find_cycle(kind) {
                return Err(ConfigError::SynonymCycle {
                    kind,
                    path: path.join(" -> "),
                });
            }
        }
        Ok(table)
    }
}

impl StoreConfig {
    pub fn parsed_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ConfigError::InvalidUrl(self.base_url.clone())),
        }
    }
}
