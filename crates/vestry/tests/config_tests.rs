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

use std::io::Write;
use tempfile::NamedTempFile;
use vestry::{ConfigError, RecordKind, SynonymAction, VestryConfig, DEFAULT_ATTEMPT_BUDGET};

const MINIMAL: &str = r#"
[store]
base_url = "https://db.example.org/rest/v1"
api_key = "anon-key"
"#;

#[test]
fn test_minimal_toml_uses_defaults() {
    let config = VestryConfig::from_toml_str(MINIMAL).unwrap();

    assert_eq!(config.attempt_budget, DEFAULT_ATTEMPT_BUDGET);
    assert_eq!(config.store.timeout_seconds, 30);
    assert!(config.store.access_token.is_none());
    assert_eq!(config.tables.for_kind(RecordKind::LedgerEntry), "ledger_entries");
    assert_eq!(config.tables.for_kind(RecordKind::MemberProfile), "profiles");
    assert_eq!(config.tables.for_kind(RecordKind::Category), "categories");
}

#[test]
fn test_table_overrides_and_budget() {
    let content = r#"
attempt_budget = 4

[store]
base_url = "http://localhost:54321/rest/v1"
api_key = "anon-key"
access_token = "member-jwt"
timeout_seconds = 5

[tables]
ledger_entries = "transacoes"
"#;
    let config = VestryConfig::from_toml_str(content).unwrap();

    assert_eq!(config.attempt_budget, 4);
    assert_eq!(config.store.access_token.as_deref(), Some("member-jwt"));
    assert_eq!(config.tables.ledger_entries, "transacoes");
    assert_eq!(config.tables.profiles, "profiles");
}

#[test]
fn test_zero_budget_is_rejected() {
    let content = format!("attempt_budget = 0\n{MINIMAL}");
    let error = VestryConfig::from_toml_str(&content).unwrap_err();
    assert!(matches!(error, ConfigError::ZeroBudget));
}

#[test]
fn test_non_http_url_is_rejected() {
    let content = r#"
[store]
base_url = "ftp://db.example.org"
api_key = "anon-key"
"#;
    let error = VestryConfig::from_toml_str(content).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidUrl(url) if url == "ftp://db.example.org"));
}

#[test]
fn test_missing_store_section_is_parse_error() {
    let error = VestryConfig::from_toml_str("attempt_budget = 3").unwrap_err();
    assert!(matches!(error, ConfigError::Toml(_)));
}

#[test]
fn test_load_reads_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();

    let config = VestryConfig::load(file.path()).unwrap();
    assert_eq!(config.store.api_key, "anon-key");
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let error = VestryConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(error, ConfigError::Io(_)));
}

#[test]
fn test_synonym_override_replaces_default_rule() {
    let content = format!(
        r#"{MINIMAL}
[[synonyms]]
kind = "category"
from = "icon"
rename_to = "glyph"

[[synonyms]]
kind = "ledger"
from = "memo"
merge_into = "description"
label = "Memo"
"#
    );
    let config = VestryConfig::from_toml_str(&content).unwrap();
    let table = config.synonym_table().unwrap();

    assert_eq!(
        table.rule_for(RecordKind::Category, "icon"),
        Some(&SynonymAction::RenameTo("glyph".to_string()))
    );
    assert_eq!(
        table.rule_for(RecordKind::LedgerEntry, "memo"),
        Some(&SynonymAction::MergeInto {
            target: "description".to_string(),
            label: "Memo".to_string(),
        })
    );
    assert_eq!(
        table.rule_for(RecordKind::Category, "color"),
        Some(&SynonymAction::RenameTo("colour".to_string()))
    );
}

#[test]
fn test_cyclic_synonym_override_is_rejected() {
    let content = format!(
        r#"{MINIMAL}
[[synonyms]]
kind = "category"
from = "emoji"
rename_to = "icon"
"#
    );
    let error = VestryConfig::from_toml_str(&content).unwrap_err();
    match error {
        ConfigError::SynonymCycle { kind, path } => {
            assert_eq!(kind, RecordKind::Category);
            assert_eq!(path, "icon -> emoji -> icon");
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn test_malformed_synonym_override_is_rejected() {
    let both = format!(
        r#"{MINIMAL}
[[synonyms]]
kind = "profile"
from = "notes"
rename_to = "remarks"
merge_into = "bio"
"#
    );
    assert!(matches!(
        VestryConfig::from_toml_str(&both).unwrap_err(),
        ConfigError::InvalidSynonym { from, .. } if from == "notes"
    ));

    let unknown_kind = format!(
        r#"{MINIMAL}
[[synonyms]]
kind = "donation"
from = "notes"
rename_to = "remarks"
"#
    );
    assert!(matches!(
        VestryConfig::from_toml_str(&unknown_kind).unwrap_err(),
        ConfigError::InvalidValue { value, .. } if value == "donation"
    ));
}
