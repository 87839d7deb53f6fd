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
use serde_json::{json, Map, Value};
use std::sync::Arc;
use vestry::{
    AdjustmentAction, CategoryRecord, EntryType, LedgerEntry, MemberProfile, MemoryStore,
    PayloadError, RecordKey, RecordKind, RecordWriter, WriteOutcome,
};

fn adjustments_of(outcome: &WriteOutcome) -> Vec<(String, AdjustmentAction)> {
    outcome
        .adjustments()
        .iter()
        .map(|adjustment| (adjustment.field.clone(), adjustment.action.clone()))
        .collect()
}

#[tokio::test]
async fn test_profile_lands_in_legacy_columns() {
    let store = Arc::new(MemoryStore::new().with_table("profiles", &["id", "full_name", "mobile", "bio"]));
    let writer = RecordWriter::new(store.clone());

    let mut profile = MemberProfile::new("Ana Lima");
    profile.phone = Some("+55 11 98888-0000".to_string());
    profile.notes = Some("sings in the choir".to_string());

    let outcome = writer.save_member_profile(&profile, None).await.unwrap();

    assert_eq!(outcome.attempts(), 6);
    assert_eq!(
        adjustments_of(&outcome),
        vec![
            (
                "phone".to_string(),
                AdjustmentAction::Renamed {
                    to: "mobile".to_string()
                }
            ),
            (
                "notes".to_string(),
                AdjustmentAction::Merged {
                    into: "bio".to_string(),
                    label: "Obs".to_string()
                }
            ),
        ]
    );

    let rows = store.rows("profiles").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["mobile"], json!("+55 11 98888-0000"));
    assert_eq!(rows[0]["bio"], json!("Obs: sings in the choir"));
}

#[tokio::test]
async fn test_category_kind_and_icon_renamed() {
    let store = Arc::new(MemoryStore::new().with_table("categories", &["id", "name", "type", "emoji"]));
    let writer = RecordWriter::new(store.clone());

    let mut category = CategoryRecord::new("Utilities");
    category.kind = Some(EntryType::Expense);
    category.icon = Some("bolt".to_string());

    let outcome = writer.save_category(&category, None).await.unwrap();

    assert_eq!(outcome.attempts(), 3);
    let rows = store.rows("categories").await;
    assert_eq!(rows[0]["type"], json!("expense"));
    assert_eq!(rows[0]["emoji"], json!("bolt"));
    assert!(rows[0].get("kind").is_none());
}

#[tokio::test]
async fn test_ledger_update_uses_key() {
    let key = RecordKey::new("entry-7");
    let mut existing = Map::new();
    existing.insert("description".to_string(), Value::from("Rent"));
    existing.insert("amount".to_string(), Value::from("900.00"));
    let store = Arc::new(
        MemoryStore::new()
            .with_table("ledger_entries", &["id", "description", "amount", "date"])
            .with_row("ledger_entries", key.clone(), existing),
    );
    let writer = RecordWriter::new(store.clone());

    let mut entry = LedgerEntry::new("Rent", Decimal::new(95000, 2));
    entry.entry_date = NaiveDate::from_ymd_opt(2024, 3, 10);

    let outcome = writer
        .save_ledger_entry(&entry, Some(key.clone()))
        .await
        .unwrap();

    assert!(outcome.is_persisted());
    assert_eq!(outcome.attempts(), 2);
    let attempts = store.attempts().await;
    assert!(attempts.iter().all(|attempt| attempt.key.as_ref() == Some(&key)));

    let row = store.row("ledger_entries", &key).await.unwrap();
    assert_eq!(row["date"], json!("2024-03-10"));
    assert_eq!(row["amount"], json!("950.00"));
}

#[tokio::test]
async fn test_blank_name_never_reaches_store() {
    let store = Arc::new(MemoryStore::new().with_table("profiles", &["id", "full_name"]));
    let writer = RecordWriter::new(store.clone());

    let error = writer
        .save_member_profile(&MemberProfile::new("   "), None)
        .await
        .unwrap_err();

    assert_eq!(
        error,
        PayloadError::MissingRequired {
            kind: RecordKind::MemberProfile,
            field: "full_name".to_string(),
        }
    );
    assert!(store.attempts().await.is_empty());
}
