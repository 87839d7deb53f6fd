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

use std::collections::HashSet;
use vestry::{FieldValue, Payload, RecordKind, Resolution, SynonymAction, SynonymTable};

fn profile(entries: Vec<(&str, FieldValue)>) -> Payload {
    Payload::build(RecordKind::MemberProfile, entries).unwrap()
}

fn retired(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_default_tables_are_acyclic() {
    let table = SynonymTable::defaults();
    for kind in RecordKind::ALL {
        assert_eq!(table.find_cycle(kind), None, "cycle in {kind} rules");
    }
}

#[test]
fn test_default_rules_have_unique_heads() {
    let table = SynonymTable::defaults();
    for kind in RecordKind::ALL {
        let rules = table.rules(kind);
        assert!(!rules.is_empty());
        let heads: HashSet<&str> = rules.iter().map(|rule| rule.from.as_str()).collect();
        assert_eq!(heads.len(), rules.len(), "duplicate rule heads for {kind}");
    }
}

#[test]
fn test_ledger_notes_chain() {
    let table = SynonymTable::defaults();
    assert_eq!(
        table.rule_for(RecordKind::LedgerEntry, "notes"),
        Some(&SynonymAction::RenameTo("observation".to_string()))
    );
    assert_eq!(
        table.rule_for(RecordKind::LedgerEntry, "comments"),
        Some(&SynonymAction::MergeInto {
            target: "description".to_string(),
            label: "Obs".to_string(),
        })
    );
    assert_eq!(table.chain_length(RecordKind::LedgerEntry, "notes"), 5);
    assert_eq!(table.chain_length(RecordKind::LedgerEntry, "amount"), 0);
}

#[test]
fn test_rename_skips_names_already_rejected() {
    let table = SynonymTable::defaults();
    let payload = Payload::build(
        RecordKind::LedgerEntry,
        vec![
            ("description", FieldValue::from("Offering")),
            ("amount", FieldValue::Integer(10)),
            ("notes", FieldValue::from("n")),
        ],
    )
    .unwrap();

    assert_eq!(
        table.resolve(
            RecordKind::LedgerEntry,
            "notes",
            &payload,
            &retired(&["observation", "obs"])
        ),
        Resolution::RenameTo("memo".to_string())
    );
}

#[test]
fn test_rename_onto_conflicting_value_drops_instead() {
    let table = SynonymTable::defaults();
    let mut payload = profile(vec![
        ("full_name", FieldValue::from("Ana Lima")),
        ("phone", FieldValue::from("+55 11 99999-0000")),
    ]);
    payload.set("phone_number", FieldValue::from("+55 11 98888-1111"));

    assert_eq!(
        table.resolve(RecordKind::MemberProfile, "phone", &payload, &HashSet::new()),
        Resolution::Drop
    );

    payload.set("phone_number", FieldValue::from("+55 11 99999-0000"));
    assert_eq!(
        table.resolve(RecordKind::MemberProfile, "phone", &payload, &HashSet::new()),
        Resolution::RenameTo("phone_number".to_string())
    );
}

#[test]
fn test_merge_target_is_kept_when_retired() {
    let table = SynonymTable::defaults();
    let payload = profile(vec![
        ("full_name", FieldValue::from("Ana Lima")),
        ("notes", FieldValue::from("prefers evening visits")),
    ]);

    assert_eq!(
        table.resolve(
            RecordKind::MemberProfile,
            "notes",
            &payload,
            &retired(&["observation", "obs"])
        ),
        Resolution::MergeInto {
            target: "bio".to_string(),
            label: "Obs".to_string(),
        }
    );
    assert_eq!(
        table.resolve(
            RecordKind::MemberProfile,
            "notes",
            &payload,
            &retired(&["observation", "obs", "bio"])
        ),
        Resolution::MergeInto {
            target: "bio".to_string(),
            label: "Obs".to_string(),
        }
    );
}

#[test]
fn test_merge_into_itself_drops() {
    let table = SynonymTable::empty().with_rule(
        RecordKind::Category,
        "notes",
        SynonymAction::MergeInto {
            target: "notes".to_string(),
            label: "Obs".to_string(),
        },
    );
    let payload = Payload::build(
        RecordKind::Category,
        vec![
            ("name", FieldValue::from("Rent")),
            ("notes", FieldValue::from("monthly")),
        ],
    )
    .unwrap();

    assert_eq!(
        table.resolve(RecordKind::Category, "notes", &payload, &retired(&[])),
        Resolution::Drop
    );
}

#[test]
fn test_unmapped_field_drops() {
    let table = SynonymTable::defaults();
    let payload = profile(vec![
        ("full_name", FieldValue::from("Ana Lima")),
        ("gender", FieldValue::from("f")),
    ]);
    assert_eq!(
        table.resolve(RecordKind::MemberProfile, "gender", &payload, &HashSet::new()),
        Resolution::Drop
    );
}

#[test]
fn test_cycle_resolves_to_drop() {
    let table = SynonymTable::empty()
        .with_rule(
            RecordKind::Category,
            "icon",
            SynonymAction::RenameTo("emoji".to_string()),
        )
        .with_rule(
            RecordKind::Category,
            "emoji",
            SynonymAction::RenameTo("icon".to_string()),
        );
    let cycle = table.find_cycle(RecordKind::Category).unwrap();
    assert_eq!(cycle, vec!["icon", "emoji", "icon"]);

    let mut payload =
        Payload::build(RecordKind::Category, vec![("name", FieldValue::from("Rent"))]).unwrap();
    payload.set("emoji", FieldValue::from("🏠"));
    assert_eq!(
        table.resolve(RecordKind::Category, "emoji", &payload, &retired(&["icon"])),
        Resolution::Drop
    );
}
