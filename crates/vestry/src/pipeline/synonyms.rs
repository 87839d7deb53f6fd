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


use std::collections::{HashMap, HashSet};
use vestry_contracts::{Payload, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynonymAction {
    RenameTo(String),
    /// Terminal: append `"<label>: <value>"` to the free-text `target`.
    MergeInto { target: String, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymRule {
    pub from: String,
    pub action: SynonymAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    RenameTo(String),
    MergeInto { target: String, label: String },
    Drop,
}

/// Per-kind remap rules for fields the store rejects.
///
/// A chain `notes -> observation -> obs -> merge(description)` is stored as
/// consecutive rules; the first rule whose `from` matches wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    rules: HashMap<RecordKind, Vec<SynonymRule>>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::defaults()
    }
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn defaults() -> Self {
        use RecordKind::{Category, LedgerEntry, MemberProfile};

        Self::empty()
            .with_chain(LedgerEntry, "attachment_urls", &["attachments", "receipt_urls"], None)
            .with_chain(
                LedgerEntry,
                "notes",
                &["observation", "obs", "memo", "comments"],
                Some(("description", "Obs")),
            )
            .with_chain(LedgerEntry, "category", &["category_name"], None)
            .with_chain(
                LedgerEntry,
                "payment_method",
                &["method"],
                Some(("description", "Payment")),
            )
            .with_chain(LedgerEntry, "entry_date", &["date", "transaction_date"], None)
            .with_chain(LedgerEntry, "member_id", &["donor_id"], None)
            .with_chain(
                LedgerEntry,
                "department",
                &["cost_center"],
                Some(("description", "Dept")),
            )
            .with_chain(
                LedgerEntry,
                "reference",
                &["reference_code"],
                Some(("description", "Ref")),
            )
            .with_chain(MemberProfile, "full_name", &["name"], None)
            .with_chain(MemberProfile, "phone", &["phone_number", "mobile"], None)
            .with_chain(MemberProfile, "birth_date", &["birthday", "date_of_birth"], None)
            .with_chain(MemberProfile, "avatar_url", &["photo_url"], None)
            .with_chain(MemberProfile, "departments", &["ministries"], None)
            .with_chain(MemberProfile, "address", &["street_address"], None)
            .with_chain(MemberProfile, "marital_status", &["civil_status"], None)
            .with_chain(MemberProfile, "baptism_date", &["baptized_at"], None)
            .with_chain(MemberProfile, "membership_status", &["status"], None)
            .with_chain(MemberProfile, "bio", &["about"], None)
            .with_chain(
                MemberProfile,
                "notes",
                &["observation", "obs"],
                Some(("bio", "Obs")),
            )
            .with_chain(Category, "color", &["colour", "hex_color"], None)
            .with_chain(Category, "icon", &["emoji"], None)
            .with_chain(Category, "kind", &["type", "category_type"], None)
            .with_chain(Category, "parent_id", &["parent_category_id"], None)
            .with_chain(Category, "description", &["details"], None)
            .with_chain(Category, "notes", &[], Some(("description", "Obs")))
    }

    pub fn with_rule(mut self, kind: RecordKind, from: &str, action: SynonymAction) -> Self {
        self.rules.entry(kind).or_default().push(SynonymRule {
            from: from.to_string(),
            action,
        });
        self
    }

    /// Replaces the rule for `from`, or adds one if there is none.
    pub fn with_override(mut self, kind: RecordKind, from: &str, action: SynonymAction) -> Self {
        let rules = self.rules.entry(kind).or_default();
        match rules.iter_mut().find(|rule| rule.from == from) {
            Some(rule) => rule.action = action,
            None => rules.push(SynonymRule {
                from: from.to_string(),
                action,
            }),
        }
        self
    }

    /// Adds `head -> fallbacks[0] -> ... -> fallbacks[n-1]`, optionally
    /// ending in a merge of the last name into `(target, label)`.
    pub fn with_chain(
        mut self,
        kind: RecordKind,
        head: &str,
        fallbacks: &[&str],
        merge: Option<(&str, &str)>,
    ) -> Self {
        let mut previous = head;
        for &next in fallbacks {
            self = self.with_rule(kind, previous, SynonymAction::RenameTo(next.to_string()));
            previous = next;
        }
        if let Some((target, label)) = merge {
            self = self.with_rule(
                kind,
                previous,
                SynonymAction::MergeInto {
                    target: target.to_string(),
                    label: label.to_string(),
                },
            );
        }
        self
    }

    pub fn rules(&self, kind: RecordKind) -> &[SynonymRule] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rule_for(&self, kind: RecordKind, field: &str) -> Option<&SynonymAction> {
        self.rules(kind)
            .iter()
            .find(|rule| rule.from == field)
            .map(|rule| &rule.action)
    }

    /// Returns the first rename loop found for `kind`, as the sequence of
    /// names walked until a name repeats.
    pub fn find_cycle(&self, kind: RecordKind) -> Option<Vec<String>> {
        for rule in self.rules(kind) {
            let mut path = vec![rule.from.clone()];
            let mut cursor = rule.from.as_str();
            while let Some(SynonymAction::RenameTo(next)) = self.rule_for(kind, cursor) {
                if path.iter().any(|seen| seen == next) {
                    path.push(next.clone());
                    return Some(path);
                }
                path.push(next.clone());
                cursor = next.as_str();
            }
        }
        None
    }

    /// Number of rules that can fire in sequence starting from `field`.
    pub fn chain_length(&self, kind: RecordKind, field: &str) -> usize {
        let mut seen = HashSet::from([field.to_string()]);
        let mut cursor = field.to_string();
        let mut length = 0;
        while let Some(action) = self.rule_for(kind, &cursor) {
            length += 1;
            match action {
                SynonymAction::RenameTo(next) if seen.insert(next.clone()) => {
                    cursor = next.clone();
                }
                _ => break,
            }
        }
        length
    }

    /// Decides what to do with `field` after the store rejected it.
    ///
    /// Rename targets already in `retired` are skipped by following their own
    /// rule, so a name the store refused earlier is never sent again. A loop
    /// in the rules ends in `Drop`. Merge targets are returned as written;
    /// the writer redirects them to wherever the target's value now lives.
    pub fn resolve(
        &self,
        kind: RecordKind,
        field: &str,
        payload: &Payload,
        retired: &HashSet<String>,
    ) -> Resolution {
        let current = payload.get(field);
        let mut visited = HashSet::from([field.to_string()]);
        let mut cursor = field.to_string();

        loop {
            match self.rule_for(kind, &cursor) {
                None => return Resolution::Drop,
                Some(SynonymAction::RenameTo(next)) => {
                    if !visited.insert(next.clone()) {
                        return Resolution::Drop;
                    }
                    if retired.contains(next) {
                        cursor = next.clone();
                        continue;
                    }
                    return match payload.get(next) {
                        Some(existing) if Some(existing) != current => Resolution::Drop,
                        _ => Resolution::RenameTo(next.clone()),
                    };
                }
                Some(SynonymAction::MergeInto { target, label }) => {
                    if target == field {
                        return Resolution::Drop;
                    }
                    return Resolution::MergeInto {
                        target: target.clone(),
                        label: label.clone(),
                    };
                }
            }
        }
    }
}
