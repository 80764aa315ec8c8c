//! Table-driven drug interaction checks.
//!
//! Partner names are matched loosely: two names match when either contains the
//! other, case-insensitively. This tolerates brand/generic and strength suffixes
//! ("Aspirin 81mg") but also produces false positives for short or overlapping
//! names (a medicine called "K" matches the "vitamin k" rule).

pub mod table;

use crate::models::{Medicine, Severity};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub use table::{InteractionRule, InteractionTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResult {
    pub medicine1: String,
    pub medicine2: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub mild: usize,
    pub moderate: usize,
    pub severe: usize,
}

fn builtin_table() -> &'static InteractionTable {
    static TABLE: OnceLock<InteractionTable> = OnceLock::new();
    TABLE.get_or_init(InteractionTable::builtin)
}

/// Checks every pair against the bundled table.
pub fn check_drug_interactions(medicines: &[Medicine]) -> Vec<InteractionResult> {
    builtin_table().check(medicines)
}

pub fn severity_counts(results: &[InteractionResult]) -> SeverityCounts {
    results.iter().fold(SeverityCounts::default(), |mut counts, r| {
        match r.severity {
            Severity::Mild => counts.mild += 1,
            Severity::Moderate => counts.moderate += 1,
            Severity::Severe => counts.severe += 1,
        }
        counts
    })
}

fn names_overlap(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

impl InteractionTable {
    /// Reports one result per matching rule for every unordered pair, looking up
    /// both medicines' rules. Mirrored rules yield duplicate results.
    pub fn check(&self, medicines: &[Medicine]) -> Vec<InteractionResult> {
        let mut results = Vec::new();

        for (i, first) in medicines.iter().enumerate() {
            for second in &medicines[i + 1..] {
                let first_name = table::canonical(&first.name);
                let second_name = table::canonical(&second.name);

                let forward = self
                    .rules_for(&first_name)
                    .iter()
                    .filter(|rule| names_overlap(&second_name, &rule.drug));
                let backward = self
                    .rules_for(&second_name)
                    .iter()
                    .filter(|rule| names_overlap(&first_name, &rule.drug));

                for rule in forward.chain(backward) {
                    results.push(InteractionResult {
                        medicine1: first.name.clone(),
                        medicine2: second.name.clone(),
                        severity: rule.severity,
                        description: rule.description.clone(),
                    });
                }
            }
        }

        debug!(
            "Checked {} medicines, found {} interactions",
            medicines.len(),
            results.len()
        );
        results
    }
}
