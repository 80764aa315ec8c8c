use crate::error::{TrackerError, TrackerResult};
use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// One known interaction partner for a drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub drug: String,
    pub severity: Severity,
    pub description: String,
}

/// Drug name (lowercased) to its known interaction partners.
#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    entries: HashMap<String, Vec<InteractionRule>>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    drug: String,
    other_drug: String,
    severity: String,
    description: String,
}

const BUILTIN: &[(&str, &str, Severity, &str)] = &[
    ("warfarin", "aspirin", Severity::Severe, "Increased bleeding risk"),
    ("warfarin", "ibuprofen", Severity::Severe, "Increased bleeding risk"),
    ("warfarin", "naproxen", Severity::Severe, "Increased bleeding risk"),
    ("warfarin", "vitamin k", Severity::Severe, "May reduce warfarin effectiveness"),
    ("metformin", "alcohol", Severity::Moderate, "Increased risk of lactic acidosis"),
    ("metformin", "contrast dye", Severity::Moderate, "May cause kidney problems"),
    ("lisinopril", "potassium", Severity::Moderate, "Increased potassium levels"),
    ("lisinopril", "spironolactone", Severity::Moderate, "Increased potassium levels"),
    ("lisinopril", "nsaids", Severity::Moderate, "Reduced blood pressure control"),
    ("metoprolol", "calcium channel blockers", Severity::Moderate, "Decreased heart rate"),
    ("metoprolol", "diabetes medications", Severity::Mild, "May mask low blood sugar symptoms"),
    ("simvastatin", "clarithromycin", Severity::Severe, "Increased muscle breakdown risk"),
    ("simvastatin", "erythromycin", Severity::Severe, "Increased muscle breakdown risk"),
    ("simvastatin", "grapefruit juice", Severity::Moderate, "Increased drug levels"),
];

pub(crate) fn canonical(name: &str) -> String {
    name.trim().to_lowercase()
}

impl InteractionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The bundled table of common interactions.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (drug, other, severity, description) in BUILTIN {
            table.insert(drug, InteractionRule {
                drug: other.to_string(),
                severity: *severity,
                description: description.to_string(),
            });
        }
        table
    }

    pub fn insert(&mut self, drug: &str, mut rule: InteractionRule) {
        rule.drug = canonical(&rule.drug);
        self.entries.entry(canonical(drug)).or_default().push(rule);
    }

    /// Rules keyed exactly by the canonical form of `name`.
    pub fn rules_for(&self, name: &str) -> &[InteractionRule] {
        self.entries
            .get(&canonical(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends every rule of `other` to this table.
    pub fn merge(&mut self, other: InteractionTable) {
        for (drug, rules) in other.entries {
            self.entries.entry(drug).or_default().extend(rules);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads `drug,other_drug,severity,description` rows with a header line.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> TrackerResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut table = Self::empty();

        for (index, row) in csv_reader.deserialize::<TableRow>().enumerate() {
            let row = row?;
            let line = index + 2;
            if row.drug.is_empty() || row.other_drug.is_empty() {
                return Err(TrackerError::InvalidTable(format!(
                    "line {}: drug names must not be empty",
                    line
                )));
            }
            let severity = row
                .severity
                .parse::<Severity>()
                .map_err(|e| TrackerError::InvalidTable(format!("line {}: {}", line, e)))?;
            table.insert(&row.drug, InteractionRule {
                drug: row.other_drug,
                severity,
                description: row.description,
            });
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = InteractionTable::builtin();
        assert_eq!(table.len(), 14);
        assert_eq!(table.rules_for("Warfarin").len(), 4);
        assert_eq!(table.rules_for("  SIMVASTATIN ").len(), 3);
        assert!(table.rules_for("aspirin").is_empty());
    }

    #[test]
    fn test_csv_table() {
        let data = "drug,other_drug,severity,description\n\
                    Sertraline, Tramadol ,Severe,Serotonin syndrome risk\n\
                    sertraline,ibuprofen,moderate,Increased bleeding risk\n";
        let table = InteractionTable::from_reader(data.as_bytes()).unwrap();
        let rules = table.rules_for("sertraline");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].drug, "tramadol");
        assert_eq!(rules[0].severity, Severity::Severe);
    }

    #[test]
    fn test_csv_rejects_bad_rows() {
        let bad_severity = "drug,other_drug,severity,description\na,b,fatal,x\n";
        match InteractionTable::from_reader(bad_severity.as_bytes()) {
            Err(TrackerError::InvalidTable(msg)) => assert!(msg.starts_with("line 2")),
            other => panic!("expected table error, got {:?}", other),
        }

        let missing_name = "drug,other_drug,severity,description\n,b,mild,x\n";
        assert!(InteractionTable::from_reader(missing_name.as_bytes()).is_err());
    }

    #[test]
    fn test_merge_appends() {
        let mut table = InteractionTable::builtin();
        let mut extra = InteractionTable::empty();
        extra.insert("warfarin", InteractionRule {
            drug: "Fluconazole".to_string(),
            severity: Severity::Severe,
            description: "Increased INR".to_string(),
        });
        table.merge(extra);
        assert_eq!(table.rules_for("warfarin").len(), 5);
        assert_eq!(table.rules_for("warfarin")[4].drug, "fluconazole");
    }
}
