use crate::models::Medicine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub search_term: Option<String>,
    /// Matches medicines carrying any of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
    pub has_refill_reminder: Option<bool>,
    /// Inclusive day range; an unset duration counts as 0.
    pub duration_range: Option<(u32, u32)>,
}

fn field_contains(field: Option<&str>, term: &str) -> bool {
    field.map_or(false, |f| f.to_lowercase().contains(term))
}

pub fn filter_medicines<'a>(medicines: &'a [Medicine], options: &FilterOptions) -> Vec<&'a Medicine> {
    let term = options
        .search_term
        .as_deref()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty());

    medicines
        .iter()
        .filter(|m| match &term {
            Some(term) => {
                m.name.to_lowercase().contains(term.as_str())
                    || field_contains(m.dosage.as_deref(), term)
                    || field_contains(m.instructions.as_deref(), term)
                    || field_contains(m.notes.as_deref(), term)
            }
            None => true,
        })
        .filter(|m| options.tags.is_empty() || options.tags.iter().any(|t| m.tags.contains(t)))
        .filter(|m| {
            options
                .has_refill_reminder
                .map_or(true, |wanted| m.refill_reminder == wanted)
        })
        .filter(|m| {
            options.duration_range.map_or(true, |(min, max)| {
                let duration = m.duration.unwrap_or(0);
                duration >= min && duration <= max
            })
        })
        .collect()
}

/// Free-text search across names, dosage, instructions, notes, side effects and tags.
/// A blank query returns every medicine.
pub fn search_medicines<'a>(medicines: &'a [Medicine], query: &str) -> Vec<&'a Medicine> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return medicines.iter().collect();
    }

    medicines
        .iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&term)
                || field_contains(m.dosage.as_deref(), &term)
                || field_contains(m.instructions.as_deref(), &term)
                || field_contains(m.notes.as_deref(), &term)
                || field_contains(m.side_effects.as_deref(), &term)
                || m.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::medicine::tests::medicine;

    fn sample() -> Vec<Medicine> {
        let mut a = medicine("a", "Lisinopril", &["08:00"], "2024-01-01 08:00");
        a.tags = vec!["heart".to_string()];
        a.duration = Some(90);
        a.refill_reminder = true;
        let mut b = medicine("b", "Metformin", &["08:00"], "2024-01-01 08:00");
        b.instructions = Some("Take with FOOD".to_string());
        b.side_effects = Some("Nausea".to_string());
        b.tags = vec!["diabetes".to_string()];
        let mut c = medicine("c", "Amoxicillin", &["08:00"], "2024-01-01 08:00");
        c.duration = Some(7);
        c.notes = Some("finish the course".to_string());
        vec![a, b, c]
    }

    fn ids(found: &[&Medicine]) -> Vec<String> {
        found.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_filter_by_term_and_tags() {
        let meds = sample();
        let by_term = FilterOptions { search_term: Some("food".to_string()), ..Default::default() };
        assert_eq!(ids(&filter_medicines(&meds, &by_term)), vec!["b"]);

        let by_tag = FilterOptions {
            tags: vec!["heart".to_string(), "lungs".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(&filter_medicines(&meds, &by_tag)), vec!["a"]);

        // side effects are not part of the filter term
        let nausea = FilterOptions { search_term: Some("nausea".to_string()), ..Default::default() };
        assert!(filter_medicines(&meds, &nausea).is_empty());
    }

    #[test]
    fn test_filter_by_refill_and_duration() {
        let meds = sample();
        let refill = FilterOptions { has_refill_reminder: Some(false), ..Default::default() };
        assert_eq!(ids(&filter_medicines(&meds, &refill)), vec!["b", "c"]);

        let short = FilterOptions { duration_range: Some((0, 30)), ..Default::default() };
        assert_eq!(ids(&filter_medicines(&meds, &short)), vec!["b", "c"]);

        assert_eq!(filter_medicines(&meds, &FilterOptions::default()).len(), 3);
    }

    #[test]
    fn test_global_search() {
        let meds = sample();
        assert_eq!(ids(&search_medicines(&meds, "NAUSEA")), vec!["b"]);
        assert_eq!(ids(&search_medicines(&meds, "diab")), vec!["b"]);
        assert_eq!(ids(&search_medicines(&meds, "course")), vec!["c"]);
        assert_eq!(search_medicines(&meds, "   ").len(), 3);
        assert!(search_medicines(&meds, "zzz").is_empty());
    }
}
