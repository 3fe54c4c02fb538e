//! Pattern mining over grouped corrections (spec §4.5 "Pattern mining").

use std::collections::HashMap;

use super::config::LearningConfig;
use super::types::{HumanCorrection, ValueKind};

/// One mined pattern: a group of corrections consistent enough to be
/// generalized into a single memory.
#[derive(Debug, Clone, PartialEq)]
pub struct MinedPattern {
    /// The field this pattern applies to.
    pub field: String,
    /// The value kind the group was classified under.
    pub value_kind: ValueKind,
    /// The most frequently observed corrected value in the group.
    pub most_common_value: String,
    /// The pattern's confidence (spec §4.5).
    pub confidence: f64,
    /// Indices into the original corrections slice covered by this group.
    pub source_indices: Vec<usize>,
}

/// Mine patterns from `corrections` (spec §4.5). Groups by
/// `(field, valueKind)`; a group of at least `min_pattern_occurrences` is
/// a candidate. Date groups are always recognized; other groups require
/// value consistency at or above `similarity_threshold`.
#[must_use]
pub fn mine(corrections: &[HumanCorrection], config: &LearningConfig) -> Vec<MinedPattern> {
    let mut groups: HashMap<(String, ValueKind), Vec<usize>> = HashMap::new();

    for (i, correction) in corrections.iter().enumerate() {
        let kind = ValueKind::for_field(&correction.field);
        groups
            .entry((correction.field.clone(), kind))
            .or_default()
            .push(i);
    }

    let mut patterns = Vec::new();

    for ((field, value_kind), indices) in groups {
        if indices.len() < config.min_pattern_occurrences {
            continue;
        }

        let values: Vec<&str> = indices
            .iter()
            .map(|&i| corrections[i].corrected_value.as_str())
            .collect();
        let unique_count = {
            let mut set = std::collections::HashSet::new();
            for v in &values {
                set.insert(*v);
            }
            set.len()
        };
        let consistency = 1.0 - (unique_count.saturating_sub(1) as f64 / indices.len() as f64);

        let is_date = value_kind == ValueKind::Date;
        if !is_date && consistency < config.similarity_threshold {
            continue;
        }

        let confidence = if is_date {
            0.8
        } else {
            (0.5 + 0.4 * consistency).clamp(0.5, 0.9)
        };

        let most_common_value = most_common(&values);

        patterns.push(MinedPattern {
            field,
            value_kind,
            most_common_value,
            confidence,
            source_indices: indices,
        });
    }

    patterns.sort_by(|a, b| a.field.cmp(&b.field));
    patterns
}

fn most_common(values: &[&str]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.to_string())
        .unwrap_or_default()
}
