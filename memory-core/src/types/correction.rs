//! The `CorrectionMemory` payload variant.

use serde::{Deserialize, Serialize};

/// The functional category a correction belongs to, used to route
/// mined corrections to the right kind of memory (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    Price,
    Quantity,
    Date,
    Currency,
    Vat,
    FieldMapping,
}

impl CorrectionType {
    /// Map a normalized field name to its correction type, per spec §4.5.
    #[must_use]
    pub fn for_field(field: &str) -> Self {
        match field {
            "totalAmount" => CorrectionType::Price,
            "quantity" => CorrectionType::Quantity,
            "serviceDate" | "invoiceDate" | "dueDate" => CorrectionType::Date,
            "currency" => CorrectionType::Currency,
            "vatAmount" => CorrectionType::Vat,
            _ => CorrectionType::FieldMapping,
        }
    }
}

/// A condition under which a [`CorrectionMemory`]'s action should fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerCondition {
    /// The named field is present on the invoice being processed.
    FieldExists { field: String },
    /// The named field equals the given value.
    FieldEquals { field: String, value: String },
}

/// What to do once a [`CorrectionMemory`]'s trigger conditions are met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAction {
    /// The kind of action, e.g. `"SET_FIELD"`.
    pub action_type: String,
    /// The field this action targets.
    pub target_field: String,
    /// The value to set the target field to.
    pub new_value: String,
    /// A human-readable reason for the action.
    pub explanation: String,
}

/// A rule that must pass for a correction's action to be considered valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// A short name for the rule, e.g. `"non_empty"`, `"numeric"`.
    pub rule_name: String,
    /// An optional regex the resulting value must match.
    pub pattern: Option<String>,
}

/// A learned correction: a trigger, an action to take, and the
/// validation rules that action must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionMemory {
    /// The functional category this correction belongs to.
    pub correction_type: CorrectionType,
    /// Conditions that must hold for the action to fire.
    pub trigger_conditions: Vec<TriggerCondition>,
    /// The action to take once triggered.
    pub correction_action: CorrectionAction,
    /// Validation rules the resulting value must satisfy.
    pub validation_rules: Vec<ValidationRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_type_routing_matches_spec_table() {
        assert_eq!(CorrectionType::for_field("totalAmount"), CorrectionType::Price);
        assert_eq!(CorrectionType::for_field("quantity"), CorrectionType::Quantity);
        assert_eq!(CorrectionType::for_field("serviceDate"), CorrectionType::Date);
        assert_eq!(CorrectionType::for_field("invoiceDate"), CorrectionType::Date);
        assert_eq!(CorrectionType::for_field("dueDate"), CorrectionType::Date);
        assert_eq!(CorrectionType::for_field("currency"), CorrectionType::Currency);
        assert_eq!(CorrectionType::for_field("vatAmount"), CorrectionType::Vat);
        assert_eq!(
            CorrectionType::for_field("purchaseOrderNumber"),
            CorrectionType::FieldMapping
        );
    }
}
