//! Allow-listed additional request data fields.
//!
//! Operator-specific request fields are captured against a fixed
//! field-to-column table rather than by reflective name lookup. The table
//! is validated once at startup; unknown fields are rejected as invalid
//! input at command time.

use std::collections::HashMap;

use super::TransactionError;

/// Maps an accepted request data field to its read-model column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFieldMapping {
    /// Field name as sent by the device.
    pub field: &'static str,

    /// Column the field lands in on the query side.
    pub column: &'static str,
}

/// The complete set of accepted additional request data fields.
pub const REQUEST_FIELD_MAPPINGS: &[RequestFieldMapping] = &[
    RequestFieldMapping {
        field: "amount",
        column: "amount",
    },
    RequestFieldMapping {
        field: "customer_account_number",
        column: "customer_account_number",
    },
    RequestFieldMapping {
        field: "mobile_number",
        column: "mobile_number",
    },
    RequestFieldMapping {
        field: "meter_number",
        column: "meter_number",
    },
];

/// Validates the field table itself. Called once at startup; a duplicate
/// field or column name is a configuration bug.
pub fn validate_request_field_table() -> Result<(), String> {
    let mut seen_fields = std::collections::HashSet::new();
    let mut seen_columns = std::collections::HashSet::new();

    for mapping in REQUEST_FIELD_MAPPINGS {
        if !seen_fields.insert(mapping.field) {
            return Err(format!("duplicate request field mapping: {}", mapping.field));
        }
        if !seen_columns.insert(mapping.column) {
            return Err(format!("duplicate request column mapping: {}", mapping.column));
        }
    }

    Ok(())
}

/// Validates submitted request data against the allow-list.
pub(crate) fn validate_request_fields(
    fields: &HashMap<String, String>,
) -> Result<(), TransactionError> {
    for field in fields.keys() {
        if !REQUEST_FIELD_MAPPINGS.iter().any(|m| m.field == field) {
            return Err(TransactionError::UnknownRequestField(field.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_valid() {
        assert!(validate_request_field_table().is_ok());
    }

    #[test]
    fn known_fields_pass() {
        let mut fields = HashMap::new();
        fields.insert("amount".to_string(), "10.00".to_string());
        fields.insert("meter_number".to_string(), "M-123".to_string());
        assert!(validate_request_fields(&fields).is_ok());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut fields = HashMap::new();
        fields.insert("pin_number".to_string(), "0000".to_string());

        let result = validate_request_fields(&fields);
        assert!(matches!(
            result,
            Err(TransactionError::UnknownRequestField(f)) if f == "pin_number"
        ));
    }

    #[test]
    fn empty_data_passes() {
        assert!(validate_request_fields(&HashMap::new()).is_ok());
    }
}
