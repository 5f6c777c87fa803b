//! Validator configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorOptions {
    /// Skip all but presence checks on absent, undefined or null fields.
    pub skip_missing_properties: bool,
    pub skip_undefined_properties: bool,
    pub skip_null_properties: bool,
    /// Report values without a registered shape as `unknownValue`.
    pub forbid_unknown_values: bool,
    /// Evaluate a field's constraints in order and stop at the first failure.
    pub stop_at_first_error: bool,
    /// Leave messages empty unless the declaration has its own template.
    pub dismiss_default_messages: bool,
    pub include_target: bool,
    pub include_value: bool,
    /// Label `undefined`/`null` map keys instead of failing the run.
    pub label_nullish_map_keys: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            skip_missing_properties: false,
            skip_undefined_properties: false,
            skip_null_properties: false,
            forbid_unknown_values: true,
            stop_at_first_error: false,
            dismiss_default_messages: false,
            include_target: true,
            include_value: true,
            label_nullish_map_keys: false,
        }
    }
}

impl ValidatorOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether a field holding `value` stops after its presence checks.
    pub(crate) fn skips(&self, value: &crate::value::Value) -> bool {
        use crate::value::Value;
        match value {
            Value::Undefined => self.skip_undefined_properties || self.skip_missing_properties,
            Value::Null => self.skip_null_properties || self.skip_missing_properties,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options = ValidatorOptions::from_json(r#"{ "stopAtFirstError": true }"#).expect("parse");
        assert!(options.stop_at_first_error);
        assert!(options.forbid_unknown_values);
        assert!(options.include_value);
        assert!(!options.label_nullish_map_keys);
    }
}
