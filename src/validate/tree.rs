//! Error tree nodes and their assembly rules.
//!
//! A node carries the constraints its own value failed and the nodes nested
//! validation produced beneath it. Nodes with neither are never emitted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::Value;

pub const UNKNOWN_VALUE: &str = "unknownValue";
pub const UNKNOWN_VALUE_MESSAGE: &str = "an unknown value was passed to the validate function";
pub const NESTED_VALIDATION: &str = "nestedValidation";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Shape that declares the failing field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Field name, or element position under a collection. Empty for
    /// `unknownValue` nodes.
    pub property: String,
    #[serde(skip_serializing_if = "omit_value")]
    pub value: Option<Value>,
    /// Constraint name to rendered message.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub constraints: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ValidationError>,
}

fn omit_value(value: &Option<Value>) -> bool {
    value.as_ref().is_none_or(Value::is_undefined)
}

impl ValidationError {
    pub(crate) fn new(property: impl Into<String>, target: Option<&str>, value: Option<Value>) -> Self {
        ValidationError {
            target: target.map(str::to_string),
            property: property.into(),
            value,
            constraints: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn unknown_value(target: Option<&str>) -> Self {
        let mut error = ValidationError::new("", target, None);
        error.fail(UNKNOWN_VALUE, UNKNOWN_VALUE_MESSAGE.to_string());
        error
    }

    pub(crate) fn fail(&mut self, constraint: &str, message: String) {
        self.constraints.insert(constraint.to_string(), message);
    }

    /// Elide the node when nothing failed.
    pub(crate) fn into_non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.children.is_empty()
    }

    pub fn has_constraint(&self, name: &str) -> bool {
        self.constraints.contains_key(name)
    }

    /// Depth-first visit of this node and its descendants with their paths
    /// (`value[0].name`).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&str, &'a ValidationError)) {
        self.walk_from("", visit);
    }

    fn walk_from<'a>(&'a self, parent: &str, visit: &mut impl FnMut(&str, &'a ValidationError)) {
        let path = format!("{}{}", parent, path_segment(parent, &self.property));
        visit(&path, self);
        for child in &self.children {
            child.walk_from(&path, visit);
        }
    }

    /// Human-readable report. `show_messages` lists messages instead of
    /// constraint names.
    pub fn to_report(&self, show_messages: bool) -> String {
        let mut out = format!(
            "An instance of {} has failed the validation:\n",
            self.target.as_deref().unwrap_or("an object")
        );
        if !self.constraints.is_empty() {
            out.push_str(&self.constraint_line(&self.property, show_messages));
        }
        for child in &self.children {
            child.report_into(&mut out, &self.property, show_messages);
        }
        out
    }

    fn report_into(&self, out: &mut String, parent: &str, show_messages: bool) {
        let path = format!("{}{}", parent, path_segment(parent, &self.property));
        if !self.constraints.is_empty() {
            out.push_str(&self.constraint_line(&path, show_messages));
        } else {
            for child in &self.children {
                child.report_into(out, &path, show_messages);
            }
        }
    }

    fn constraint_line(&self, path: &str, show_messages: bool) -> String {
        let listed: Vec<&str> = if show_messages {
            self.constraints.values().map(String::as_str).collect()
        } else {
            self.constraints.keys().map(String::as_str).collect()
        };
        format!(
            " - property {} has failed the following constraints: {} \n",
            path,
            listed.join(", ")
        )
    }
}

fn path_segment(parent: &str, property: &str) -> String {
    if property.is_empty() {
        String::new()
    } else if property.parse::<u64>().is_ok() {
        format!("[{}]", property)
    } else if parent.is_empty() {
        property.to_string()
    } else {
        format!(".{}", property)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_report(false))
    }
}
