//! Runtime value graph handed to the validator.
//!
//! Values mirror a dynamically typed host: there is a "no value" sentinel
//! (`Undefined`) distinct from structural `Null`, arrays may contain holes,
//! and containers are reference-counted so that strict equality can compare
//! them by identity. Cloning a `Value` shares its containers.
//!
//! `classify` reduces any slot to the closed `Kind` set that every traversal
//! decision in the validator switches on.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

// =============================================================================
// VALUE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The "no value" sentinel. Also what an unassigned field reads as.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(Arc<str>),
    Array(Arc<Array>),
    Set(Arc<Set>),
    Map(Arc<Map>),
    Record(Arc<Record>),
    Instance(Arc<Instance>),
}

impl Value {
    pub fn bigint(n: i128) -> Self {
        Value::BigInt(n)
    }

    pub fn array(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(Array::new(values)))
    }

    /// Array whose `None` slots are holes (never assigned).
    pub fn sparse_array(slots: impl IntoIterator<Item = Option<Value>>) -> Self {
        Value::Array(Arc::new(Array::sparse(slots)))
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(Arc::new(values.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(Arc::new(entries.into_iter().collect()))
    }

    pub fn kind(&self) -> Kind {
        classify(Some(self))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Strict equality: no coercion between types, `0 == -0`, `NaN` never
    /// equal to itself, containers equal only when they are the same object.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Key equality used by sets and maps: strict equality except that `NaN`
    /// matches `NaN`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }

    /// Elements visited by element-wise checks: present array slots, set
    /// members, map values. `None` for anything that is not a collection.
    pub fn collection_values(&self) -> Option<Vec<&Value>> {
        match self {
            Value::Array(array) => Some(array.iter_present().map(|(_, v)| v).collect()),
            Value::Set(set) => Some(set.iter().collect()),
            Value::Map(map) => Some(map.iter().map(|(_, v)| v).collect()),
            _ => None,
        }
    }

    /// Host string conversion, used for message tokens.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::BigInt(n) => n.to_string(),
            Value::String(s) => s.to_string(),
            Value::Array(array) => array.join(","),
            Value::Set(_) => "[object Set]".to_string(),
            Value::Map(_) => "[object Map]".to_string(),
            Value::Record(_) | Value::Instance(_) => "[object Object]".to_string(),
        }
    }

    /// Label for a value used as a child property (map keys). The sentinel and
    /// `null` have no label.
    pub fn label(&self) -> Option<String> {
        if self.is_nullish() {
            None
        } else {
            Some(self.to_js_string())
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        exponent_form(n)
    } else if n.fract() == 0.0 {
        (n as i128).to_string()
    } else {
        n.to_string()
    }
}

/// `1e+21`, `-1.5e-7`: shortest digits with an explicitly signed exponent.
fn exponent_form(n: f64) -> String {
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

// =============================================================================
// CONTAINERS
// =============================================================================

/// Index-addressable sequence. `None` slots are holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    slots: Vec<Option<Value>>,
}

impl Array {
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        Array {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    pub fn sparse(slots: impl IntoIterator<Item = Option<Value>>) -> Self {
        Array {
            slots: slots.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<Value>] {
        &self.slots
    }

    /// Present elements with their index; holes are skipped.
    pub fn iter_present(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i, v)))
    }

    /// Host `join`: holes and nullish elements render empty.
    pub fn join(&self, separator: &str) -> String {
        self.slots
            .iter()
            .map(|slot| match slot {
                None | Some(Value::Undefined) | Some(Value::Null) => String::new(),
                Some(v) => v.to_js_string(),
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Insertion-ordered unique elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Set {
    items: Vec<Value>,
}

impl Set {
    pub fn insert(&mut self, value: Value) -> bool {
        if self.items.iter().any(|v| v.same_value_zero(&value)) {
            return false;
        }
        self.items.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }
}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = Set::default();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// Insertion-ordered mapping of unique keys to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: Vec<(Value, Value)>,
}

impl Map {
    /// Re-inserting an existing key replaces its value in place.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.same_value_zero(key))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl FromIterator<(Value, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Map::default();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// String-keyed object with no registered shape.
///
/// `has_recognized_shape` is false for objects built without any prototype;
/// those are never descended into.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
    has_recognized_shape: bool,
}

impl Default for Record {
    fn default() -> Self {
        Record::new()
    }
}

impl Record {
    pub fn new() -> Self {
        Record {
            entries: Vec::new(),
            has_recognized_shape: true,
        }
    }

    pub fn null_prototype() -> Self {
        Record {
            entries: Vec::new(),
            has_recognized_shape: false,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        upsert(&mut self.entries, key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.entries, key)
    }

    pub fn has_recognized_shape(&self) -> bool {
        self.has_recognized_shape
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A value built from a registered shape. Fields that were never assigned
/// (or were removed) read as absent, which is distinct from a field holding
/// `Undefined`.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    shape: String,
    fields: Vec<(String, Value)>,
}

impl Instance {
    pub fn new(shape: impl Into<String>) -> Self {
        Instance {
            shape: shape.into(),
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        upsert(&mut self.fields, field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(k, _)| k == field)?;
        Some(self.fields.remove(index).1)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        lookup(&self.fields, field)
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn upsert(entries: &mut Vec<(String, Value)>, key: String, value: Value) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn lookup<'a>(entries: &'a [(String, Value)], key: &str) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

// =============================================================================
// CLASSIFIER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullish {
    Undefined,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Never assigned: a missing field or an array hole.
    Absent,
    Nullish(Nullish),
    Scalar,
    OrderedCollection,
    UniqueCollection,
    KeyValueCollection,
    ShapeInstance,
    PlainRecord { has_recognized_shape: bool },
}

impl Kind {
    pub fn is_missing(self) -> bool {
        matches!(self, Kind::Absent | Kind::Nullish(_))
    }
}

/// Classify a slot. `None` means the slot was never assigned.
pub fn classify(slot: Option<&Value>) -> Kind {
    match slot {
        None => Kind::Absent,
        Some(Value::Undefined) => Kind::Nullish(Nullish::Undefined),
        Some(Value::Null) => Kind::Nullish(Nullish::Null),
        Some(Value::Array(_)) => Kind::OrderedCollection,
        Some(Value::Set(_)) => Kind::UniqueCollection,
        Some(Value::Map(_)) => Kind::KeyValueCollection,
        Some(Value::Instance(_)) => Kind::ShapeInstance,
        Some(Value::Record(record)) => Kind::PlainRecord {
            has_recognized_shape: record.has_recognized_shape,
        },
        Some(
            Value::Bool(_) | Value::Number(_) | Value::BigInt(_) | Value::String(_),
        ) => Kind::Scalar,
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::array(values)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(Arc::new(array))
    }
}

impl From<Set> for Value {
    fn from(set: Set) -> Self {
        Value::Set(Arc::new(set))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(Arc::new(instance))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(entries) => Value::from(
                entries
                    .into_iter()
                    .fold(Record::new(), |record, (k, v)| record.with(k, Value::from(v))),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::BigInt(n) => serializer.serialize_str(&n.to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(array) => {
                let mut seq = serializer.serialize_seq(Some(array.len()))?;
                for slot in array.slots() {
                    seq.serialize_element(slot.as_ref().unwrap_or(&Value::Undefined))?;
                }
                seq.end()
            }
            Value::Set(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for item in set.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut seq = serializer.serialize_seq(Some(map.len()))?;
                for (key, value) in map.iter() {
                    seq.serialize_element(&(key, value))?;
                }
                seq.end()
            }
            Value::Record(record) => {
                let mut out = serializer.serialize_map(Some(record.len()))?;
                for (key, value) in record.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Instance(instance) => {
                let mut out = serializer.serialize_map(Some(instance.fields.len()))?;
                for (key, value) in instance.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_slots_classify_apart_from_null() {
        assert_eq!(classify(None), Kind::Absent);
        assert_eq!(Value::Undefined.kind(), Kind::Nullish(Nullish::Undefined));
        assert_eq!(Value::Null.kind(), Kind::Nullish(Nullish::Null));
        assert!(classify(None).is_missing());
        assert!(Value::Null.kind().is_missing());
        assert!(!Value::from(0).kind().is_missing());
    }

    #[test]
    fn containers_classify_by_variant() {
        assert_eq!(Value::array([]).kind(), Kind::OrderedCollection);
        assert_eq!(Value::set([]).kind(), Kind::UniqueCollection);
        assert_eq!(Value::map([]).kind(), Kind::KeyValueCollection);
        assert_eq!(Value::from(Instance::new("A")).kind(), Kind::ShapeInstance);
        assert_eq!(
            Value::from(Record::new()).kind(),
            Kind::PlainRecord { has_recognized_shape: true }
        );
        assert_eq!(
            Value::from(Record::null_prototype()).kind(),
            Kind::PlainRecord { has_recognized_shape: false }
        );
        assert_eq!(Value::from("x").kind(), Kind::Scalar);
        assert_eq!(Value::bigint(0).kind(), Kind::Scalar);
    }

    #[test]
    fn strict_equality_has_no_coercion() {
        let zero = Value::from(0);
        assert!(zero.strict_equals(&Value::Number(-0.0)));
        assert!(!zero.strict_equals(&Value::from("0")));
        assert!(!zero.strict_equals(&Value::bigint(0)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
        assert!(!Value::Undefined.strict_equals(&Value::Null));
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = Value::from(Record::new());
        let b = Value::from(Record::new());
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&b));
    }

    #[test]
    fn set_deduplicates_with_same_value_zero() {
        let set: Set = [
            Value::Number(f64::NAN),
            Value::Number(f64::NAN),
            Value::from(0),
            Value::Number(-0.0),
            Value::from("0"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn holes_are_skipped_by_present_iteration() {
        let array = Array::sparse([None, Some(Value::Undefined), None, Some(Value::from(1))]);
        let present: Vec<usize> = array.iter_present().map(|(i, _)| i).collect();
        assert_eq!(present, vec![1, 3]);
    }

    #[test]
    fn labels_follow_host_string_conversion() {
        assert_eq!(Value::from(0).label().as_deref(), Some("0"));
        assert_eq!(Value::Number(-0.0).label().as_deref(), Some("0"));
        assert_eq!(Value::Number(1.5).label().as_deref(), Some("1.5"));
        assert_eq!(Value::Number(f64::INFINITY).label().as_deref(), Some("Infinity"));
        assert_eq!(Value::bigint(7).label().as_deref(), Some("7"));
        assert_eq!(Value::Number(1e21).label().as_deref(), Some("1e+21"));
        assert_eq!(Value::Number(-2.5e22).label().as_deref(), Some("-2.5e+22"));
        assert_eq!(Value::Number(1e-7).label().as_deref(), Some("1e-7"));
        assert_eq!(Value::Number(1e20).label().as_deref(), Some("100000000000000000000"));
        assert_eq!(Value::Number(0.000001).label().as_deref(), Some("0.000001"));
        assert_eq!(
            Value::from(Instance::new("A")).label().as_deref(),
            Some("[object Object]")
        );
        assert_eq!(
            Value::sparse_array([Some(1.into()), None, Some(Value::Null), Some("b".into())])
                .label()
                .as_deref(),
            Some("1,,,b")
        );
        assert_eq!(Value::Undefined.label(), None);
        assert_eq!(Value::Null.label(), None);
    }

    #[test]
    fn json_objects_become_ordinary_records() {
        let value = Value::from(serde_json::json!({ "b": "c", "n": [1, null] }));
        let Value::Record(record) = &value else {
            panic!("Expected record, got {:?}", value);
        };
        assert!(record.has_recognized_shape());
        assert_eq!(record.get("b"), Some(&Value::from("c")));
        assert_eq!(
            serde_json::to_value(&value).expect("serialize"),
            serde_json::json!({ "b": "c", "n": [1.0, null] })
        );
    }
}
