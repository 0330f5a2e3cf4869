//! Normalized query results.
//!
//! This module contains:
//! - `Value` - A unified cell value covering what the store's JSON query
//!   endpoint can yield
//! - `Record` - One normalized row: an ordered mapping from synthesized
//!   column names (`col_0`, `col_1`, ...) to values
//! - `QueryOutput` - Tagged result of an execute call
//! - `ColumnDescriptor` - Column metadata from introspection
//!
//! Record keys are positional placeholders, not semantic names. Callers
//! that need real column names must go through the introspection calls.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A unified cell value for query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Signed integer
    Int64(i64),
    /// Unsigned integer
    UInt64(u64),
    /// Floating point
    Float64(f64),
    /// Text/string value
    Text(String),
    /// Array of values
    Array(Vec<Value>),
    /// Anything the endpoint returned that does not map to the above
    Json(JsonValue),
}

impl Value {
    /// Convert a raw JSON cell into a `Value`.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(_) => Value::Json(json.clone()),
        }
    }

    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to extract as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract as an i64 (converts in-range unsigned values)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to extract as an f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert this value to a display string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_display_string()).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Json(j) => serde_json::to_string(j).unwrap_or_else(|_| "{}".to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// One normalized result row.
///
/// Entries keep the order the cells arrived in, keyed by synthesized
/// positional names (`col_0`, `col_1`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Build a record from a row-tuple, synthesizing `col_i` keys.
    pub fn from_tuple(values: Vec<Value>) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| (format!("col_{}", idx), value))
            .collect();
        Self { entries }
    }

    /// Number of cells in this record
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if this record has no cells
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by its synthesized key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Get a value by position
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// The first value in the record, if any
    pub fn first_value(&self) -> Option<&Value> {
        self.value_at(0)
    }

    /// Iterate over `(key, value)` pairs in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over values in arrival order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

/// Result of executing a query through the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryOutput {
    /// Row-tuple results, normalized into ordered records
    Records(Vec<Record>),
    /// Anything else the store returned, passed through unchanged
    Raw(Value),
}

impl QueryOutput {
    /// The records, if this output holds normalized rows
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            QueryOutput::Records(records) => Some(records),
            QueryOutput::Raw(_) => None,
        }
    }

    /// The raw value, if this output was passed through unchanged
    pub fn raw(&self) -> Option<&Value> {
        match self {
            QueryOutput::Raw(value) => Some(value),
            QueryOutput::Records(_) => None,
        }
    }
}

/// Column metadata returned by the introspection calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Store-specific type name
    pub type_name: String,
    /// Whether the column allows NULL values.
    /// Hard-coded true: the store's columns are generally nullable and
    /// the introspection query does not report nullability.
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Create a new column descriptor
    pub fn new(name: String, type_name: String) -> Self {
        Self {
            name,
            type_name,
            nullable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_synthesized_keys() {
        let record = Record::from_tuple(vec![Value::Int64(1), Value::Text("a".to_string())]);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("col_0"), Some(&Value::Int64(1)));
        assert_eq!(record.get("col_1"), Some(&Value::Text("a".to_string())));
        assert_eq!(record.get("col_2"), None);
    }

    #[test]
    fn test_record_preserves_order() {
        let record = Record::from_tuple(vec![
            Value::Text("x".to_string()),
            Value::Int64(2),
            Value::Bool(true),
        ]);

        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["col_0", "col_1", "col_2"]);

        let values: Vec<&Value> = record.values().collect();
        assert_eq!(values[0], &Value::Text("x".to_string()));
        assert_eq!(values[2], &Value::Bool(true));
    }

    #[test]
    fn test_record_first_value() {
        let record = Record::from_tuple(vec![Value::Text("t1".to_string())]);
        assert_eq!(record.first_value().and_then(|v| v.as_str()), Some("t1"));

        let empty = Record::from_tuple(vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.first_value(), None);
    }

    #[test]
    fn test_value_from_json() {
        assert_eq!(Value::from_json(&serde_json::json!(null)), Value::Null);
        assert_eq!(Value::from_json(&serde_json::json!(true)), Value::Bool(true));
        assert_eq!(Value::from_json(&serde_json::json!(42)), Value::Int64(42));
        assert_eq!(
            Value::from_json(&serde_json::json!(u64::MAX)),
            Value::UInt64(u64::MAX)
        );
        assert_eq!(
            Value::from_json(&serde_json::json!(1.5)),
            Value::Float64(1.5)
        );
        assert_eq!(
            Value::from_json(&serde_json::json!("hi")),
            Value::Text("hi".to_string())
        );
        assert_eq!(
            Value::from_json(&serde_json::json!([1, 2])),
            Value::Array(vec![Value::Int64(1), Value::Int64(2)])
        );
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Int64(-3).to_display_string(), "-3");
        assert_eq!(
            Value::Array(vec![Value::Int64(1), Value::Int64(2)]).to_display_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_value_as_i64_converts_unsigned() {
        assert_eq!(Value::UInt64(7).as_i64(), Some(7));
        assert_eq!(Value::UInt64(u64::MAX).as_i64(), None);
        assert_eq!(Value::Text("7".to_string()).as_i64(), None);
    }

    #[test]
    fn test_query_output_accessors() {
        let records = QueryOutput::Records(vec![Record::from_tuple(vec![Value::Int64(1)])]);
        assert!(records.records().is_some());
        assert!(records.raw().is_none());

        let raw = QueryOutput::Raw(Value::Int64(99));
        assert_eq!(raw.raw(), Some(&Value::Int64(99)));
        assert!(raw.records().is_none());
    }

    #[test]
    fn test_column_descriptor_defaults_nullable() {
        let col = ColumnDescriptor::new("id".to_string(), "UInt64".to_string());
        assert!(col.nullable);
        assert_eq!(col.name, "id");
        assert_eq!(col.type_name, "UInt64");
    }
}
