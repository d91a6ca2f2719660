//! Property value types for vertices and edges
//!
//! Values form a closed tagged union. Two orderings exist side by side:
//!
//! - the *total* order (`Ord`), used to key index postings. It ranks
//!   variants first and compares floats with `total_cmp`, so every value
//!   can live in a `BTreeMap`.
//! - the *query* order ([`PropertyValue::compare`]), used by range
//!   comparators. It is partial: integers and floats compare numerically
//!   with each other, maps and nulls are not orderable at all.
//!
//! Equality is type-strict: `Integer(29) != Float(29.0)`.

use super::store::GraphError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Property value type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Bytes(Vec<u8>),
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get map value if this is a map
    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get bytes if this is a byte string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "Null",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::String(_) => "String",
            PropertyValue::Array(_) => "Array",
            PropertyValue::Map(_) => "Map",
            PropertyValue::Bytes(_) => "Bytes",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PropertyValue::Null => 0,
            PropertyValue::Boolean(_) => 1,
            PropertyValue::Integer(_) => 2,
            PropertyValue::Float(_) => 3,
            PropertyValue::String(_) => 4,
            PropertyValue::Array(_) => 5,
            PropertyValue::Map(_) => 6,
            PropertyValue::Bytes(_) => 7,
        }
    }

    /// Whether range comparators can be applied to this value
    pub fn is_orderable(&self) -> bool {
        match self {
            PropertyValue::Boolean(_)
            | PropertyValue::Integer(_)
            | PropertyValue::Float(_)
            | PropertyValue::String(_)
            | PropertyValue::Bytes(_) => true,
            PropertyValue::Array(items) => items.iter().all(PropertyValue::is_orderable),
            PropertyValue::Null | PropertyValue::Map(_) => false,
        }
    }

    /// Query-order comparison. `None` when the two values cannot be ordered
    /// against each other.
    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        use PropertyValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Integer(a), Float(b)) => compare_int_float(*a, *b),
            (Float(a), Integer(b)) => compare_int_float(*b, *a).map(Ordering::reverse),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
            (Array(a), Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PropertyValue {}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropertyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use PropertyValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Array(a), Array(b)) => a.cmp(b),
            (Map(a), Map(b)) => a.cmp(b),
            (Bytes(a), Bytes(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            PropertyValue::Null => {}
            PropertyValue::Boolean(b) => b.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::Array(arr) => arr.hash(state),
            PropertyValue::Map(map) => map.hash(state),
            PropertyValue::Bytes(b) => b.hash(state),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Array(arr) => {
                write!(f, "[")?;
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            PropertyValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, val)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, val)?;
                }
                write!(f, "}}")
            }
            PropertyValue::Bytes(b) => write!(f, "Bytes({})", b.len()),
        }
    }
}

// Convenience conversions
/// Exact integer/float ordering. Casting the integer to `f64` would round
/// values beyond 2^53.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float above every i64
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return None;
    }
    if float >= I64_END {
        return Some(Ordering::Less);
    }
    if float < -I64_END {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&float),
        ord => Some(ord),
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(b: Vec<u8>) -> Self {
        PropertyValue::Bytes(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        PropertyValue::Map(map)
    }
}

/// Boundary conversion from host JSON values. Numbers that fit neither
/// `i64` nor `f64` exactly are rejected rather than silently truncated.
impl TryFrom<serde_json::Value> for PropertyValue {
    type Error = GraphError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;
        Ok(match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Integer(i)
                } else if n.is_u64() {
                    return Err(GraphError::ArgumentInvalid(format!(
                        "integer {} does not fit in i64",
                        n
                    )));
                } else {
                    match n.as_f64() {
                        Some(f) => PropertyValue::Float(f),
                        None => {
                            return Err(GraphError::ArgumentInvalid(format!(
                                "unsupported number {}",
                                n
                            )))
                        }
                    }
                }
            }
            Value::String(s) => PropertyValue::String(s),
            Value::Array(items) => PropertyValue::Array(
                items
                    .into_iter()
                    .map(PropertyValue::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Object(fields) => PropertyValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| PropertyValue::try_from(v).map(|v| (k, v)))
                    .collect::<Result<BTreeMap<_, _>, _>>()?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_types() {
        assert_eq!(PropertyValue::String("test".to_string()).type_name(), "String");
        assert_eq!(PropertyValue::Integer(42).type_name(), "Integer");
        assert_eq!(PropertyValue::Float(3.14).type_name(), "Float");
        assert_eq!(PropertyValue::Boolean(true).type_name(), "Boolean");
        assert_eq!(PropertyValue::Array(vec![]).type_name(), "Array");
        assert_eq!(PropertyValue::Map(BTreeMap::new()).type_name(), "Map");
        assert_eq!(PropertyValue::Bytes(vec![1]).type_name(), "Bytes");
        assert_eq!(PropertyValue::Null.type_name(), "Null");
    }

    #[test]
    fn test_property_value_conversions() {
        let string_prop: PropertyValue = "hello".into();
        assert_eq!(string_prop.as_string(), Some("hello"));

        let int_prop: PropertyValue = 42i64.into();
        assert_eq!(int_prop.as_integer(), Some(42));

        let float_prop: PropertyValue = 3.14.into();
        assert_eq!(float_prop.as_float(), Some(3.14));

        let bool_prop: PropertyValue = true.into();
        assert_eq!(bool_prop.as_boolean(), Some(true));
    }

    #[test]
    fn test_equality_is_type_strict() {
        assert_ne!(PropertyValue::Integer(29), PropertyValue::Float(29.0));
        assert_eq!(PropertyValue::Integer(29), PropertyValue::Integer(29));
        assert_eq!(PropertyValue::Float(f64::NAN), PropertyValue::Float(f64::NAN));
    }

    #[test]
    fn test_query_compare_numeric_promotion() {
        let a = PropertyValue::Integer(1);
        let b = PropertyValue::Float(0.5);
        assert_eq!(a.compare(&b), Some(Ordering::Greater));
        assert_eq!(b.compare(&a), Some(Ordering::Less));
        assert_eq!(PropertyValue::Float(0.5).compare(&PropertyValue::Float(0.4)), Some(Ordering::Greater));
    }

    #[test]
    fn test_query_compare_large_integers_exactly() {
        let two_53 = 1i64 << 53;
        let above = PropertyValue::Integer(two_53 + 1);
        let float = PropertyValue::Float(two_53 as f64);
        assert_eq!(above.compare(&float), Some(Ordering::Greater));
        assert_eq!(float.compare(&above), Some(Ordering::Less));
        assert_eq!(PropertyValue::Integer(two_53).compare(&float), Some(Ordering::Equal));

        assert_eq!(PropertyValue::Integer(-2).compare(&PropertyValue::Float(-2.5)), Some(Ordering::Greater));
        assert_eq!(PropertyValue::Integer(i64::MAX).compare(&PropertyValue::Float(f64::INFINITY)), Some(Ordering::Less));
        assert_eq!(PropertyValue::Integer(i64::MIN).compare(&PropertyValue::Float(-1e19)), Some(Ordering::Greater));
        assert_eq!(PropertyValue::Integer(0).compare(&PropertyValue::Float(f64::NAN)), None);
    }

    #[test]
    fn test_query_compare_incomparable() {
        let s = PropertyValue::from("29");
        let i = PropertyValue::Integer(29);
        assert_eq!(s.compare(&i), None);
        assert_eq!(PropertyValue::Null.compare(&PropertyValue::Null), None);

        let m = PropertyValue::Map(BTreeMap::new());
        assert_eq!(m.compare(&m), None);
        assert!(!m.is_orderable());
        assert!(PropertyValue::from(vec![PropertyValue::Integer(1)]).is_orderable());
    }

    #[test]
    fn test_array_compare() {
        let a = PropertyValue::from(vec![PropertyValue::Integer(1), PropertyValue::Integer(2)]);
        let b = PropertyValue::from(vec![PropertyValue::Integer(1), PropertyValue::Integer(3)]);
        let c = PropertyValue::from(vec![PropertyValue::Integer(1)]);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(a.compare(&c), Some(Ordering::Greater));
    }

    #[test]
    fn test_total_order_ranks_variants() {
        let mut values = vec![
            PropertyValue::from("a"),
            PropertyValue::Integer(3),
            PropertyValue::Null,
            PropertyValue::Boolean(false),
        ];
        values.sort();
        assert_eq!(values[0], PropertyValue::Null);
        assert_eq!(values[1], PropertyValue::Boolean(false));
        assert_eq!(values[2], PropertyValue::Integer(3));
        assert_eq!(values[3], PropertyValue::from("a"));
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "name": "marko",
            "age": 29,
            "weight": 0.5,
            "tags": ["a", "b"],
            "active": true,
            "nothing": null
        });
        let value = PropertyValue::try_from(json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("name").unwrap().as_string(), Some("marko"));
        assert_eq!(map.get("age").unwrap().as_integer(), Some(29));
        assert_eq!(map.get("weight").unwrap().as_float(), Some(0.5));
        assert_eq!(map.get("tags").unwrap().as_array().unwrap().len(), 2);
        assert!(map.get("nothing").unwrap().is_null());
    }

    #[test]
    fn test_from_json_rejects_oversized_integer() {
        let json = serde_json::json!(u64::MAX);
        let err = PropertyValue::try_from(json).unwrap_err();
        assert!(matches!(err, GraphError::ArgumentInvalid(_)));
    }
}
