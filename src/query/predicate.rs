//! Query predicates
//!
//! A [`HasContainer`] is one `(key, comparator, value)` filter. Absent
//! properties and `Null` values are both treated as null: `Equal` matches
//! null against null only, and the ordering comparators never match a
//! null on either side.

use crate::graph::{GraphError, GraphResult, PropertyValue};
use crate::storage::RESERVED_PREFIX;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

impl Comparator {
    /// Whether the comparator needs an order between values
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Comparator::Equal | Comparator::NotEqual)
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparator::Equal => ordering == Ordering::Equal,
            Comparator::NotEqual => ordering != Ordering::Equal,
            Comparator::GreaterThan => ordering == Ordering::Greater,
            Comparator::GreaterThanEqual => ordering != Ordering::Less,
            Comparator::LessThan => ordering == Ordering::Less,
            Comparator::LessThanEqual => ordering != Ordering::Greater,
        }
    }

    /// Evaluate against an element value (`None` when the property is absent)
    pub fn evaluate(&self, element: Option<&PropertyValue>, value: &PropertyValue) -> bool {
        let element = element.filter(|e| !e.is_null());
        let value = Some(value).filter(|v| !v.is_null());
        match self {
            Comparator::Equal => element == value,
            Comparator::NotEqual => element != value,
            _ => match (element, value) {
                (Some(e), Some(v)) => e.compare(v).map_or(false, |ord| self.accepts(ord)),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparator::Equal => "=",
            Comparator::NotEqual => "<>",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanEqual => ">=",
            Comparator::LessThan => "<",
            Comparator::LessThanEqual => "<=",
        };
        f.write_str(symbol)
    }
}

/// One filter condition of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasContainer {
    pub key: String,
    pub comparator: Comparator,
    pub value: PropertyValue,
}

impl HasContainer {
    /// Build a predicate, rejecting empty or reserved keys and values that
    /// an ordering comparator could never compare against
    pub fn new(key: impl Into<String>, comparator: Comparator, value: impl Into<PropertyValue>) -> GraphResult<Self> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() {
            return Err(GraphError::ArgumentInvalid("query key must not be empty".into()));
        }
        if key.starts_with(RESERVED_PREFIX) {
            return Err(GraphError::ArgumentInvalid(format!("query key {} is reserved", key)));
        }
        if comparator.is_ordering() && !value.is_null() && !value.is_orderable() {
            return Err(GraphError::ArgumentInvalid(format!(
                "{} value cannot be used with {}",
                value.type_name(),
                comparator
            )));
        }
        Ok(Self { key, comparator, value })
    }

    pub fn test(&self, element: Option<&PropertyValue>) -> bool {
        self.comparator.evaluate(element, &self.value)
    }
}

impl fmt::Display for HasContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.comparator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn int(i: i64) -> PropertyValue {
        PropertyValue::Integer(i)
    }

    #[test]
    fn test_equal_null_semantics() {
        let eq = Comparator::Equal;
        assert!(eq.evaluate(None, &PropertyValue::Null));
        assert!(eq.evaluate(Some(&PropertyValue::Null), &PropertyValue::Null));
        assert!(!eq.evaluate(None, &int(1)));
        assert!(!eq.evaluate(Some(&int(1)), &PropertyValue::Null));
        assert!(eq.evaluate(Some(&int(1)), &int(1)));
        assert!(!eq.evaluate(Some(&int(29)), &PropertyValue::Float(29.0)));

        assert!(Comparator::NotEqual.evaluate(None, &int(1)));
        assert!(!Comparator::NotEqual.evaluate(None, &PropertyValue::Null));
    }

    #[test]
    fn test_ordering_never_matches_null() {
        for cmp in [
            Comparator::GreaterThan,
            Comparator::GreaterThanEqual,
            Comparator::LessThan,
            Comparator::LessThanEqual,
        ] {
            assert!(!cmp.evaluate(None, &int(1)));
            assert!(!cmp.evaluate(Some(&int(1)), &PropertyValue::Null));
            assert!(!cmp.evaluate(None, &PropertyValue::Null));
        }
    }

    #[test]
    fn test_ordering_table() {
        let five = int(5);
        assert!(Comparator::GreaterThan.evaluate(Some(&int(6)), &five));
        assert!(!Comparator::GreaterThan.evaluate(Some(&five), &five));
        assert!(Comparator::GreaterThanEqual.evaluate(Some(&five), &five));
        assert!(Comparator::LessThan.evaluate(Some(&int(4)), &five));
        assert!(Comparator::LessThanEqual.evaluate(Some(&five), &five));
        assert!(Comparator::GreaterThan.evaluate(Some(&PropertyValue::Float(0.5)), &PropertyValue::Float(0.4)));
    }

    #[test]
    fn test_mixed_numeric_ordering() {
        assert!(Comparator::GreaterThan.evaluate(Some(&int(1)), &PropertyValue::Float(0.4)));
        assert!(Comparator::LessThan.evaluate(Some(&PropertyValue::Float(28.5)), &int(29)));
    }

    #[test]
    fn test_incomparable_types_do_not_match() {
        assert!(!Comparator::GreaterThan.evaluate(Some(&"abc".into()), &int(1)));
        assert!(!Comparator::LessThan.evaluate(Some(&int(1)), &"abc".into()));
    }

    #[test]
    fn test_has_container_validation() {
        assert!(matches!(
            HasContainer::new("", Comparator::Equal, 1i64),
            Err(GraphError::ArgumentInvalid(_))
        ));
        assert!(matches!(
            HasContainer::new("__label", Comparator::Equal, "x"),
            Err(GraphError::ArgumentInvalid(_))
        ));
        let map = PropertyValue::Map(BTreeMap::new());
        assert!(matches!(
            HasContainer::new("m", Comparator::GreaterThan, map.clone()),
            Err(GraphError::ArgumentInvalid(_))
        ));
        assert!(HasContainer::new("m", Comparator::Equal, map).is_ok());
        assert!(HasContainer::new("age", Comparator::LessThan, PropertyValue::Null).is_ok());
    }

    #[test]
    fn test_display() {
        let has = HasContainer::new("age", Comparator::GreaterThanEqual, 29i64).unwrap();
        assert_eq!(has.to_string(), "age >= 29");
    }
}
