//! The optional-value sentinel.
//!
//! A [`Field`] distinguishes between a value the caller never supplied
//! ([`Field::Unset`]) and a value explicitly set to null. Unset fields are
//! stripped from outgoing request payloads, which is what gives `PUT` requests
//! their partial-update semantics.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Shared unset value handed out for undeclared or missing attributes.
pub(crate) static UNSET: Field = Field::Unset;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field {
    /// Not supplied by the caller
    #[default]
    Unset,
    /// A concrete value. `Value::Null` is an explicit null.
    Value(Value),
    /// A nested parameter map that may itself hold unset entries
    Map(BTreeMap<String, Field>),
    /// A nested parameter list that may itself hold unset entries
    List(Vec<Field>),
}

impl Field {
    /// Explicit null, which unlike [`Field::Unset`] survives serialization.
    pub fn null() -> Field {
        Field::Value(Value::Null)
    }

    /// Build a nested parameter map.
    pub fn map<K, I>(entries: I) -> Field
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Field)>,
    {
        Field::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Field::Unset)
    }

    /// True for both the sentinel and an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Field::Unset | Field::Value(Value::Null))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Convert into a JSON value, dropping every unset entry.
    ///
    /// Unset map entries are removed, unset list elements are removed, and a
    /// top level unset yields `None`.
    pub fn into_clean_value(self) -> Option<Value> {
        match self {
            Field::Unset => None,
            Field::Value(value) => Some(value),
            Field::Map(entries) => {
                let mut map = Map::new();
                for (key, field) in entries {
                    if let Some(value) = field.into_clean_value() {
                        map.insert(key, value);
                    }
                }
                Some(Value::Object(map))
            }
            Field::List(items) => Some(Value::Array(
                items
                    .into_iter()
                    .filter_map(Field::into_clean_value)
                    .collect(),
            )),
        }
    }

    /// Same as [`Field::into_clean_value`] without consuming the field.
    pub fn to_clean_value(&self) -> Option<Value> {
        self.clone().into_clean_value()
    }
}

impl PartialEq<Value> for Field {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Field::Unset => other.is_null(),
            Field::Value(value) => value == other,
            Field::Map(_) | Field::List(_) => self
                .to_clean_value()
                .map(|value| &value == other)
                .unwrap_or(false),
        }
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Value(Value::String(value))
    }
}

impl From<&String> for Field {
    fn from(value: &String) -> Self {
        Field::Value(Value::String(value.clone()))
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Field::Value(Value::Bool(value))
    }
}

impl From<u32> for Field {
    fn from(value: u32) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Field::Value(Value::from(value))
    }
}

impl From<&Field> for Field {
    fn from(value: &Field) -> Self {
        value.clone()
    }
}

/// `None` means "not supplied" and becomes the sentinel.
impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Field::Unset,
        }
    }
}

/// Typed read access used by the generated attribute getters.
pub trait FromField<'a>: Sized {
    fn from_field(field: &'a Field) -> Option<Self>;
}

impl<'a> FromField<'a> for &'a str {
    fn from_field(field: &'a Field) -> Option<Self> {
        field.as_value().and_then(Value::as_str)
    }
}

impl<'a> FromField<'a> for bool {
    fn from_field(field: &'a Field) -> Option<Self> {
        field.as_value().and_then(Value::as_bool)
    }
}

impl<'a> FromField<'a> for u64 {
    fn from_field(field: &'a Field) -> Option<Self> {
        field.as_value().and_then(Value::as_u64)
    }
}

impl<'a> FromField<'a> for i64 {
    fn from_field(field: &'a Field) -> Option<Self> {
        field.as_value().and_then(Value::as_i64)
    }
}

impl<'a> FromField<'a> for &'a Value {
    fn from_field(field: &'a Field) -> Option<Self> {
        field.as_value().filter(|value| !value.is_null())
    }
}
