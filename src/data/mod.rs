//! Change tracking state containers shared by every resource type.
//!
//! [`Immutable`] holds the baseline: the last known-good snapshot of a
//! resource's attributes. [`Mutable`] layers a map of pending changes on top
//! of it. Reads check pending changes first and fall back to the baseline.
//! The baseline is never modified in place; it is only replaced wholesale by
//! [`Mutable::commit`] or [`Mutable::clean`].

mod field;
mod schema;

pub use field::{Field, FromField};
pub use schema::{Schema, SchemaError};

use field::UNSET;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("missing required parameter `{name}`")]
    MissingRequiredParameter { name: String },
    #[error("unknown parameters provided: {}", names.join(","))]
    UnknownParameters { names: Vec<String> },
    #[error("expected type `{expected}` but received `{received}`")]
    InvalidType { expected: String, received: String },
}

type Attributes = BTreeMap<&'static str, Field>;

/// Baseline only attribute storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Immutable {
    schema: Schema,
    data: Attributes,
}

impl Immutable {
    /// Build a container from caller supplied values.
    ///
    /// Every required attribute must be present and every key must be declared
    /// in the schema. Optional attributes that are not supplied read as unset.
    pub fn new<K, I>(schema: Schema, values: I) -> Result<Immutable, DataError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Field)>,
    {
        let mut data = Attributes::new();
        let mut unknown = Vec::new();
        for (key, value) in values {
            match schema.lookup(key.as_ref()) {
                Some(name) => {
                    data.insert(name, value);
                }
                None => unknown.push(key.as_ref().to_string()),
            }
        }
        for name in schema.required {
            if !data.contains_key(name) {
                return Err(DataError::MissingRequiredParameter {
                    name: name.to_string(),
                });
            }
        }
        if !unknown.is_empty() {
            return Err(DataError::UnknownParameters { names: unknown });
        }
        Ok(Immutable { schema, data })
    }

    /// Build a container from a server mapping, skipping undeclared keys.
    pub fn load(schema: Schema, data: &Value) -> Result<Immutable, DataError> {
        let object = expect_object(data)?;
        Immutable::new(
            schema,
            object
                .iter()
                .filter(|(key, _)| schema.is_declared(key))
                .map(|(key, value)| (key.as_str(), Field::from(value.clone()))),
        )
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> &Field {
        self.data.get(name).unwrap_or(&UNSET)
    }

    /// Current attribute values with unset entries removed.
    pub fn to_map(&self) -> Map<String, Value> {
        self.data
            .iter()
            .filter_map(|(key, field)| field.to_clean_value().map(|v| (key.to_string(), v)))
            .collect()
    }
}

/// Field selection applied by [`Mutable::clean`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanFilter<'a> {
    pub ignores: &'a [&'a str],
    pub only: &'a [&'a str],
}

impl<'a> CleanFilter<'a> {
    pub fn all() -> CleanFilter<'static> {
        CleanFilter::default()
    }

    pub fn ignoring(ignores: &'a [&'a str]) -> CleanFilter<'a> {
        CleanFilter { ignores, only: &[] }
    }

    pub fn only(only: &'a [&'a str]) -> CleanFilter<'a> {
        CleanFilter { ignores: &[], only }
    }

    fn accepts(&self, key: &str) -> bool {
        if self.ignores.iter().any(|ignored| *ignored == key) {
            return false;
        }
        self.only.is_empty() || self.only.iter().any(|wanted| *wanted == key)
    }
}

/// Attribute storage with pending change tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutable {
    base: Immutable,
    pending: Attributes,
}

impl Mutable {
    pub fn new<K, I>(schema: Schema, values: I) -> Result<Mutable, DataError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Field)>,
    {
        Ok(Mutable {
            base: Immutable::new(schema, values)?,
            pending: Attributes::new(),
        })
    }

    pub fn load(schema: Schema, data: &Value) -> Result<Mutable, DataError> {
        Ok(Mutable {
            base: Immutable::load(schema, data)?,
            pending: Attributes::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        self.base.schema()
    }

    pub fn get(&self, name: &str) -> &Field {
        match self.pending.get(name) {
            Some(value) => value,
            None => self.base.get(name),
        }
    }

    /// Record a pending change. Only reachable through generated setters,
    /// which exist for mutable attributes alone.
    pub(crate) fn set(&mut self, name: &'static str, value: Field) {
        self.pending.insert(name, value);
    }

    /// True when any change is pending.
    pub fn dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn dirty_key(&self, name: &str) -> bool {
        self.pending.contains_key(name)
    }

    /// Merge pending changes into the baseline and clear them.
    pub fn commit(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let mut data = self.base.data.clone();
        data.extend(pending);
        self.base = Immutable {
            schema: self.base.schema,
            data,
        };
    }

    /// Adopt values from `data` (typically a server response) into the
    /// baseline, dropping any pending change for the keys it overwrites.
    ///
    /// Keys not declared in the schema and keys excluded by `filter` are
    /// skipped. Pending changes for other keys are kept.
    pub fn clean(&mut self, data: &Value, filter: CleanFilter<'_>) -> Result<(), DataError> {
        let object = expect_object(data)?;
        let mut updated = self.base.data.clone();
        for (key, value) in object {
            if !filter.accepts(key) {
                continue;
            }
            if let Some(name) = self.base.schema.lookup(key) {
                updated.insert(name, Field::from(value.clone()));
                self.pending.remove(name);
            }
        }
        self.base = Immutable {
            schema: self.base.schema,
            data: updated,
        };
        Ok(())
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.base.to_map();
        for (key, field) in &self.pending {
            match field.to_clean_value() {
                Some(value) => {
                    map.insert(key.to_string(), value);
                }
                None => {
                    map.remove(*key);
                }
            }
        }
        map
    }
}

fn expect_object(data: &Value) -> Result<&Map<String, Value>, DataError> {
    data.as_object().ok_or_else(|| DataError::InvalidType {
        expected: "object".to_string(),
        received: data.to_string(),
    })
}
