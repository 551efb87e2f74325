use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("unknown attribute name provided `{name}`")]
    UnknownMutableAttribute { name: String },
    #[error("attribute `{name}` is declared more than once")]
    DuplicateAttribute { name: String },
}

/// Attribute declaration for one resource type.
///
/// Resource types declare their schema as a `const` through
/// `resource_attributes!`, which also checks [`Schema::is_consistent`] at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub mutable: &'static [&'static str],
}

const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

const fn list_contains(list: &[&str], name: &str) -> bool {
    let mut i = 0;
    while i < list.len() {
        if str_eq(list[i], name) {
            return true;
        }
        i += 1;
    }
    false
}

impl Schema {
    pub const fn is_declared(&self, name: &str) -> bool {
        list_contains(self.required, name) || list_contains(self.optional, name)
    }

    pub const fn is_required(&self, name: &str) -> bool {
        list_contains(self.required, name)
    }

    pub const fn is_mutable(&self, name: &str) -> bool {
        list_contains(self.mutable, name)
    }

    /// Every mutable name must be a declared required or optional name.
    pub const fn is_consistent(&self) -> bool {
        let mut i = 0;
        while i < self.mutable.len() {
            if !self.is_declared(self.mutable[i]) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Resolve a caller supplied key to its declared `'static` name.
    pub fn lookup(&self, name: &str) -> Option<&'static str> {
        self.attributes().find(|attr| *attr == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &'static str> {
        self.required.iter().chain(self.optional.iter()).copied()
    }

    /// Run time counterpart of [`Schema::is_consistent`] with a descriptive error.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for name in self.mutable {
            if !self.is_declared(name) {
                return Err(SchemaError::UnknownMutableAttribute {
                    name: name.to_string(),
                });
            }
        }
        let mut seen: Vec<&str> = Vec::new();
        for name in self.attributes() {
            if seen.contains(&name) {
                return Err(SchemaError::DuplicateAttribute {
                    name: name.to_string(),
                });
            }
            seen.push(name);
        }
        Ok(())
    }
}
