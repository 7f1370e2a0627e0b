//! Declarative resource schemas.
//!
//! A schema tells the host which fields a resource takes, which of them the
//! provider computes, which force a replacement when changed, and how values
//! are normalized before they are stored.

mod data;

pub use data::{FieldValue, ResourceData};

use crate::error::{ConfigError, ProviderError, Result};

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single string.
    String,
    /// A set of strings.
    StringSet,
}

/// Who provides a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be supplied by the user.
    Required,
    /// May be supplied by the user.
    Optional,
    /// Filled in by the provider after a read.
    Computed,
}

/// Declaration of a single field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Field name.
    pub name: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Who provides the value.
    pub presence: Presence,
    /// Whether changing the value requires replacing the resource.
    pub force_new: bool,
    /// Normalization applied before the value is stored.
    pub normalize: Option<fn(&str) -> String>,
}

impl FieldSchema {
    /// Declares a required string field that forces replacement.
    #[must_use]
    pub const fn required_string(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            presence: Presence::Required,
            force_new: true,
            normalize: None,
        }
    }

    /// Declares a computed set of strings.
    #[must_use]
    pub const fn computed_set(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::StringSet,
            presence: Presence::Computed,
            force_new: false,
            normalize: None,
        }
    }

    /// Attaches a normalization function.
    #[must_use]
    pub const fn normalized_with(mut self, normalize: fn(&str) -> String) -> Self {
        self.normalize = Some(normalize);
        self
    }
}

/// Schema of a resource type.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    /// Creates a schema from field declarations.
    #[must_use]
    pub const fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    /// Returns all field declarations.
    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Looks up a field declaration.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks user-supplied configuration against the schema.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown field, a value of the wrong
    /// kind, a missing required field, or a user-set computed field.
    pub fn validate(&self, data: &ResourceData) -> Result<()> {
        for (name, value) in data.fields() {
            let Some(field) = self.field(name) else {
                return Err(invalid(name, format!("unknown field '{name}'")));
            };
            if field.presence == Presence::Computed {
                return Err(invalid(name, format!("'{name}' is computed and cannot be set")));
            }
            let kind_matches = matches!(
                (field.kind, value),
                (FieldKind::String, FieldValue::Str(_)) | (FieldKind::StringSet, FieldValue::Set(_))
            );
            if !kind_matches {
                return Err(invalid(name, format!("'{name}' has the wrong value type")));
            }
        }

        for field in &self.fields {
            if field.presence != Presence::Required {
                continue;
            }
            let present = match field.kind {
                FieldKind::String => data.get_str(field.name).is_some_and(|s| !s.is_empty()),
                FieldKind::StringSet => data.get_set(field.name).is_some(),
            };
            if !present {
                return Err(invalid(field.name, format!("'{}' is required", field.name)));
            }
        }

        Ok(())
    }

    /// Applies each field's normalization function in place.
    pub fn normalize(&self, data: &mut ResourceData) {
        for field in &self.fields {
            let Some(normalize) = field.normalize else {
                continue;
            };
            let normalized = data.get_str(field.name).map(normalize);
            if let Some(value) = normalized {
                data.set_str(field.name, value);
            }
        }
    }

    /// Returns the force-new fields whose values differ between `old` and
    /// `new`, after normalization.
    #[must_use]
    pub fn fields_requiring_replacement(
        &self,
        old: &ResourceData,
        new: &ResourceData,
    ) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.force_new)
            .filter(|f| {
                let normalize = |value: Option<&FieldValue>| match (value, f.normalize) {
                    (Some(FieldValue::Str(s)), Some(n)) => Some(FieldValue::Str(n(s))),
                    (other, _) => other.cloned(),
                };
                normalize(old.get(f.name)) != normalize(new.get(f.name))
            })
            .map(|f| f.name)
            .collect()
    }
}

/// Normalizes an Azure location (`"West US"` becomes `"westus"`).
#[must_use]
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn invalid(field: &str, message: String) -> ProviderError {
    ProviderError::Config(ConfigError::validation(message, field))
}
