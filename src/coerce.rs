//! Raw property text to typed values
//!
//! Resolution order for one property:
//! 1. an override registered for the exact (class, property) pair
//! 2. a cross-reference, when the object system reports the property as
//!    object-valued or its name is configured as a reference property
//! 3. a guess: `True`/`False`, then an integer, then an enum member for known
//!    enum properties, else the text unchanged
//!
//! References are returned unresolved; building the referenced object is the
//! runtime's job.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::trace;

use crate::config::{BuilderConfig, OverrideTable};
use crate::object::ObjectSystem;
use crate::value::Literal;

/// Result of coercing one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced {
    Literal(Literal),
    /// Id of another object in the document
    Reference(String),
}

/// Text that cannot be turned into a value for its property
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("override for {class}.{property} rejected the value")]
    Rejected { class: String, property: String },

    #[error("'{member}' is not a member of the enumeration for '{property}'")]
    UnknownMember { property: String, member: String },
}

/// The type that owns a property: its class string and resolved handle
#[derive(Debug)]
pub struct Owner<'a, T> {
    pub class: &'a str,
    pub ty: &'a T,
}

impl<T> Clone for Owner<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Owner<'_, T> {}

/// Coerces raw text using the object system's type knowledge and the
/// configured overrides
pub struct Coercer<'a, S: ObjectSystem> {
    objects: &'a S,
    overrides: &'a OverrideTable,
    reference_properties: &'a BTreeSet<String>,
}

impl<'a, S: ObjectSystem> Coercer<'a, S> {
    pub fn new(objects: &'a S, config: &'a BuilderConfig) -> Self {
        Self {
            objects,
            overrides: &config.overrides,
            reference_properties: &config.reference_properties,
        }
    }

    /// Coerce `raw` for `property` of `owner`. Without an owner no
    /// class-keyed override applies.
    pub fn coerce(
        &self,
        raw: &str,
        owner: Option<Owner<'_, S::Type>>,
        property: &str,
    ) -> Result<Coerced, CoerceError> {
        self.resolve(raw, owner.map(|o| o.class), owner.map(|o| o.ty), property)
    }

    /// Coerce a packing property of a child placed in a `container` class.
    ///
    /// Overrides are looked up under the container's class. The container
    /// type does not declare packing properties, so only configured
    /// reference names make one object-valued.
    pub fn coerce_packing(&self, raw: &str, container: &str, property: &str) -> Result<Coerced, CoerceError> {
        self.resolve(raw, Some(container), None, property)
    }

    fn resolve(
        &self,
        raw: &str,
        class: Option<&str>,
        ty: Option<&S::Type>,
        property: &str,
    ) -> Result<Coerced, CoerceError> {
        if let Some(class) = class {
            if let Some(decode) = self.overrides.get(class, property) {
                trace!(class, property, raw, "applying override");
                return decode(raw).map(Coerced::Literal).ok_or_else(|| CoerceError::Rejected {
                    class: class.to_string(),
                    property: property.to_string(),
                });
            }
        }

        if self.is_reference(ty, property) {
            trace!(property, raw, "cross-reference");
            return Ok(Coerced::Reference(raw.trim().to_string()));
        }

        self.guess(raw, property).map(Coerced::Literal)
    }

    fn is_reference(&self, owner: Option<&S::Type>, property: &str) -> bool {
        self.reference_properties.contains(property) || self.objects.is_reference_property(owner, property)
    }

    /// Infer a literal from text alone
    pub fn guess(&self, raw: &str, property: &str) -> Result<Literal, CoerceError> {
        let literal = match raw {
            "True" => Literal::Bool(true),
            "False" => Literal::Bool(false),
            _ => {
                if let Ok(n) = raw.trim().parse::<i64>() {
                    Literal::Int(n)
                } else if self.objects.is_enum_property(property) {
                    let member = normalize_member(raw);
                    let value = self.objects.enum_member(property, &member).ok_or_else(|| {
                        CoerceError::UnknownMember {
                            property: property.to_string(),
                            member: member.clone(),
                        }
                    })?;
                    Literal::Enum(value)
                } else {
                    Literal::Str(raw.to_string())
                }
            }
        };
        trace!(property, raw, value = %literal, "guessed value");
        Ok(literal)
    }
}

/// Upper-case, underscore-separated form of an enum member name
pub fn normalize_member(raw: &str) -> String {
    raw.trim().replace('-', "_").to_ascii_uppercase()
}
