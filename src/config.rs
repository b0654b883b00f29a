//! Configuration for compiling and instantiating interface documents
//!
//! Everything the core needs to know about a particular toolkit that is not
//! asked of the object system lives here: how class names split into a
//! namespace and a bare type, which property names always hold references,
//! and the override table used for values that cannot be inferred from text.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::value::{EnumValue, Literal};

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How a `class` attribute splits into `(namespace, bare type)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespacePolicy {
    /// Split at the first lowercase→uppercase transition: `MylibFancyObject`
    /// becomes (`Mylib`, `FancyObject`)
    CamelCase,
    /// Strip a literal prefix, which is also the namespace: with `Gtk`,
    /// `GtkBox` becomes (`Gtk`, `Box`)
    Prefix(String),
}

impl Default for NamespacePolicy {
    fn default() -> Self {
        NamespacePolicy::CamelCase
    }
}

impl NamespacePolicy {
    /// Split a class name, or `None` if the policy does not apply to it
    pub fn split<'a>(&self, class: &'a str) -> Option<(&'a str, &'a str)> {
        match self {
            NamespacePolicy::CamelCase => {
                let bytes = class.as_bytes();
                let boundary = bytes
                    .windows(2)
                    .position(|w| w[0].is_ascii_lowercase() && w[1].is_ascii_uppercase())?;
                Some(class.split_at(boundary + 1))
            }
            NamespacePolicy::Prefix(prefix) => {
                let rest = class.strip_prefix(prefix.as_str())?;
                if rest.is_empty() {
                    None
                } else {
                    Some((&class[..prefix.len()], rest))
                }
            }
        }
    }

    /// Short human description, used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            NamespacePolicy::CamelCase => "a lowercase-to-uppercase namespace boundary".to_string(),
            NamespacePolicy::Prefix(p) => format!("the namespace prefix '{}'", p),
        }
    }
}

/// Decodes raw property text into a literal; `None` rejects the text
pub type Decoder = Arc<dyn Fn(&str) -> Option<Literal> + Send + Sync>;

/// Per-(class, property) decoders that take precedence over type guessing
#[derive(Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<(String, String), Decoder>,
}

impl OverrideTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for `property` on objects whose class attribute is `class`
    pub fn insert<F>(&mut self, class: &str, property: &str, decode: F)
    where
        F: Fn(&str) -> Option<Literal> + Send + Sync + 'static,
    {
        self.entries
            .insert((class.to_string(), property.to_string()), Arc::new(decode));
    }

    /// Register a decoder mapping exact text to members of an enumeration
    pub fn insert_enum(&mut self, class: &str, property: &str, enum_name: &str, values: HashMap<String, i64>) {
        let enum_name = enum_name.to_string();
        self.insert(class, property, move |text| {
            values.get(text).map(|&value| {
                Literal::Enum(EnumValue::new(&enum_name, text.to_ascii_uppercase(), value))
            })
        });
    }

    /// Find the decoder for an exact (class, property) pair
    pub fn get(&self, class: &str, property: &str) -> Option<&Decoder> {
        self.entries.get(&(class.to_string(), property.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for OverrideTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("OverrideTable").field("entries", &keys).finish()
    }
}

/// Configuration options for compilation and instantiation
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// How class names split into namespace and type
    pub namespace: NamespacePolicy,

    /// Reject classes the namespace policy cannot split during validation,
    /// instead of at compile time
    pub strict_class_names: bool,

    /// Property names whose values always name another object's id
    pub reference_properties: BTreeSet<String>,

    /// Decoders for values that cannot be inferred from their text
    pub overrides: OverrideTable,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            namespace: NamespacePolicy::CamelCase,
            strict_class_names: true,
            reference_properties: BTreeSet::new(),
            overrides: OverrideTable::new(),
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    strict_class_names: Option<bool>,
    #[serde(default)]
    reference_properties: Vec<String>,
    namespace: Option<TomlNamespace>,
    #[serde(default)]
    overrides: Vec<TomlOverride>,
}

#[derive(Deserialize)]
struct TomlNamespace {
    policy: String,
    prefix: Option<String>,
}

#[derive(Deserialize)]
struct TomlOverride {
    class: String,
    property: String,
    #[serde(rename = "enum")]
    enum_name: String,
    values: HashMap<String, i64>,
}

impl BuilderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the namespace splitting policy
    pub fn with_namespace_policy(mut self, policy: NamespacePolicy) -> Self {
        self.namespace = policy;
        self
    }

    /// Set whether unsplittable class names fail validation
    pub fn with_strict_class_names(mut self, strict: bool) -> Self {
        self.strict_class_names = strict;
        self
    }

    /// Treat every property called `name` as a cross-reference
    pub fn with_reference_property(mut self, name: impl Into<String>) -> Self {
        self.reference_properties.insert(name.into());
        self
    }

    /// Register a value override for (class, property)
    pub fn with_override<F>(mut self, class: &str, property: &str, decode: F) -> Self
    where
        F: Fn(&str) -> Option<Literal> + Send + Sync + 'static,
    {
        self.overrides.insert(class, property, decode);
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(strict) = parsed.strict_class_names {
            config.strict_class_names = strict;
        }
        config.reference_properties.extend(parsed.reference_properties);

        if let Some(ns) = parsed.namespace {
            config.namespace = match (ns.policy.as_str(), ns.prefix) {
                ("camel-case", None) => NamespacePolicy::CamelCase,
                ("prefix", Some(prefix)) if !prefix.is_empty() => NamespacePolicy::Prefix(prefix),
                ("prefix", _) => {
                    return Err(ConfigError::Invalid(
                        "namespace policy 'prefix' needs a non-empty prefix".to_string(),
                    ))
                }
                ("camel-case", Some(_)) => {
                    return Err(ConfigError::Invalid(
                        "namespace policy 'camel-case' takes no prefix".to_string(),
                    ))
                }
                (other, _) => {
                    return Err(ConfigError::Invalid(format!(
                        "unknown namespace policy '{}' (expected 'camel-case' or 'prefix')",
                        other
                    )))
                }
            };
        }

        for o in parsed.overrides {
            config
                .overrides
                .insert_enum(&o.class, &o.property, &o.enum_name, o.values);
        }

        Ok(config)
    }
}
