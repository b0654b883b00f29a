//! Classbuilder - compile interface markup into reusable object templates
//!
//! An interface document is read and checked once, compiled into immutable
//! [`Template`]s, and then instantiated any number of times. Each
//! instantiation builds an independent object graph through an
//! [`ObjectSystem`], with its own id registry. Signal bindings are connected
//! to caller-supplied handlers afterwards.
//!
//! # Example
//!
//! ```rust
//! use classbuilder::{Builder, BuilderConfig, MemoryObjects};
//!
//! let builder = Builder::from_str(
//!     r#"<interface>
//!          <object class="NsWindow" id="Main">
//!            <child>
//!              <object class="NsLabel" id="lbl">
//!                <property name="text">Hi</property>
//!              </object>
//!            </child>
//!          </object>
//!        </interface>"#,
//!     MemoryObjects::permissive(),
//!     BuilderConfig::default(),
//! )
//! .unwrap();
//!
//! let first = builder.instantiate("Main").unwrap();
//! let second = builder.instantiate("Main").unwrap();
//! assert!(!first.object().ptr_eq(second.object()));
//! assert_eq!(
//!     first.get("lbl").unwrap().property("text").unwrap().as_str(),
//!     Some("Hi")
//! );
//! ```

pub mod builder;
pub mod coerce;
pub mod config;
pub mod error;
pub mod markup;
pub mod object;
pub mod runtime;
pub mod signals;
pub mod template;
pub mod validate;
pub mod value;

use std::path::PathBuf;

use thiserror::Error;

pub use builder::Builder;
pub use config::{BuilderConfig, ConfigError, NamespacePolicy, OverrideTable};
pub use error::ParseError;
pub use object::{MemoryObject, MemoryObjects, ObjectSystem};
pub use runtime::{Instance, InstantiateError, Registry};
pub use signals::{bind_handlers, HandlerSet, NamedHandlers};
pub use template::{Template, TemplateSet};
pub use validate::{Diagnostic, Rule, Warning, WarningKind};
pub use value::{EnumValue, Literal, Value};

/// Errors that can occur while loading a document
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed markup
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Well-formed markup that breaks a structural rule
    #[error("invalid document: {0}")]
    BadInput(#[from] Diagnostic),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Vec<ParseError>> for LoadError {
    fn from(errors: Vec<ParseError>) -> Self {
        LoadError::Parse(errors)
    }
}

impl LoadError {
    /// Render the error with source context where it has a location
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            LoadError::Parse(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            LoadError::BadInput(diagnostic) => diagnostic.format(source, filename),
            other => other.to_string(),
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
