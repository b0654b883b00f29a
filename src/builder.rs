//! Read, validate and compile a document once; instantiate it many times

use std::path::Path;
use std::sync::Arc;

use crate::config::BuilderConfig;
use crate::markup::{self, Element};
use crate::object::ObjectSystem;
use crate::runtime::{Instance, InstantiateError, Registry, Runtime};
use crate::signals::{self, HandlerSet};
use crate::template::{compile, Template, TemplateSet};
use crate::validate::{validate, Diagnostic, Warning};
use crate::LoadError;

/// A compiled interface document bound to an object system
pub struct Builder<S: ObjectSystem> {
    objects: S,
    config: BuilderConfig,
    templates: TemplateSet<S::Type>,
    warnings: Vec<Warning>,
}

impl<S: ObjectSystem> Builder<S> {
    /// Parse, validate and compile markup source
    pub fn from_str(source: &str, objects: S, config: BuilderConfig) -> Result<Self, LoadError> {
        let root = markup::parse(source).map_err(LoadError::Parse)?;
        Ok(Self::from_tree(&root, objects, config)?)
    }

    /// Read and compile a document file
    pub fn from_file(path: &Path, objects: S, config: BuilderConfig) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&source, objects, config)
    }

    /// Validate and compile an already parsed tree
    pub fn from_tree(root: &Element, objects: S, config: BuilderConfig) -> Result<Self, Diagnostic> {
        let warnings = validate(root, &config)?;
        let templates = compile(root, &objects, &config)?;
        Ok(Self {
            objects,
            config,
            templates,
            warnings,
        })
    }

    pub fn templates(&self) -> &TemplateSet<S::Type> {
        &self.templates
    }

    /// Get a compiled template by id
    pub fn template(&self, id: &str) -> Option<&Arc<Template<S::Type>>> {
        self.templates.get(id)
    }

    /// Warnings collected during validation
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn objects(&self) -> &S {
        &self.objects
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    fn runtime(&self) -> Runtime<'_, S> {
        Runtime::new(&self.objects, &self.templates, &self.config)
    }

    /// Build a fresh object graph from the template with this id
    pub fn instantiate(&self, id: &str) -> Result<Instance<S>, InstantiateError<S::Error>> {
        let template = self
            .templates
            .get(id)
            .ok_or_else(|| InstantiateError::UnknownTemplate { id: id.to_string() })?;
        self.runtime().instantiate(template)
    }

    /// Build from `template` into a caller-owned registry
    pub fn instantiate_into(
        &self,
        template: &Template<S::Type>,
        registry: &mut Registry<S::Object>,
    ) -> Result<S::Object, InstantiateError<S::Error>> {
        self.runtime().instantiate_into(template, registry)
    }

    /// Connect an instance's signals to handlers, returning the number connected
    pub fn bind_handlers(
        &self,
        instance: &Instance<S>,
        handlers: &HandlerSet<'_, S::Callback>,
    ) -> Result<usize, S::Error> {
        signals::bind_handlers(&self.objects, instance, handlers)
    }
}
