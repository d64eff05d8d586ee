//! Field kind dispatch.
//!
//! Every kind tag maps to one [`Field`] handler. Handlers render into a
//! shared [`RenderContext`] and rebuild values through a [`SaveContext`];
//! both contexts dispatch children back through the registry, which is how
//! repeaters nest arbitrary fields (including other repeaters).

use std::collections::HashMap;

use indexmap::IndexSet;
use tracing::{trace, warn};

use crate::config::RenderConfig;
use crate::error::{FieldError, FieldsError, Result};
use crate::fields::{InputField, RepeaterField, SorterField};
use crate::markup::Markup;
use crate::namespace::NamespacePath;
use crate::submission::Submitted;
use crate::types::{FieldDefinition, FieldValue};

/// Interactive behaviour a rendered control needs from the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Drag-and-drop reordering.
    Sortable,
}

impl Capability {
    /// Script handle that provides the capability.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Sortable => "jquery-ui-sortable",
        }
    }
}

/// Makes capabilities available before rendered controls become interactive.
///
/// Requests are idempotent; a loader sees the same capability once per
/// field that needs it.
pub trait AssetLoader {
    fn ensure_capability(&mut self, capability: Capability);
}

/// Records requested capabilities in first-request order.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    requested: IndexSet<Capability>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.requested.contains(&capability)
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.requested.iter().copied().collect()
    }
}

impl AssetLoader for AssetManifest {
    fn ensure_capability(&mut self, capability: Capability) {
        if self.requested.insert(capability) {
            trace!(capability = capability.name(), "capability requested");
        }
    }
}

/// Render and save behaviour of one field kind.
pub trait Field: Send + Sync {
    /// Write the control for `def` at `path` into `ctx`.
    fn render(
        &self,
        def: &FieldDefinition,
        value: Option<&FieldValue>,
        path: &NamespacePath,
        ctx: &mut RenderContext<'_>,
    ) -> Result<()>;

    /// Rebuild the value of `def` from its submitted node.
    ///
    /// `Ok(None)` means the field submitted nothing to store.
    fn save(
        &self,
        def: &FieldDefinition,
        submitted: Option<&Submitted>,
        path: &NamespacePath,
        ctx: &mut SaveContext<'_>,
    ) -> Result<Option<FieldValue>>;

    /// Capabilities requested after a successful render.
    fn capabilities(&self) -> &'static [Capability] {
        &[]
    }
}

/// Kind tag to handler table, built once at startup.
pub struct FieldRegistry {
    handlers: HashMap<&'static str, Box<dyn Field>>,
}

impl FieldRegistry {
    /// A registry with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with every built-in kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for tag in InputField::TAGS {
            registry.register(tag, InputField);
        }
        registry
            .register("repeater", RepeaterField)
            .register("sorter", SorterField);
        registry
    }

    /// Register or replace the handler for `tag`.
    pub fn register(&mut self, tag: &'static str, handler: impl Field + 'static) -> &mut Self {
        self.handlers.insert(tag, Box::new(handler));
        self
    }

    pub fn get(&self, tag: &str) -> Option<&dyn Field> {
        self.handlers.get(tag).map(Box::as_ref)
    }

    /// Registered tags, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    fn handler(&self, def: &FieldDefinition) -> Result<&dyn Field> {
        self.get(def.kind.tag()).ok_or_else(|| FieldsError::UnknownKind {
            kind: def.kind.tag().to_string(),
        })
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// State threaded through one render pass.
pub struct RenderContext<'a> {
    registry: &'a FieldRegistry,
    config: &'a RenderConfig,
    assets: &'a mut dyn AssetLoader,
    out: Markup,
    errors: Vec<FieldError>,
    depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        registry: &'a FieldRegistry,
        config: &'a RenderConfig,
        assets: &'a mut dyn AssetLoader,
    ) -> Self {
        Self {
            registry,
            config,
            assets,
            out: Markup::new(),
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &'a RenderConfig {
        self.config
    }

    pub fn out(&mut self) -> &mut Markup {
        &mut self.out
    }

    /// Render `def` below `parent`, wrapped in the field container.
    ///
    /// A failing field leaves no partial markup: its output is rolled back
    /// and replaced by a notice panel, and the error is recorded. Siblings
    /// are unaffected.
    pub fn render_field(
        &mut self,
        def: &FieldDefinition,
        value: Option<&FieldValue>,
        parent: &NamespacePath,
    ) {
        let path = parent.key(def.id.as_str());
        let mark = self.out.len();
        let registry = self.registry;

        let result = self.check_depth(&path).and_then(|()| {
            let handler = registry.handler(def)?;
            self.depth += 1;
            self.out.field_before(def);
            let rendered = handler.render(def, value, &path, self);
            self.out.field_after(def);
            self.depth -= 1;
            rendered.map(|()| handler)
        });

        match result {
            Ok(handler) => {
                for capability in handler.capabilities() {
                    self.assets.ensure_capability(*capability);
                }
            }
            Err(error) => {
                warn!(path = %path, %error, "field render failed");
                self.out.truncate(mark);
                self.notice(&error);
                self.errors.push(FieldError::new(path.to_string(), error));
            }
        }
    }

    /// Markup and errors collected so far.
    pub fn finish(self) -> (String, Vec<FieldError>) {
        (self.out.into_string(), self.errors)
    }

    fn check_depth(&self, path: &NamespacePath) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(FieldsError::DepthExceeded {
                limit: self.config.max_depth,
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn notice(&mut self, error: &FieldsError) {
        let message = match error {
            FieldsError::IdentifierConflict { .. } => self.config.messages.id_conflict.clone(),
            other => format!("Error: {other}"),
        };
        self.out
            .element("div", &[("class", "fers-notice fers-notice-danger")], &message);
    }
}

/// State threaded through one save pass.
pub struct SaveContext<'a> {
    registry: &'a FieldRegistry,
    config: &'a RenderConfig,
    errors: Vec<FieldError>,
    depth: usize,
}

impl<'a> SaveContext<'a> {
    pub fn new(registry: &'a FieldRegistry, config: &'a RenderConfig) -> Self {
        Self {
            registry,
            config,
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub fn config(&self) -> &'a RenderConfig {
        self.config
    }

    /// Rebuild the value of `def` below `parent`.
    ///
    /// Errors are recorded against the field's path and yield `None`.
    pub fn save_field(
        &mut self,
        def: &FieldDefinition,
        submitted: Option<&Submitted>,
        parent: &NamespacePath,
    ) -> Option<FieldValue> {
        let path = parent.key(def.id.as_str());
        let registry = self.registry;

        let result = self.check_depth(&path).and_then(|()| {
            let handler = registry.handler(def)?;
            self.depth += 1;
            let saved = handler.save(def, submitted, &path, self);
            self.depth -= 1;
            saved
        });

        match result {
            Ok(value) => value,
            Err(error) => {
                warn!(path = %path, %error, "field save failed");
                self.errors.push(FieldError::new(path.to_string(), error));
                None
            }
        }
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    fn check_depth(&self, path: &NamespacePath) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(FieldsError::DepthExceeded {
                limit: self.config.max_depth,
                path: path.to_string(),
            });
        }
        Ok(())
    }
}
