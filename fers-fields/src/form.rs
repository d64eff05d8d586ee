//! A validated set of top-level fields rendered and saved as one form.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::error::{FieldError, FieldsError, Result};
use crate::logging::Pretty;
use crate::namespace::{validate_identifier, validate_segment, NamespacePath};
use crate::registry::{AssetManifest, Capability, FieldRegistry, RenderContext, SaveContext};
use crate::store::ValueStore;
use crate::submission::Submission;
use crate::types::{FieldDefinition, FieldKind, FieldValue};

/// Top-level field id to value, in field order.
pub type Values = IndexMap<String, FieldValue>;

/// Result of [`Form::render`].
#[derive(Debug)]
pub struct RenderedForm {
    pub html: String,
    /// Capabilities the page must load, in first-request order.
    pub capabilities: Vec<Capability>,
    /// Fields replaced by a notice panel.
    pub errors: Vec<FieldError>,
}

/// Result of [`Form::save`].
#[derive(Debug, Default)]
pub struct SaveOutcome {
    /// Values to store. Fields that failed are absent.
    pub values: Values,
    pub errors: Vec<FieldError>,
}

impl SaveOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Top-level field definitions plus everything needed to render and save them.
pub struct Form {
    registry: Arc<FieldRegistry>,
    config: RenderConfig,
    base: NamespacePath,
    fields: Vec<FieldDefinition>,
}

impl Form {
    /// Build a form, rejecting definitions that could not round-trip.
    ///
    /// Checks every id (recursively) is a usable identifier and unique among
    /// its siblings, every kind has a handler, sorter keys are usable as name
    /// segments and nesting stays within `config.max_depth`. With `base`,
    /// every wire name is rooted at `base[...]`.
    pub fn new(
        registry: Arc<FieldRegistry>,
        config: RenderConfig,
        base: Option<&str>,
        fields: Vec<FieldDefinition>,
    ) -> Result<Self> {
        let base = match base {
            Some(base) => {
                validate_identifier(base)?;
                NamespacePath::new(base)
            }
            None => NamespacePath::root(),
        };
        validate_fields(&registry, &fields, &base, 1, config.max_depth)?;
        debug!(base = %base, fields = fields.len(), "form built");
        Ok(Self {
            registry,
            config,
            base,
            fields,
        })
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn base(&self) -> &NamespacePath {
        &self.base
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render every field, stored values first, defaults otherwise.
    pub fn render(&self, values: &Values) -> RenderedForm {
        let mut assets = AssetManifest::new();
        let mut ctx = RenderContext::new(&self.registry, &self.config, &mut assets);
        for def in &self.fields {
            let value = values.get(&def.id).cloned().or_else(|| def.initial_value());
            ctx.render_field(def, value.as_ref(), &self.base);
        }
        let (html, errors) = ctx.finish();
        RenderedForm {
            html,
            capabilities: assets.capabilities(),
            errors,
        }
    }

    /// Rebuild every field's value from a submission.
    ///
    /// A top-level field with any error below it is left out of `values`
    /// entirely, so persisting the outcome keeps its previous value.
    pub fn save(&self, submission: &Submission) -> SaveOutcome {
        let mut ctx = SaveContext::new(&self.registry, &self.config);
        let mut values = Values::new();
        for def in &self.fields {
            let before = ctx.error_count();
            let submitted = submission.get(&self.base.key(def.id.as_str()));
            let value = ctx.save_field(def, submitted, &self.base);
            if ctx.error_count() > before {
                debug!(field = %def.id, "field left unsaved");
                continue;
            }
            if let Some(value) = value {
                values.insert(def.id.clone(), value);
            }
        }
        let errors = ctx.into_errors();
        debug!("form saved: {}", Pretty(&values));
        SaveOutcome { values, errors }
    }

    /// Read the stored value of every top-level field.
    pub async fn load(&self, store: &dyn ValueStore, scope: &str) -> Result<Values> {
        let mut values = Values::new();
        for def in &self.fields {
            if let Some(value) = store.get(scope, &def.id).await? {
                values.insert(def.id.clone(), value);
            }
        }
        debug!(scope, loaded = values.len(), "form values loaded");
        Ok(values)
    }

    /// Write every saved value whole. Failed fields are not touched.
    pub async fn persist(
        &self,
        store: &dyn ValueStore,
        scope: &str,
        outcome: &SaveOutcome,
    ) -> Result<()> {
        for (key, value) in &outcome.values {
            store.set(scope, key, value).await?;
        }
        info!(
            scope,
            saved = outcome.values.len(),
            failed = outcome.errors.len(),
            "form persisted"
        );
        Ok(())
    }

    /// Parse, save and persist a url-encoded request body in one step.
    pub async fn submit(
        &self,
        store: &dyn ValueStore,
        scope: &str,
        body: &str,
    ) -> Result<SaveOutcome> {
        let outcome = self.save(&Submission::parse(body));
        self.persist(store, scope, &outcome).await?;
        Ok(outcome)
    }
}

fn validate_fields(
    registry: &FieldRegistry,
    fields: &[FieldDefinition],
    parent: &NamespacePath,
    level: usize,
    max_depth: usize,
) -> Result<()> {
    let mut seen = HashSet::new();
    for def in fields {
        validate_identifier(&def.id)?;
        if !seen.insert(def.id.as_str()) {
            return Err(FieldsError::DuplicateFieldName {
                name: def.id.clone(),
            });
        }
        let path = parent.key(def.id.as_str());
        if level > max_depth {
            return Err(FieldsError::DepthExceeded {
                limit: max_depth,
                path: path.to_string(),
            });
        }
        if registry.get(def.kind.tag()).is_none() {
            return Err(FieldsError::UnknownKind {
                kind: def.kind.tag().to_string(),
            });
        }
        match &def.kind {
            FieldKind::Sorter(opts) => {
                for key in opts.options.keys() {
                    validate_segment(key)?;
                }
            }
            FieldKind::Repeater(opts) => {
                validate_fields(registry, &opts.fields, &path.index(0), level + 1, max_depth)?;
            }
            _ => {}
        }
    }
    Ok(())
}
