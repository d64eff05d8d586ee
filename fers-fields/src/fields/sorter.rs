//! Sorter: two ordered lists partitioning a fixed set of items.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{FieldsError, Result};
use crate::markup::Markup;
use crate::namespace::NamespacePath;
use crate::registry::{Capability, Field, RenderContext, SaveContext};
use crate::submission::Submitted;
use crate::types::{Choices, FieldDefinition, FieldKind, FieldValue, SorterOptions, SorterState};

const ENABLED: &str = "enabled";
const DISABLED: &str = "disabled";

#[derive(Debug, Clone, Copy, Default)]
pub struct SorterField;

fn options(def: &FieldDefinition) -> Result<&SorterOptions> {
    match &def.kind {
        FieldKind::Sorter(opts) => Ok(opts),
        other => Err(FieldsError::UnknownKind {
            kind: other.tag().to_string(),
        }),
    }
}

fn list(
    out: &mut Markup,
    path: &NamespacePath,
    which: &str,
    title: &str,
    items: &IndexMap<String, String>,
) {
    if !title.is_empty() {
        out.element("div", &[("class", "fers-sorter-title")], title);
    }
    let class = format!("fers-{which}");
    out.open("ul", &[("class", class.as_str())]);
    for (key, label) in items {
        let name = path.key(which).key(key.as_str()).to_string();
        out.open("li", &[])
            .void(
                "input",
                &[("type", "hidden"), ("name", name.as_str()), ("value", label.as_str())],
            )
            .element("label", &[], label)
            .close("li");
    }
    out.close("ul");
}

fn submitted_list(node: Option<&Submitted>, which: &str) -> IndexMap<String, String> {
    node.and_then(|n| n.get(which))
        .map(|n| {
            n.children()
                .iter()
                .filter_map(|(key, item)| {
                    item.value().map(|label| (key.clone(), label.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Check that `state` partitions `universe`: every key exactly once.
pub fn check_universe(field: &str, universe: &Choices, state: &SorterState) -> Result<()> {
    let duplicated: Vec<String> = state
        .enabled
        .keys()
        .filter(|k| state.disabled.contains_key(*k))
        .cloned()
        .collect();
    let unexpected: Vec<String> = state
        .keys()
        .filter(|k| !universe.contains_key(*k))
        .map(str::to_string)
        .collect();
    let missing: Vec<String> = universe
        .keys()
        .filter(|k| !state.enabled.contains_key(*k) && !state.disabled.contains_key(*k))
        .cloned()
        .collect();

    if duplicated.is_empty() && unexpected.is_empty() && missing.is_empty() {
        return Ok(());
    }
    Err(FieldsError::UniverseMismatch {
        field: field.to_string(),
        missing,
        unexpected,
        duplicated,
    })
}

impl Field for SorterField {
    fn render(
        &self,
        def: &FieldDefinition,
        value: Option<&FieldValue>,
        path: &NamespacePath,
        ctx: &mut RenderContext<'_>,
    ) -> Result<()> {
        let opts = options(def)?;
        let state = match value {
            Some(FieldValue::Sorter(state)) if !state.is_empty() => state.clone(),
            _ => def
                .initial_value()
                .and_then(|v| v.as_sorter().cloned())
                .unwrap_or_else(|| SorterState::all_disabled(&opts.options)),
        };

        let out = ctx.out();
        out.open(
            "div",
            &[("class", "fers-sorter"), ("data-depend-id", def.id.as_str())],
        );
        if opts.show_disabled {
            out.open("div", &[("class", "fers-modules")]);
            list(out, path, ENABLED, &opts.enabled_title, &state.enabled);
            out.close("div").open("div", &[("class", "fers-modules")]);
            list(out, path, DISABLED, &opts.disabled_title, &state.disabled);
            out.close("div");
        } else {
            list(out, path, ENABLED, &opts.enabled_title, &state.enabled);
        }
        out.close("div");

        debug!(
            path = %path,
            enabled = state.enabled.len(),
            disabled = state.disabled.len(),
            "sorter rendered"
        );
        Ok(())
    }

    fn save(
        &self,
        def: &FieldDefinition,
        submitted: Option<&Submitted>,
        path: &NamespacePath,
        ctx: &mut SaveContext<'_>,
    ) -> Result<Option<FieldValue>> {
        let opts = options(def)?;
        let enabled = submitted_list(submitted, ENABLED);

        let disabled = if opts.show_disabled {
            submitted_list(submitted, DISABLED)
        } else {
            // Hidden column: whatever is not enabled stays disabled, listed in
            // universe order since the page never carried the stored order.
            opts.options
                .iter()
                .filter(|(key, _)| !enabled.contains_key(*key))
                .map(|(key, label)| (key.clone(), label.clone()))
                .collect()
        };
        let state = SorterState { enabled, disabled };

        if ctx.config().validate_sorter_universe {
            check_universe(&def.id, &opts.options, &state)?;
        }

        debug!(
            path = %path,
            enabled = state.enabled.len(),
            disabled = state.disabled.len(),
            "sorter saved"
        );
        Ok(Some(FieldValue::Sorter(state)))
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Sortable]
    }
}
