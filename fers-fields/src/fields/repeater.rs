//! Repeater: an orderable list of identical field groups.

use tracing::{debug, warn};

use crate::error::{Bound, FieldsError, Result};
use crate::markup::Markup;
use crate::namespace::NamespacePath;
use crate::registry::{Capability, Field, RenderContext, SaveContext};
use crate::submission::Submitted;
use crate::types::{FieldDefinition, FieldKind, FieldValue, RepeaterOptions, Row};

#[derive(Debug, Clone, Copy, Default)]
pub struct RepeaterField;

fn options(def: &FieldDefinition) -> Result<&RepeaterOptions> {
    match &def.kind {
        FieldKind::Repeater(opts) => Ok(opts),
        other => Err(FieldsError::UnknownKind {
            kind: other.tag().to_string(),
        }),
    }
}

/// Sort, clone and remove affordances shared by rows and the template.
fn helper(out: &mut Markup, confirm: &str) {
    out.open("div", &[("class", "fers-repeater-helper")])
        .open("div", &[("class", "fers-repeater-helper-inner")])
        .element("i", &[("class", "fers-repeater-sort fas fa-arrows-alt")], "")
        .element("i", &[("class", "fers-repeater-clone far fa-clone")], "")
        .element(
            "i",
            &[
                ("class", "fers-repeater-remove fers-confirm fas fa-times"),
                ("data-confirm", confirm),
            ],
            "",
        )
        .close("div")
        .close("div");
}

/// Row keys are plain decimal indexes as rendered: `1`, never `01` or `+1`.
fn row_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|index| index.to_string() == key)
}

impl Field for RepeaterField {
    fn render(
        &self,
        def: &FieldDefinition,
        value: Option<&FieldValue>,
        path: &NamespacePath,
        ctx: &mut RenderContext<'_>,
    ) -> Result<()> {
        let opts = options(def)?;
        if path.ancestry_has_key(&def.id) {
            return Err(FieldsError::IdentifierConflict {
                id: def.id.clone(),
                namespace: path.to_string(),
            });
        }
        let messages = &ctx.config().messages;

        // Hidden group the client clones for new rows.
        let template = path.template().index(0);
        ctx.out()
            .open(
                "div",
                &[
                    ("class", "fers-repeater-item fers-repeater-hidden"),
                    ("data-depend-id", def.id.as_str()),
                ],
            )
            .open("div", &[("class", "fers-repeater-content")]);
        for child in &opts.fields {
            let default = child.initial_value();
            ctx.render_field(child, default.as_ref(), &template);
        }
        ctx.out().close("div");
        helper(ctx.out(), &messages.confirm_remove);
        ctx.out().close("div");

        let field_id = format!("[{}]", def.id);
        let (min, max) = (opts.min.to_string(), opts.max.to_string());
        ctx.out().open(
            "div",
            &[
                ("class", "fers-repeater-wrapper fers-data-wrapper"),
                ("data-field-id", field_id.as_str()),
                ("data-max", max.as_str()),
                ("data-min", min.as_str()),
            ],
        );

        let rows: &[Row] = match value {
            Some(FieldValue::Rows(rows)) => rows.as_slice(),
            Some(other) => {
                debug!(path = %path, ?other, "repeater value is not a row list, rendering empty");
                &[]
            }
            None => &[],
        };
        for (index, row) in rows.iter().enumerate() {
            let row_path = path.index(index);
            ctx.out()
                .open("div", &[("class", "fers-repeater-item")])
                .open("div", &[("class", "fers-repeater-content")]);
            for child in &opts.fields {
                ctx.render_field(child, row.get(&child.id), &row_path);
            }
            ctx.out().close("div");
            helper(ctx.out(), &messages.confirm_remove);
            ctx.out().close("div");
        }

        ctx.out()
            .close("div")
            .element(
                "div",
                &[("class", "fers-repeater-alert fers-repeater-max")],
                &messages.max_reached,
            )
            .element(
                "div",
                &[("class", "fers-repeater-alert fers-repeater-min")],
                &messages.min_reached,
            )
            .open(
                "a",
                &[
                    ("href", "#"),
                    ("class", "button button-primary fers-repeater-add"),
                ],
            )
            .raw(&opts.button_title)
            .close("a");

        debug!(path = %path, rows = rows.len(), "repeater rendered");
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
        // Rendered as the conflict notice, so nothing of it was submitted.
        if path.ancestry_has_key(&def.id) {
            debug!(path = %path, id = %def.id, "skipping conflicting repeater");
            return Ok(None);
        }

        let mut indexed: Vec<(usize, &Submitted)> = submitted
            .map(|node| {
                node.children()
                    .iter()
                    .filter_map(|(key, row)| match row_index(key) {
                        Some(index) => Some((index, row)),
                        None => {
                            warn!(path = %path, %key, "ignoring non-canonical repeater row key");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        indexed.sort_by_key(|(index, _)| *index);

        let mut rows = Vec::with_capacity(indexed.len());
        for (index, node) in indexed {
            let row_path = path.index(index);
            let mut row = Row::new();
            for child in &opts.fields {
                if let Some(value) = ctx.save_field(child, node.get(&child.id), &row_path) {
                    row.insert(child.id.clone(), value);
                }
            }
            rows.push(row);
        }

        let count = rows.len();
        if ctx.config().enforce_repeater_bounds && !opts.within_bounds(count) {
            let bound = if count < opts.min {
                Bound::Min(opts.min)
            } else {
                Bound::Max(opts.max)
            };
            return Err(FieldsError::BoundsViolation {
                field: def.id.clone(),
                count,
                bound,
            });
        }

        debug!(path = %path, rows = count, "repeater saved");
        Ok(Some(FieldValue::Rows(rows)))
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Sortable]
    }
}
