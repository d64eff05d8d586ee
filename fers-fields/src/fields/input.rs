//! Leaf kinds: text, textarea, select, checkbox, radio.

use crate::error::{FieldsError, Result};
use crate::namespace::NamespacePath;
use crate::registry::{Field, RenderContext, SaveContext};
use crate::submission::Submitted;
use crate::types::{FieldDefinition, FieldKind, FieldValue};

/// Handler for every single-value kind.
///
/// Values are plain strings. A checkbox submits `1` when checked and nothing
/// otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputField;

impl InputField {
    pub const TAGS: [&'static str; 5] = ["text", "textarea", "select", "checkbox", "radio"];
    const CHECKED: &'static str = "1";
}

impl Field for InputField {
    fn render(
        &self,
        def: &FieldDefinition,
        value: Option<&FieldValue>,
        path: &NamespacePath,
        ctx: &mut RenderContext<'_>,
    ) -> Result<()> {
        let name = path.to_string();
        let current = value.and_then(FieldValue::as_text).unwrap_or("");
        let out = ctx.out();

        match &def.kind {
            FieldKind::Text => {
                out.void(
                    "input",
                    &[("type", "text"), ("name", name.as_str()), ("value", current)],
                );
            }
            FieldKind::Textarea => {
                out.element("textarea", &[("name", name.as_str())], current);
            }
            FieldKind::Select { options } => {
                out.open("select", &[("name", name.as_str())]);
                for (key, label) in options {
                    if key == current {
                        out.element(
                            "option",
                            &[("value", key.as_str()), ("selected", "selected")],
                            label,
                        );
                    } else {
                        out.element("option", &[("value", key.as_str())], label);
                    }
                }
                out.close("select");
            }
            FieldKind::Checkbox { label } => {
                let mut attrs = vec![
                    ("type", "checkbox"),
                    ("name", name.as_str()),
                    ("value", Self::CHECKED),
                ];
                if current == Self::CHECKED {
                    attrs.push(("checked", "checked"));
                }
                out.open("label", &[]).void("input", &attrs);
                if let Some(label) = label {
                    out.text(" ").text(label);
                }
                out.close("label");
            }
            FieldKind::Radio { options } => {
                for (key, label) in options {
                    let mut attrs = vec![
                        ("type", "radio"),
                        ("name", name.as_str()),
                        ("value", key.as_str()),
                    ];
                    if key == current {
                        attrs.push(("checked", "checked"));
                    }
                    out.open("label", &[])
                        .void("input", &attrs)
                        .text(" ")
                        .text(label)
                        .close("label");
                }
            }
            other => {
                return Err(FieldsError::UnknownKind {
                    kind: other.tag().to_string(),
                })
            }
        }
        Ok(())
    }

    fn save(
        &self,
        def: &FieldDefinition,
        submitted: Option<&Submitted>,
        _path: &NamespacePath,
        ctx: &mut SaveContext<'_>,
    ) -> Result<Option<FieldValue>> {
        let value = submitted.and_then(Submitted::value);
        if def.required && value.is_none_or(|v| v.trim().is_empty()) {
            let message = def
                .error_text
                .clone()
                .unwrap_or_else(|| ctx.config().messages.required.clone());
            return Err(FieldsError::RequiredFieldMissing {
                field: def.id.clone(),
                message,
            });
        }
        Ok(value.map(|v| FieldValue::Text(v.to_string())))
    }
}
