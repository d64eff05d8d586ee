//! Minimal HTML writer used by field renderers.
//!
//! Attribute values and text are escaped on the way in; only `raw` writes
//! trusted markup (icon snippets, button titles) verbatim.

use crate::types::FieldDefinition;

/// Append-only HTML buffer.
#[derive(Debug, Default, Clone)]
pub struct Markup {
    buf: String,
}

impl Markup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write trusted markup as-is.
    pub fn raw(&mut self, html: &str) -> &mut Self {
        self.buf.push_str(html);
        self
    }

    /// Write escaped text content.
    pub fn text(&mut self, text: &str) -> &mut Self {
        html_escape::encode_text_to_string(text, &mut self.buf);
        self
    }

    /// Write an opening tag.
    pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start_tag(tag, attrs);
        self.buf.push('>');
        self
    }

    /// Write a self-closing element such as `<input ... />`.
    pub fn void(&mut self, tag: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start_tag(tag, attrs);
        self.buf.push_str(" />");
        self
    }

    pub fn close(&mut self, tag: &str) -> &mut Self {
        self.buf.push_str("</");
        self.buf.push_str(tag);
        self.buf.push('>');
        self
    }

    /// `<tag attrs>text</tag>` in one call.
    pub fn element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> &mut Self {
        self.open(tag, attrs).text(text).close(tag)
    }

    /// Opening wrapper of a field: container plus optional title.
    pub fn field_before(&mut self, def: &FieldDefinition) -> &mut Self {
        let class = format!("fers-field fers-field-{}", def.kind.tag());
        self.open("div", &[("class", class.as_str())]);
        if let Some(title) = def.title.as_deref().filter(|t| !t.is_empty()) {
            self.open("div", &[("class", "fers-title")])
                .element("h4", &[], title)
                .close("div");
        }
        self.open("div", &[("class", "fers-fieldset")])
    }

    /// Closing wrapper of a field: optional description.
    pub fn field_after(&mut self, def: &FieldDefinition) -> &mut Self {
        self.close("div");
        if let Some(desc) = def.desc.as_deref().filter(|d| !d.is_empty()) {
            self.element("div", &[("class", "fers-desc-text")], desc);
        }
        self.close("div")
    }

    /// Current length, usable as a rollback mark.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop everything written after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.buf.truncate(mark);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    fn start_tag(&mut self, tag: &str, attrs: &[(&str, &str)]) {
        self.buf.push('<');
        self.buf.push_str(tag);
        for (name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(name);
            self.buf.push_str("=\"");
            html_escape::encode_double_quoted_attribute_to_string(value, &mut self.buf);
            self.buf.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_attributes_and_text() {
        let mut m = Markup::new();
        m.open("li", &[]).void(
            "input",
            &[("type", "hidden"), ("name", "s[enabled][k]"), ("value", "a \"b\" <c>")],
        );
        m.element("label", &[], "<b>&</b>").close("li");
        assert_eq!(
            m.as_str(),
            "<li><input type=\"hidden\" name=\"s[enabled][k]\" value=\"a &quot;b&quot; &lt;c&gt;\" />\
             <label>&lt;b&gt;&amp;&lt;/b&gt;</label></li>"
        );
    }

    #[test]
    fn truncate_rolls_back() {
        let mut m = Markup::new();
        m.raw("<div>");
        let mark = m.len();
        m.raw("partial");
        m.truncate(mark);
        assert_eq!(m.into_string(), "<div>");
    }

    #[test]
    fn field_wrapper_includes_title_and_desc() {
        let mut def = FieldDefinition::text("url").with_title("URL");
        def.desc = Some("Where it points".into());
        let mut m = Markup::new();
        m.field_before(&def).raw("X").field_after(&def);
        let html = m.into_string();
        assert!(html.starts_with("<div class=\"fers-field fers-field-text\">"));
        assert!(html.contains("<h4>URL</h4>"));
        assert!(html.contains("X</div><div class=\"fers-desc-text\">Where it points</div></div>"));
    }
}
