//! Field definitions and field values.
//!
//! Definitions are static schema, loaded once per request (usually from
//! YAML) and never mutated. Values are rebuilt per render from the store and
//! per save from the submission.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered `key -> label` choices (select/radio options, sorter universe).
pub type Choices = IndexMap<String, String>;

/// One repeater row: child field id to that child's value, in child order.
pub type Row = IndexMap<String, FieldValue>;

/// Enabled/disabled partition held by a sorter field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SorterState {
    #[serde(default)]
    pub enabled: IndexMap<String, String>,
    #[serde(default)]
    pub disabled: IndexMap<String, String>,
}

impl SorterState {
    /// Every item of the universe in the disabled list, universe order.
    pub fn all_disabled(universe: &Choices) -> Self {
        Self {
            enabled: IndexMap::new(),
            disabled: universe.clone(),
        }
    }

    /// Keys of both lists, enabled first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.enabled.keys().chain(self.disabled.keys()).map(String::as_str)
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.enabled.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.enabled.len() + self.disabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The value held by one field.
///
/// Serialized untagged: a string, a sequence of rows, or an
/// `{enabled, disabled}` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Rows(Vec<Row>),
    Sorter(SorterState),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            FieldValue::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_sorter(&self) -> Option<&SorterState> {
        match self {
            FieldValue::Sorter(state) => Some(state),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<Row>> for FieldValue {
    fn from(rows: Vec<Row>) -> Self {
        FieldValue::Rows(rows)
    }
}

impl From<SorterState> for FieldValue {
    fn from(state: SorterState) -> Self {
        FieldValue::Sorter(state)
    }
}

fn default_button_title() -> String {
    r#"<i class="fas fa-plus-circle"></i>"#.to_string()
}

fn default_enabled_title() -> String {
    "Enabled".to_string()
}

fn default_disabled_title() -> String {
    "Disabled".to_string()
}

fn default_true() -> bool {
    true
}

/// Options of a repeater field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepeaterOptions {
    /// Child definitions making up one row.
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    /// Fewest rows the user may leave.
    #[serde(default)]
    pub min: usize,
    /// Most rows the user may add; 0 means unbounded.
    #[serde(default)]
    pub max: usize,
    /// Add button content. Trusted markup, written unescaped.
    #[serde(default = "default_button_title")]
    pub button_title: String,
}

impl RepeaterOptions {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self {
            fields,
            min: 0,
            max: 0,
            button_title: default_button_title(),
        }
    }

    pub fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    /// Whether another row may be added to `count` existing ones.
    pub fn allows_add(&self, count: usize) -> bool {
        self.max == 0 || count < self.max
    }

    /// Whether a row may be removed from `count` existing ones.
    pub fn allows_remove(&self, count: usize) -> bool {
        count > self.min
    }

    /// Whether `count` rows lie inside `[min, max]`.
    pub fn within_bounds(&self, count: usize) -> bool {
        count >= self.min && (self.max == 0 || count <= self.max)
    }

    /// The row a freshly added group starts with: each child's default.
    pub fn template_row(&self) -> Row {
        self.fields
            .iter()
            .filter_map(|f| f.initial_value().map(|v| (f.id.clone(), v)))
            .collect()
    }
}

/// Options of a sorter field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SorterOptions {
    /// The fixed universe of items, in canonical order.
    #[serde(default)]
    pub options: Choices,
    /// Whether the disabled column is shown at all.
    #[serde(default = "default_true", rename = "disabled")]
    pub show_disabled: bool,
    #[serde(default = "default_enabled_title")]
    pub enabled_title: String,
    #[serde(default = "default_disabled_title")]
    pub disabled_title: String,
}

impl SorterOptions {
    pub fn new(options: Choices) -> Self {
        Self {
            options,
            show_disabled: true,
            enabled_title: default_enabled_title(),
            disabled_title: default_disabled_title(),
        }
    }

    /// Hide the disabled column; disabled items stay disabled.
    pub fn hide_disabled(mut self) -> Self {
        self.show_disabled = false;
        self
    }
}

/// The kind of a field and its kind-specific options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Select {
        #[serde(default)]
        options: Choices,
    },
    Checkbox {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Radio {
        #[serde(default)]
        options: Choices,
    },
    Repeater(RepeaterOptions),
    Sorter(SorterOptions),
}

impl FieldKind {
    /// Registry tag of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::Checkbox { .. } => "checkbox",
            FieldKind::Radio { .. } => "radio",
            FieldKind::Repeater(_) => "repeater",
            FieldKind::Sorter(_) => "sorter",
        }
    }
}

/// A field definition: identity, kind and presentation of one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}

impl FieldDefinition {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            title: None,
            desc: None,
            kind,
            default: None,
            required: false,
            error_text: None,
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, FieldKind::Text)
    }

    pub fn repeater(id: impl Into<String>, options: RepeaterOptions) -> Self {
        Self::new(id, FieldKind::Repeater(options))
    }

    pub fn sorter(id: impl Into<String>, options: SorterOptions) -> Self {
        Self::new(id, FieldKind::Sorter(options))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Child definitions; empty for everything but repeaters.
    pub fn children(&self) -> &[FieldDefinition] {
        match &self.kind {
            FieldKind::Repeater(opts) => &opts.fields,
            _ => &[],
        }
    }

    /// Value to show when nothing is stored.
    ///
    /// Sorters fall back to the whole universe disabled when their default
    /// is not itself a sorter state.
    pub fn initial_value(&self) -> Option<FieldValue> {
        match (&self.kind, &self.default) {
            (FieldKind::Sorter(_), Some(FieldValue::Sorter(state))) => {
                Some(FieldValue::Sorter(state.clone()))
            }
            (FieldKind::Sorter(opts), _) => {
                Some(FieldValue::Sorter(SorterState::all_disabled(&opts.options)))
            }
            (_, default) => default.clone(),
        }
    }
}
