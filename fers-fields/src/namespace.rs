//! Namespace paths: the bracketed submission names fields render and read back.
//!
//! A path is an ordered list of segments. The first segment is written bare,
//! every later one in brackets, so ancestry `group`, `items`, row `2` and leaf
//! `title` becomes `group[items][2][title]`. The same string is used as the
//! HTML `name` attribute and as the lookup key into a parsed [`Submission`].
//!
//! [`Submission`]: crate::submission::Submission

use std::fmt;

use crate::error::{FieldsError, Result};

/// Prefix marking names that belong to a repeater's hidden clone template.
///
/// Template inputs are never read back on save; the client strips the prefix
/// when it clones the template into a real row.
pub const TEMPLATE_PREFIX: &str = "___";

const RESERVED_CHARS: &[char] = &['[', ']', '&', '=', '#'];

/// One segment of a namespace path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A field identifier or sorter list/key name.
    Key(String),
    /// A repeater row index.
    Index(usize),
}

impl Segment {
    /// Returns true if this segment is the key `id`.
    pub fn is_key(&self, id: &str) -> bool {
        matches!(self, Segment::Key(k) if k == id)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Position of a field inside a (possibly nested) form.
///
/// Building a path never mutates the parent; `key`, `index` and `template`
/// return extended copies, so one parent can be shared by all its children.
///
/// Template marks stack: a template nested inside another template carries
/// the prefix twice, so the client strips exactly one level per clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NamespacePath {
    segments: Vec<Segment>,
    /// First segment is a storage base, not a field.
    based: bool,
    template: usize,
}

impl NamespacePath {
    /// The empty path. Top-level fields under it are named by their bare id.
    pub fn root() -> Self {
        Self::default()
    }

    /// A path starting at a base name, e.g. an options page's storage key.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(base.into())],
            based: true,
            template: 0,
        }
    }

    /// Extend with a key segment.
    pub fn key(&self, id: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Key(id.into()));
        next
    }

    /// Extend with a row index segment.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(Segment::Index(index));
        next
    }

    /// Mark this path (and everything built from it) as template-only.
    pub fn template(&self) -> Self {
        let mut next = self.clone();
        next.template += 1;
        next
    }

    pub fn is_template(&self) -> bool {
        self.template > 0
    }

    /// How many enclosing templates this path sits in.
    pub fn template_depth(&self) -> usize {
        self.template
    }

    /// Whether the first segment is a storage base given to [`NamespacePath::new`].
    pub fn has_base(&self) -> bool {
        self.based
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether any key segment of this path equals `id`.
    pub fn has_key(&self, id: &str) -> bool {
        self.segments.iter().any(|s| s.is_key(id))
    }

    /// Whether a segment before the last one is the key `id`.
    ///
    /// For a field's own path this asks whether an enclosing field already
    /// uses `id`. The storage base is not a field and never matches.
    pub fn ancestry_has_key(&self, id: &str) -> bool {
        let fields = if self.based {
            self.segments.get(1..).unwrap_or_default()
        } else {
            &self.segments[..]
        };
        match fields.split_last() {
            Some((_, ancestry)) => ancestry.iter().any(|s| s.is_key(id)),
            None => false,
        }
    }

    /// Segments as the raw strings a parsed submission is keyed by.
    pub fn raw_segments(&self) -> Vec<String> {
        self.segments.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for NamespacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.template {
            f.write_str(TEMPLATE_PREFIX)?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i == 0 {
                write!(f, "{segment}")?;
            } else {
                write!(f, "[{segment}]")?;
            }
        }
        Ok(())
    }
}

/// Split a submitted name such as `links[0][url]` into its segments.
///
/// An empty bracket pair (`tags[]`) yields an empty segment, which the
/// submission parser treats as "append".
pub fn parse_name(name: &str) -> Result<Vec<String>> {
    let malformed = || FieldsError::MalformedName {
        name: name.to_string(),
    };

    let (base, mut rest) = match name.find('[') {
        Some(pos) => (&name[..pos], &name[pos..]),
        None => (name, ""),
    };
    if base.is_empty() || base.contains(']') {
        return Err(malformed());
    }

    let mut segments = vec![base.to_string()];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        let segment = &inner[..close];
        if segment.contains('[') {
            return Err(malformed());
        }
        segments.push(segment.to_string());
        rest = &inner[close + 1..];
    }
    Ok(segments)
}

/// Check that `id` can be used as a field identifier.
///
/// Identifiers must be non-empty, free of bracket and form-encoding
/// delimiters and whitespace, not purely numeric (that would read back as a
/// row index) and must not start with [`TEMPLATE_PREFIX`].
pub fn validate_identifier(id: &str) -> Result<()> {
    validate_segment(id)?;
    if id.starts_with(TEMPLATE_PREFIX) {
        return Err(invalid(id, format!("must not start with '{TEMPLATE_PREFIX}'")));
    }
    if id.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(id, "must not be numeric".to_string()));
    }
    Ok(())
}

/// Looser check for keys that only ever appear below a fixed segment, like
/// sorter item keys under `[enabled]`.
pub fn validate_segment(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(invalid(id, "must not be empty".to_string()));
    }
    if let Some(c) = id
        .chars()
        .find(|c| RESERVED_CHARS.contains(c) || c.is_whitespace())
    {
        return Err(invalid(id, format!("contains reserved character {c:?}")));
    }
    Ok(())
}

fn invalid(id: &str, reason: String) -> FieldsError {
    FieldsError::InvalidIdentifier {
        id: id.to_string(),
        reason,
    }
}
