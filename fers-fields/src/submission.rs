//! Decoding of bracketed form submissions into an ordered tree.
//!
//! `links[0][url]=a.com&links[1][url]=b.com` becomes a tree rooted at
//! `links` with children `0` and `1`. Children keep the order in which their
//! names first appeared; that order is what sorter lists are rebuilt from.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{FieldsError, Result};
use crate::namespace::{parse_name, NamespacePath};

/// One node of a submitted payload.
///
/// A node holds either a scalar value or children. When a payload sends both
/// shapes under one name, the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submitted {
    value: Option<String>,
    children: IndexMap<String, Submitted>,
}

impl Submitted {
    /// A scalar node.
    pub fn leaf(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            children: IndexMap::new(),
        }
    }

    /// The scalar value, if this node is a leaf.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Child nodes in submission order.
    pub fn children(&self) -> &IndexMap<String, Submitted> {
        &self.children
    }

    pub fn get(&self, key: &str) -> Option<&Submitted> {
        self.children.get(key)
    }

    fn set_value(&mut self, value: String) {
        self.children.clear();
        self.value = Some(value);
    }

    fn branch_mut(&mut self) -> &mut IndexMap<String, Submitted> {
        self.value = None;
        &mut self.children
    }
}

/// A decoded submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    root: Submitted,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Pairs whose names are not well-formed bracket paths are skipped with a
    /// warning; they cannot belong to any field.
    pub fn parse(body: &str) -> Self {
        let mut submission = Self::new();
        let mut pairs = 0usize;
        for (name, value) in url::form_urlencoded::parse(body.as_bytes()) {
            if let Err(e) = submission.insert(&name, value.into_owned()) {
                warn!(%name, %e, "skipping submitted pair");
                continue;
            }
            pairs += 1;
        }
        debug!(pairs, fields = submission.root.children.len(), "submission decoded");
        submission
    }

    /// Build from already-decoded `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Self::new();
        for (name, value) in pairs {
            submission.insert(name.as_ref(), value)?;
        }
        Ok(submission)
    }

    /// Insert one pair. A repeated name overwrites the value in place; an
    /// empty bracket pair appends at the next numeric index.
    ///
    /// Appending after an index of `usize::MAX` is a `MalformedName`.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let segments = parse_name(name)?;
        let mut node = &mut self.root;
        for segment in segments {
            let branch = node.branch_mut();
            let key = if segment.is_empty() {
                next_index(branch)
                    .ok_or_else(|| FieldsError::MalformedName {
                        name: name.to_string(),
                    })?
                    .to_string()
            } else {
                segment
            };
            node = branch.entry(key).or_default();
        }
        node.set_value(value.into());
        Ok(())
    }

    /// The node at `path`. Template paths and the root never resolve.
    pub fn get(&self, path: &NamespacePath) -> Option<&Submitted> {
        if path.is_template() || path.is_root() {
            return None;
        }
        path.raw_segments()
            .iter()
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// Top-level names in submission order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.root.children.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

fn next_index(branch: &IndexMap<String, Submitted>) -> Option<usize> {
    match branch.keys().filter_map(|k| k.parse::<usize>().ok()).max() {
        Some(max) => max.checked_add(1),
        None => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(node: &Submitted) -> Vec<&str> {
        node.children().keys().map(String::as_str).collect()
    }

    #[test]
    fn sorter_lists_keep_submission_order() {
        let s = Submission::parse(
            "modules[enabled][k2]=Label2&modules[enabled][k1]=Label1&modules[disabled][k3]=Label3",
        );
        let modules = s.get(&NamespacePath::root().key("modules")).unwrap();
        assert_eq!(keys(modules.get("enabled").unwrap()), vec!["k2", "k1"]);
        assert_eq!(
            modules.get("disabled").unwrap().get("k3").unwrap().value(),
            Some("Label3")
        );
    }

    #[test]
    fn repeater_rows_nest_by_index() {
        let s = Submission::parse("links[0][url]=a.com&links[1][url]=b.com&links[0][label]=A");
        let row0 = s
            .get(&NamespacePath::root().key("links").index(0))
            .unwrap();
        assert_eq!(keys(row0), vec!["url", "label"]);
        let url = s.get(&NamespacePath::root().key("links").index(1).key("url"));
        assert_eq!(url.and_then(Submitted::value), Some("b.com"));
    }

    #[test]
    fn decodes_percent_and_plus() {
        let s = Submission::parse("title=Hello+World&opts[note]=a%26b%5Bc%5D");
        assert_eq!(
            s.get(&NamespacePath::root().key("title"))
                .and_then(Submitted::value),
            Some("Hello World")
        );
        assert_eq!(
            s.get(&NamespacePath::new("opts").key("note"))
                .and_then(Submitted::value),
            Some("a&b[c]")
        );
    }

    #[test]
    fn repeated_name_overwrites_in_place() {
        let s = Submission::parse("a=1&b=2&a=3");
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(
            s.get(&NamespacePath::root().key("a")).and_then(Submitted::value),
            Some("3")
        );
    }

    #[test]
    fn later_shape_wins() {
        let s = Submission::parse("a=1&a[b]=2");
        let a = s.get(&NamespacePath::root().key("a")).unwrap();
        assert_eq!(a.value(), None);
        assert_eq!(a.get("b").and_then(Submitted::value), Some("2"));
    }

    #[test]
    fn empty_brackets_append() {
        let s = Submission::parse("tags[]=x&tags[]=y&tags[5]=z&tags[]=w");
        let tags = s.get(&NamespacePath::root().key("tags")).unwrap();
        assert_eq!(keys(tags), vec!["0", "1", "5", "6"]);
    }

    #[test]
    fn append_after_largest_index_is_rejected() {
        let body = "tags[18446744073709551615]=a&tags[]=b";
        let s = Submission::parse(body);
        let tags = s.get(&NamespacePath::root().key("tags")).unwrap();
        assert_eq!(keys(tags), vec!["18446744073709551615"]);
        assert_eq!(tags.get("18446744073709551615").and_then(Submitted::value), Some("a"));

        let err = Submission::from_pairs([("tags[18446744073709551615]", "a"), ("tags[]", "b")])
            .unwrap_err();
        assert!(matches!(err, FieldsError::MalformedName { name } if name == "tags[]"));
    }

    #[test]
    fn template_names_never_resolve() {
        let s = Submission::parse("___links[0][url]=x");
        let template = NamespacePath::root().key("links").template().index(0);
        assert!(s.get(&template).is_none());
        assert!(s.get(&NamespacePath::root().key("links")).is_none());
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["___links"]);
    }

    #[test]
    fn malformed_pairs_are_skipped() {
        let s = Submission::parse("ok=1&bad[x=2&[y]=3");
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn from_pairs_rejects_malformed() {
        assert!(Submission::from_pairs([("a[b", "1")]).is_err());
        let s = Submission::from_pairs([("a[b]", "1")]).unwrap();
        assert!(!s.is_empty());
    }
}
