//! Log formatting helpers.

use std::fmt;

use serde::Serialize;

/// Shows a value as YAML inside a log line.
///
/// ```ignore
/// debug!("saved values: {}", Pretty(&outcome.values));
/// ```
///
/// The YAML starts on a new line. Values that fail to serialize fall back to
/// `{:#?}`.
pub struct Pretty<T>(pub T);

impl<T: Serialize + fmt::Debug> Pretty<T> {
    fn write(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{yaml}"),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + fmt::Debug> fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

impl<T: Serialize + fmt::Debug> fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, SorterState};

    #[test]
    fn renders_yaml_on_new_line() {
        let state = SorterState {
            enabled: [("y".to_string(), "Y".to_string())].into_iter().collect(),
            disabled: Default::default(),
        };
        let shown = Pretty(&FieldValue::Sorter(state)).to_string();
        assert!(shown.starts_with('\n'));
        assert!(shown.contains("enabled:"));
        assert!(shown.contains("y: Y"));
    }

    #[test]
    fn debug_matches_display() {
        let value = FieldValue::from("hello");
        assert_eq!(format!("{:?}", Pretty(&value)), format!("{}", Pretty(&value)));
    }
}
