//! Drag, add, clone and remove gestures as explicit state machines.
//!
//! The browser performs these gestures on rendered markup; these types apply
//! the same rules to a value so that the outcome can be checked (or driven)
//! without a page. Each machine owns its value and is driven through `&mut`.

use std::fmt;

use tracing::debug;

use crate::error::{Bound, FieldsError, Result};
use crate::types::{FieldDefinition, FieldKind, FieldValue, RepeaterOptions, Row, SorterState};

fn transition_error(state: impl fmt::Display, action: &str) -> FieldsError {
    FieldsError::InvalidTransition {
        state: state.to_string(),
        action: action.to_string(),
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(FieldsError::RowOutOfRange { index, len });
    }
    Ok(())
}

/// Where a repeater interaction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeaterPhase {
    Idle,
    Dragging { from: usize },
    ConfirmingRemoval { index: usize },
}

impl fmt::Display for RepeaterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeaterPhase::Idle => write!(f, "idle"),
            RepeaterPhase::Dragging { from } => write!(f, "dragging row {from}"),
            RepeaterPhase::ConfirmingRemoval { index } => {
                write!(f, "confirming removal of row {index}")
            }
        }
    }
}

/// Row list of one repeater under user interaction.
///
/// Add and clone stop at `max` (when non-zero), remove stops at `min`; a
/// refused gesture leaves the rows untouched. Rows have no identity beyond
/// their position, so every change renumbers them from 0.
#[derive(Debug, Clone)]
pub struct RepeaterInteraction {
    field: String,
    options: RepeaterOptions,
    rows: Vec<Row>,
    phase: RepeaterPhase,
}

impl RepeaterInteraction {
    /// Start from the stored value of a repeater definition.
    pub fn new(def: &FieldDefinition, value: Option<&FieldValue>) -> Result<Self> {
        let FieldKind::Repeater(options) = &def.kind else {
            return Err(FieldsError::UnknownKind {
                kind: def.kind.tag().to_string(),
            });
        };
        let rows = value
            .and_then(FieldValue::as_rows)
            .map(<[Row]>::to_vec)
            .unwrap_or_default();
        Ok(Self {
            field: def.id.clone(),
            options: options.clone(),
            rows,
            phase: RepeaterPhase::Idle,
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn phase(&self) -> RepeaterPhase {
        self.phase
    }

    pub fn into_value(self) -> FieldValue {
        FieldValue::Rows(self.rows)
    }

    pub fn grab(&mut self, index: usize) -> Result<()> {
        self.require_idle("grab a row")?;
        check_index(index, self.rows.len())?;
        self.phase = RepeaterPhase::Dragging { from: index };
        Ok(())
    }

    /// Drop the grabbed row so that it ends up at position `to`.
    pub fn drop_at(&mut self, to: usize) -> Result<()> {
        let RepeaterPhase::Dragging { from } = self.phase else {
            return Err(transition_error(self.phase, "drop a row"));
        };
        check_index(to, self.rows.len())?;
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        self.phase = RepeaterPhase::Idle;
        debug!(field = %self.field, from, to, "repeater row moved");
        Ok(())
    }

    pub fn cancel_drag(&mut self) -> Result<()> {
        match self.phase {
            RepeaterPhase::Dragging { .. } => {
                self.phase = RepeaterPhase::Idle;
                Ok(())
            }
            phase => Err(transition_error(phase, "cancel a drag")),
        }
    }

    /// Ask to remove row `index`; nothing is removed until confirmed.
    pub fn request_remove(&mut self, index: usize) -> Result<()> {
        self.require_idle("remove a row")?;
        check_index(index, self.rows.len())?;
        if !self.options.allows_remove(self.rows.len()) {
            return Err(self.bounds(Bound::Min(self.options.min)));
        }
        self.phase = RepeaterPhase::ConfirmingRemoval { index };
        Ok(())
    }

    /// Remove the row awaiting confirmation and return it.
    pub fn confirm_remove(&mut self) -> Result<Row> {
        let RepeaterPhase::ConfirmingRemoval { index } = self.phase else {
            return Err(transition_error(self.phase, "confirm removal"));
        };
        let row = self.rows.remove(index);
        self.phase = RepeaterPhase::Idle;
        debug!(field = %self.field, index, rows = self.rows.len(), "repeater row removed");
        Ok(row)
    }

    pub fn cancel_remove(&mut self) -> Result<()> {
        match self.phase {
            RepeaterPhase::ConfirmingRemoval { .. } => {
                self.phase = RepeaterPhase::Idle;
                Ok(())
            }
            phase => Err(transition_error(phase, "cancel removal")),
        }
    }

    /// Append a row of child defaults, returning its index.
    pub fn add(&mut self) -> Result<usize> {
        self.require_idle("add a row")?;
        self.require_room()?;
        self.rows.push(self.options.template_row());
        debug!(field = %self.field, rows = self.rows.len(), "repeater row added");
        Ok(self.rows.len() - 1)
    }

    /// Insert a copy of row `index` right after it, returning the copy's index.
    pub fn clone_row(&mut self, index: usize) -> Result<usize> {
        self.require_idle("clone a row")?;
        check_index(index, self.rows.len())?;
        self.require_room()?;
        let copy = self.rows[index].clone();
        self.rows.insert(index + 1, copy);
        debug!(field = %self.field, index, rows = self.rows.len(), "repeater row cloned");
        Ok(index + 1)
    }

    fn require_idle(&self, action: &str) -> Result<()> {
        match self.phase {
            RepeaterPhase::Idle => Ok(()),
            phase => Err(transition_error(phase, action)),
        }
    }

    fn require_room(&self) -> Result<()> {
        if self.options.allows_add(self.rows.len()) {
            Ok(())
        } else {
            Err(self.bounds(Bound::Max(self.options.max)))
        }
    }

    fn bounds(&self, bound: Bound) -> FieldsError {
        FieldsError::BoundsViolation {
            field: self.field.clone(),
            count: self.rows.len(),
            bound,
        }
    }
}

/// One of the two sorter lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SorterList {
    Enabled,
    Disabled,
}

impl fmt::Display for SorterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SorterList::Enabled => write!(f, "enabled"),
            SorterList::Disabled => write!(f, "disabled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SorterPhase {
    Idle,
    Dragging { list: SorterList, index: usize },
}

impl fmt::Display for SorterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SorterPhase::Idle => write!(f, "idle"),
            SorterPhase::Dragging { list, index } => write!(f, "dragging {list} item {index}"),
        }
    }
}

/// Enabled/disabled lists of one sorter under user interaction.
///
/// A drop is a single move: it reorders within a list or carries the item
/// across, never both duplicating and moving.
#[derive(Debug, Clone)]
pub struct SorterInteraction {
    field: String,
    show_disabled: bool,
    state: SorterState,
    phase: SorterPhase,
}

impl SorterInteraction {
    /// Start from the stored value of a sorter definition, or its default.
    pub fn new(def: &FieldDefinition, value: Option<&FieldValue>) -> Result<Self> {
        let FieldKind::Sorter(options) = &def.kind else {
            return Err(FieldsError::UnknownKind {
                kind: def.kind.tag().to_string(),
            });
        };
        let state = match value {
            Some(FieldValue::Sorter(state)) if !state.is_empty() => state.clone(),
            _ => def
                .initial_value()
                .and_then(|v| v.as_sorter().cloned())
                .unwrap_or_else(|| SorterState::all_disabled(&options.options)),
        };
        Ok(Self {
            field: def.id.clone(),
            show_disabled: options.show_disabled,
            state,
            phase: SorterPhase::Idle,
        })
    }

    pub fn state(&self) -> &SorterState {
        &self.state
    }

    pub fn phase(&self) -> SorterPhase {
        self.phase
    }

    pub fn into_value(self) -> FieldValue {
        FieldValue::Sorter(self.state)
    }

    pub fn grab(&mut self, list: SorterList, index: usize) -> Result<()> {
        if self.phase != SorterPhase::Idle {
            return Err(transition_error(self.phase, "grab an item"));
        }
        self.require_visible(list, "grab an item")?;
        check_index(index, self.list(list).len())?;
        self.phase = SorterPhase::Dragging { list, index };
        Ok(())
    }

    /// Drop the grabbed item at position `index` of `list`.
    ///
    /// A refused drop keeps the drag in progress.
    pub fn drop_at(&mut self, list: SorterList, index: usize) -> Result<()> {
        let SorterPhase::Dragging { list: from_list, index: from } = self.phase else {
            return Err(transition_error(self.phase, "drop an item"));
        };
        self.require_visible(list, "drop an item")?;

        let target_len = if list == from_list {
            self.list(list).len() - 1
        } else {
            self.list(list).len()
        };
        if index > target_len {
            return Err(FieldsError::RowOutOfRange {
                index,
                len: target_len + 1,
            });
        }

        let Some((key, label)) = self.list_mut(from_list).shift_remove_index(from) else {
            return Err(FieldsError::RowOutOfRange {
                index: from,
                len: self.list(from_list).len(),
            });
        };
        debug!(
            field = %self.field,
            %key,
            from = %from_list,
            to = %list,
            index,
            "sorter item moved"
        );
        self.list_mut(list).shift_insert(index, key, label);
        self.phase = SorterPhase::Idle;
        Ok(())
    }

    pub fn cancel_drag(&mut self) -> Result<()> {
        match self.phase {
            SorterPhase::Dragging { .. } => {
                self.phase = SorterPhase::Idle;
                Ok(())
            }
            SorterPhase::Idle => Err(transition_error(self.phase, "cancel a drag")),
        }
    }

    fn require_visible(&self, list: SorterList, action: &str) -> Result<()> {
        if list == SorterList::Disabled && !self.show_disabled {
            return Err(transition_error(
                format!("{} with the disabled list hidden", self.phase),
                action,
            ));
        }
        Ok(())
    }

    fn list(&self, list: SorterList) -> &indexmap::IndexMap<String, String> {
        match list {
            SorterList::Enabled => &self.state.enabled,
            SorterList::Disabled => &self.state.disabled,
        }
    }

    fn list_mut(&mut self, list: SorterList) -> &mut indexmap::IndexMap<String, String> {
        match list {
            SorterList::Enabled => &mut self.state.enabled,
            SorterList::Disabled => &mut self.state.disabled,
        }
    }
}
