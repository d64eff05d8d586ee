//! Repeater and sorter fields for the FERS options framework
//!
//! `fers-fields` renders option-page fields to HTML and rebuilds their values
//! from the url-encoded form submission the browser sends back.
//!
//! # Architecture
//!
//! - **Namespace paths**: every control's wire name is built by
//!   [`NamespacePath`]; parsing a submission walks the same segments back
//! - **Registry dispatch**: each field kind has one [`Field`] handler; a
//!   repeater renders and saves its children through the same dispatcher,
//!   so repeaters nest
//! - **Fault isolation**: a failing field becomes a notice panel (render) or
//!   a recorded [`FieldError`] (save); siblings carry on
//! - **Whole-value storage**: [`ValueStore`] replaces each top-level value on
//!   write, in memory or as one YAML file per value

pub mod config;
pub mod error;
pub mod fields;
pub mod form;
pub mod interaction;
pub mod logging;
pub mod markup;
pub mod namespace;
pub mod registry;
pub mod store;
pub mod submission;
pub mod types;

pub use config::{Messages, RenderConfig};
pub use error::{Bound, FieldError, FieldsError, Result};
pub use fields::{InputField, RepeaterField, SorterField};
pub use form::{Form, RenderedForm, SaveOutcome, Values};
pub use interaction::{
    RepeaterInteraction, RepeaterPhase, SorterInteraction, SorterList, SorterPhase,
};
pub use logging::Pretty;
pub use markup::Markup;
pub use namespace::{parse_name, validate_identifier, NamespacePath, Segment, TEMPLATE_PREFIX};
pub use registry::{
    AssetLoader, AssetManifest, Capability, Field, FieldRegistry, RenderContext, SaveContext,
};
pub use store::{MemoryStore, ValueStore, YamlFileStore};
pub use submission::{Submission, Submitted};
pub use types::{
    Choices, FieldDefinition, FieldKind, FieldValue, RepeaterOptions, Row, SorterOptions,
    SorterState,
};
