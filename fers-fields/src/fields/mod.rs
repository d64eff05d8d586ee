//! Built-in field kinds.

mod input;
mod repeater;
mod sorter;

pub use input::InputField;
pub use repeater::RepeaterField;
pub use sorter::{check_universe, SorterField};
