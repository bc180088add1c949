//! Terminal output for runway.

pub mod output;
pub mod style;
