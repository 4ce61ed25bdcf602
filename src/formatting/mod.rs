//! Outlines of extracted structure, as fragments tagged by syntax

mod outline;
mod syntax;

pub use outline::{collapse, outline};
pub use syntax::{Identity, Render, Syntax};
