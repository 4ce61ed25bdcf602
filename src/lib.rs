#[macro_use]
mod regex;

pub mod config;
pub mod formatting;
pub mod language;
pub mod parsing;
pub mod rendering;
