// Patterns are literals checked in by us; a failure to compile one is a bug.

#[macro_use]
mod cache;
