//! extractor of structure from Nextflow scripts

use std::path::Path;
use tracing::debug;

use crate::config::Settings;
use crate::language::{Document, ExtractionError, LoadingError};

pub mod classify;
pub mod extractor;
pub mod parser;
pub mod scanner;
pub mod scope;
pub mod unit;

pub use classify::{Classifier, Leniency, Verdict, OPERATORS};
pub use extractor::{extract_processes, Extractor};
pub use scope::{Origin, ScopeRegistry};
pub use unit::SourceUnit;

/// Read a file and return an owned String. We pass that ownership back to the
/// main function so that the Document object created by parse() below can
/// have the same lifetime.
pub fn load(filename: &Path) -> Result<String, LoadingError<'_>> {
    match std::fs::read_to_string(filename) {
        Ok(content) => Ok(content),
        Err(error) => {
            debug!(?error);
            match error.kind() {
                std::io::ErrorKind::NotFound => Err(LoadingError {
                    problem: "File not found".to_string(),
                    details: String::new(),
                    filename,
                }),
                _ => Err(LoadingError {
                    problem: "Failed reading".to_string(),
                    details: error
                        .kind()
                        .to_string(),
                    filename,
                }),
            }
        }
    }
}

/// Parse a script into a Document with the default settings.
pub fn parse(content: &str) -> Result<Document<'_>, ExtractionError> {
    parse_with_settings(content, &Settings::default())
}

/// Parse a script into a Document, or return the error that stopped
/// extraction.
pub fn parse_with_settings<'i>(content: &'i str, settings: &Settings) -> Result<Document<'i>, ExtractionError> {
    let result = parser::parse_with_settings(content, settings);

    match result {
        Ok(document) => {
            debug!(
                "Found {} process{}",
                document
                    .processes
                    .len(),
                if document
                    .processes
                    .len()
                    == 1
                {
                    ""
                } else {
                    "es"
                }
            );
            for (label, executors) in document.units() {
                debug!(
                    "{}: {} executor{}",
                    label,
                    executors.len(),
                    if executors.len() == 1 { "" } else { "s" }
                );
            }
            Ok(document)
        }
        Err(error) => {
            debug!("error: {}", error);
            Err(error)
        }
    }
}
