use std::{fmt, path::Path};

use thiserror::Error;

use super::Step;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingError<'i> {
    pub problem: String,
    pub details: String,
    pub filename: &'i Path,
}

impl<'i> fmt::Display for LoadingError<'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.problem, self.details)
    }
}

/// Failures extracting structure from a script. Any of these abandons the
/// file; there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("unbalanced '{delimiter}' in {kind} '{name}' at line {line}")]
    UnbalancedDelimiter {
        delimiter: char,
        kind: &'static str,
        name: String,
        offset: usize,
        line: usize,
    },

    #[error("in the executor '{statement}', '{segment}' is neither a process, subworkflow or an operator (at line {line})")]
    UnmappedPipeSegment {
        statement: String,
        segment: String,
        offset: usize,
        line: usize,
    },

    #[error("unable to extract the operation or call at line {line} near '{context}'; try rewriting it in a simplified version")]
    SpanExtractionFailed {
        context: String,
        offset: usize,
        line: usize,
    },

    #[error("extracting {step} from {unit} stopped making progress after {iterations} iterations")]
    NoProgress {
        unit: String,
        step: Step,
        iterations: usize,
    },

    #[error("a second main workflow begins at line {line}; only one is allowed")]
    MultipleMainWorkflows { offset: usize, line: usize },
}

impl ExtractionError {
    /// Where in the source file the problem was found, if anywhere.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ExtractionError::UnbalancedDelimiter { offset, .. } => Some(*offset),
            ExtractionError::UnmappedPipeSegment { offset, .. } => Some(*offset),
            ExtractionError::SpanExtractionFailed { offset, .. } => Some(*offset),
            ExtractionError::NoProgress { .. } => None,
            ExtractionError::MultipleMainWorkflows { offset, .. } => Some(*offset),
        }
    }
}
