//! Types representing the structure of a Nextflow script

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which dialect of the Nextflow language a script is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "DSL1", alias = "dsl1")]
    Dsl1,
    #[serde(rename = "DSL2", alias = "dsl2")]
    Dsl2,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Dsl1 => write!(f, "DSL1"),
            Dialect::Dsl2 => write!(f, "DSL2"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DSL1" | "dsl1" | "1" => Ok(Dialect::Dsl1),
            "DSL2" | "dsl2" | "2" => Ok(Dialect::Dsl2),
            _ => Err(format!("unknown dialect '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessBlock<'i> {
    pub name: &'i str,
    pub span: Range<usize>,
    #[serde(skip)]
    pub text: &'i str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import<'i> {
    pub name: &'i str,
    pub alias: Option<&'i str>,
}

impl<'i> Import<'i> {
    /// The name this import is known by within the including file.
    pub fn visible(&self) -> &'i str {
        self.alias
            .unwrap_or(self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Include<'i> {
    pub path: &'i str,
    pub imports: Vec<Import<'i>>,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function<'i> {
    pub name: &'i str,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subworkflow<'i> {
    pub name: &'i str,
    pub span: Range<usize>,
    pub takes: Vec<&'i str>,
    pub emits: Vec<&'i str>,
    pub executors: Vec<Executor>,
}

/// The unnamed entry workflow of a DSL2 script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workflow {
    pub span: Range<usize>,
    pub executors: Vec<Executor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Kind {
    Call,
    Operation,
}

/// A statement discovered in a workflow body. `text` is what the
/// statement was classified from (which for pipe chains beginning with a
/// process name has been rewritten into call form), `original` is the
/// matching slice of the source file, comments included, and `span` is
/// where that slice lives in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Executor {
    Call {
        target: String,
        text: String,
        original: String,
        span: Range<usize>,
    },
    Operation {
        text: String,
        original: String,
        span: Range<usize>,
        calls: Vec<String>,
    },
}

impl Executor {
    pub fn kind(&self) -> Kind {
        match self {
            Executor::Call { .. } => Kind::Call,
            Executor::Operation { .. } => Kind::Operation,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Executor::Call { text, .. } => text,
            Executor::Operation { text, .. } => text,
        }
    }

    pub fn original(&self) -> &str {
        match self {
            Executor::Call { original, .. } => original,
            Executor::Operation { original, .. } => original,
        }
    }

    pub fn span(&self) -> Range<usize> {
        match self {
            Executor::Call { span, .. } => span.clone(),
            Executor::Operation { span, .. } => span.clone(),
        }
    }

    /// Name of the process or subworkflow invoked, if this is a Call.
    pub fn target(&self) -> Option<&str> {
        match self {
            Executor::Call { target, .. } => Some(target),
            Executor::Operation { .. } => None,
        }
    }
}

/// The passes of extraction, used when reporting which one failed to make
/// progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Definitions,
    Assignments,
    Calls,
    DotOperators,
    PipeChains,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Definitions => "definitions",
            Step::Assignments => "assignments",
            Step::Calls => "calls",
            Step::DotOperators => "dot operators",
            Step::PipeChains => "pipe chains",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document<'i> {
    #[serde(skip)]
    pub source: &'i str,
    pub dialect: Dialect,
    pub processes: Vec<ProcessBlock<'i>>,
    pub includes: Vec<Include<'i>>,
    pub functions: Vec<Function<'i>>,
    pub subworkflows: Vec<Subworkflow<'i>>,
    pub main: Option<Workflow>,
    pub executors: Vec<Executor>,
}

impl<'i> Document<'i> {
    pub fn process(&self, name: &str) -> Option<&ProcessBlock<'i>> {
        self.processes
            .iter()
            .find(|process| process.name == name)
    }

    pub fn subworkflow(&self, name: &str) -> Option<&Subworkflow<'i>> {
        self.subworkflows
            .iter()
            .find(|subworkflow| subworkflow.name == name)
    }

    /// Each body that was scanned for executors, labelled, in the order
    /// they were extracted.
    pub fn units(&self) -> Vec<(String, &[Executor])> {
        let mut units: Vec<(String, &[Executor])> = Vec::new();

        units.push(("file".to_string(), &self.executors));
        if let Some(main) = &self.main {
            units.push(("workflow".to_string(), &main.executors));
        }
        for subworkflow in &self.subworkflows {
            units.push((
                format!("workflow {}", subworkflow.name),
                &subworkflow.executors,
            ));
        }

        units
    }

    /// Line number (counting from 1) of a byte offset into the source.
    pub fn line(&self, offset: usize) -> usize {
        line_number(self.source, offset)
    }

    /// Describe where a fragment of code first occurs, for use as the
    /// suffix of a message, ie " at line 12". Empty if the fragment cannot
    /// be found.
    pub fn string_line(&self, fragment: &str) -> String {
        if fragment.is_empty() {
            return String::new();
        }
        match self
            .source
            .find(fragment)
        {
            Some(offset) => format!(" at line {}", self.line(offset)),
            None => String::new(),
        }
    }
}

/// Count the newlines preceding `offset`; lines count from 1.
pub fn line_number(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}
