//! Deciding whether a statement invokes a process or workflow, or is an
//! operation on channels.

use crate::language::Dialect;

use super::scanner::{balanced_paren, pipe_positions};
use super::scope::ScopeRegistry;

/// Nextflow channel operators and channel factories.
pub const OPERATORS: &[&str] = &[
    "branch",
    "buffer",
    "choice",
    "close",
    "collate",
    "collect",
    "collectFile",
    "combine",
    "concat",
    "count",
    "countBy",
    "countFasta",
    "countFastq",
    "countJson",
    "countLines",
    "cross",
    "distinct",
    "dump",
    "empty",
    "filter",
    "first",
    "flatMap",
    "flatten",
    "fork",
    "from",
    "fromFilePairs",
    "fromList",
    "fromPath",
    "fromSRA",
    "groupBy",
    "groupTuple",
    "ifEmpty",
    "interval",
    "into",
    "join",
    "last",
    "map",
    "max",
    "merge",
    "min",
    "mix",
    "multiMap",
    "of",
    "phase",
    "print",
    "println",
    "randomSample",
    "reduce",
    "route",
    "separate",
    "set",
    "splitCsv",
    "splitFasta",
    "splitFastq",
    "splitJson",
    "splitText",
    "spread",
    "subscribe",
    "sum",
    "take",
    "tap",
    "toInteger",
    "toList",
    "toSortedList",
    "topic",
    "transpose",
    "unique",
    "until",
    "value",
    "view",
    "watchPath",
];

/// How closely a pipe segment must resemble an operator name to be taken
/// as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leniency {
    /// The operator name, possibly followed by its arguments or closure.
    Delimited,
    /// Anything starting with an operator name.
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Call { target: String },
    Operation,
}

/// A final pipe segment that names nothing known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedSegment {
    pub segment: String,
}

pub struct Classifier<'a> {
    registry: &'a ScopeRegistry,
    dialect: Dialect,
    extra: &'a [String],
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a ScopeRegistry, dialect: Dialect) -> Classifier<'a> {
        Classifier {
            registry,
            dialect,
            extra: &[],
        }
    }

    /// Accept these names as operators in addition to the built in ones.
    pub fn with_operators(mut self, extra: &'a [String]) -> Classifier<'a> {
        self.extra = extra;
        self
    }

    pub fn registry(&self) -> &ScopeRegistry {
        self.registry
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn any_operator(&self, mut predicate: impl FnMut(&str) -> bool) -> bool {
        OPERATORS
            .iter()
            .any(|operator| predicate(operator))
            || self
                .extra
                .iter()
                .any(|operator| predicate(operator))
    }

    pub fn is_operator(&self, name: &str) -> bool {
        self.any_operator(|operator| operator == name)
    }

    fn matches_operator(&self, segment: &str, leniency: Leniency) -> bool {
        self.any_operator(|operator| match leniency {
            Leniency::Delimited => match segment.strip_prefix(operator) {
                Some("") => true,
                Some(rest) => rest
                    .trim_start()
                    .starts_with(['(', '{']),
                None => false,
            },
            Leniency::Prefix => segment.starts_with(operator),
        })
    }

    /// Classify a statement by the last segment of its pipe chain: a known
    /// name makes it a Call of that name, an operator makes it an
    /// Operation. Under DSL1 everything is an Operation.
    pub fn classify_chain(&self, text: &str, leniency: Leniency) -> Result<Verdict, UnmappedSegment> {
        if self.dialect == Dialect::Dsl1 {
            return Ok(Verdict::Operation);
        }

        let segment = last_segment(text).trim();

        if self
            .registry
            .contains(segment)
        {
            return Ok(Verdict::Call {
                target: segment.to_string(),
            });
        }
        if self.matches_operator(segment, leniency) {
            return Ok(Verdict::Operation);
        }

        Err(UnmappedSegment {
            segment: segment.to_string(),
        })
    }

    /// Classify a statement without pipes. Only a lone invocation of a
    /// known name, `foo(...)` and nothing after, is a Call.
    pub fn classify_statement(&self, text: &str) -> Verdict {
        if self.dialect == Dialect::Dsl1 {
            return Verdict::Operation;
        }

        let text = text.trim();
        if let Some(caps) = regex!(r"^(\w+)\s*\(").captures(text) {
            let name = &caps[1];
            let open = caps
                .get(0)
                .map(|m| m.end())
                .unwrap_or(0);
            if self
                .registry
                .contains(name)
                && balanced_paren(text, open) == Ok(text.len())
            {
                return Verdict::Call {
                    target: name.to_string(),
                };
            }
        }

        Verdict::Operation
    }

    /// Every known process or workflow a statement invokes, whether by call
    /// syntax or as a bare pipe segment, in order of appearance.
    pub fn invoked(&self, text: &str) -> Vec<String> {
        let mut names: Vec<(usize, String)> = Vec::new();

        for caps in regex!(r"\b(\w+)\s*\(").captures_iter(text) {
            if let Some(name) = caps.get(1) {
                if text[..name.start()].ends_with('.') {
                    continue;
                }
                if self
                    .registry
                    .contains(name.as_str())
                {
                    names.push((name.start(), name.as_str().to_string()));
                }
            }
        }

        let mut start = 0;
        for end in pipe_positions(text)
            .into_iter()
            .chain(std::iter::once(text.len()))
        {
            let segment = &text[start..end];
            let word = segment.trim();
            if self
                .registry
                .contains(word)
            {
                let offset = start
                    + segment
                        .find(word)
                        .unwrap_or(0);
                names.push((offset, word.to_string()));
            }
            start = end + 1;
        }

        names.sort_by_key(|(offset, _)| *offset);
        let mut result: Vec<String> = Vec::new();
        for (_, name) in names {
            if !result.contains(&name) {
                result.push(name);
            }
        }
        result
    }
}

/// The text after the last top level pipe, or all of it if there is none.
pub fn last_segment(text: &str) -> &str {
    match pipe_positions(text).last() {
        Some(&i) => &text[i + 1..],
        None => text,
    }
}

/// The text before the first top level pipe, or all of it if there is none.
pub fn first_segment(text: &str) -> &str {
    match pipe_positions(text).first() {
        Some(&i) => &text[..i],
        None => text,
    }
}
