//! Discovery of processes and executor statements in a body of Nextflow
//! code.
//!
//! Extraction runs as a sequence of passes. Each pass rescans the working
//! text of the unit, claims the first statement it recognises, and goes
//! again until nothing more turns up; then the next pass begins. The order
//! of the passes matters: an assignment has to be claimed before the dot
//! operator scan runs or that scan would match inside its right hand side.

use std::collections::BTreeSet;
use std::ops::Range;

use regex::Regex;
use tracing::{debug, trace};

use crate::language::{line_number, Dialect, Executor, ExtractionError, ProcessBlock, Step};

use super::classify::{first_segment, Classifier, Leniency, UnmappedSegment, Verdict};
use super::scanner::{self, Profile, ScanError};
use super::scope::ScopeRegistry;
use super::unit::SourceUnit;

/// Statements beginning with these write to the console; they resemble
/// channel operations but carry no data flow.
const IGNORED_PREFIXES: &[&str] = &["System.out"];

fn describe(unit: &SourceUnit) -> String {
    format!("{} '{}'", unit.kind(), unit.name())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Termination guard for the inner loops. Every accepted match must shrink
/// what remains of the unit, and the number of rounds is capped.
pub(crate) struct Progress {
    unit: String,
    step: Step,
    limit: usize,
    iterations: usize,
    remaining: usize,
}

impl Progress {
    pub(crate) fn new(unit: &SourceUnit, step: Step, limit: Option<usize>) -> Progress {
        Progress {
            unit: describe(unit),
            step,
            limit: limit.unwrap_or(
                unit.original()
                    .len()
                    + 1,
            ),
            iterations: 0,
            remaining: unit.remaining(),
        }
    }

    /// Record that a match was accepted and consumed.
    pub(crate) fn advance(&mut self, unit: &SourceUnit) -> Result<(), ExtractionError> {
        self.iterations += 1;

        let remaining = unit.remaining();
        if remaining >= self.remaining || self.iterations > self.limit {
            return Err(ExtractionError::NoProgress {
                unit: self
                    .unit
                    .clone(),
                step: self.step,
                iterations: self.iterations,
            });
        }

        self.remaining = remaining;
        Ok(())
    }
}

/// A definition cut out of a unit: its name, the whole definition from
/// keyword to closing brace, and the body between the braces, all as
/// offsets into the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Carved {
    pub name: Range<usize>,
    pub span: Range<usize>,
    pub body: Range<usize>,
}

pub(crate) fn unquote(name: &str) -> &str {
    name.trim_matches(|c| c == '\'' || c == '"')
}

/// Repeatedly find a definition header matching `pattern` (which must end
/// with the opening brace, and may capture the name as group 1), claim it
/// through to its closing brace, until there are no more.
pub(crate) fn carve(
    unit: &mut SourceUnit,
    pattern: &Regex,
    kind: &'static str,
    source: &str,
    limit: Option<usize>,
) -> Result<Vec<Carved>, ExtractionError> {
    let mut found = Vec::new();
    let mut progress = Progress::new(unit, Step::Definitions, limit);

    loop {
        let (name, start, open) = {
            let text = unit.working();
            let caps = match pattern.captures(text) {
                Some(caps) => caps,
                None => break,
            };
            let whole = match caps.get(0) {
                Some(whole) => whole,
                None => break,
            };
            let name = caps
                .get(1)
                .map(|m| m.range())
                .unwrap_or(whole.end()..whole.end());
            let header = whole.as_str();
            let indent = header.len()
                - header
                    .trim_start()
                    .len();
            (name, whole.start() + indent, whole.end())
        };

        let end = scanner::balanced_curly(unit.working(), open).map_err(|_| {
            let offset = unit.to_file(start);
            let name = match source
                .get(unit.to_file_span(&name))
                .map(unquote)
            {
                Some(name) if !name.is_empty() => name,
                _ => "main",
            };
            ExtractionError::UnbalancedDelimiter {
                delimiter: '{',
                kind,
                name: name.to_string(),
                offset,
                line: line_number(source, offset),
            }
        })?;

        unit.consume(start..end);
        progress.advance(unit)?;

        found.push(Carved {
            name: unit.to_file_span(&name),
            span: unit.to_file_span(&(start..end)),
            body: unit.to_file_span(&(open..end - 1)),
        });
    }

    Ok(found)
}

/// Claim every process definition in the unit.
pub fn extract_processes<'i>(
    unit: &mut SourceUnit,
    source: &'i str,
    limit: Option<usize>,
) -> Result<Vec<ProcessBlock<'i>>, ExtractionError> {
    let pattern = regex!(r#"(?m)^[ \t]*process\s+(\w+|'[^'\n]+'|"[^"\n]+")\s*\{"#);

    let processes: Vec<ProcessBlock<'i>> = carve(unit, pattern, "process", source, limit)?
        .into_iter()
        .map(|carved| ProcessBlock {
            name: source
                .get(carved.name)
                .map(unquote)
                .unwrap_or(""),
            text: source
                .get(carved.span.clone())
                .unwrap_or(""),
            span: carved.span,
        })
        .collect();

    debug!(
        "Found {} process{}",
        processes.len(),
        if processes.len() == 1 { "" } else { "es" }
    );

    Ok(processes)
}

/// A statement recognised by one of the passes, in unit offsets.
struct Found {
    span: Range<usize>,
    text: String,
    verdict: Verdict,
}

fn slice(text: &str, span: &Range<usize>) -> String {
    text.get(span.clone())
        .unwrap_or("")
        .to_string()
}

pub struct Extractor<'a> {
    source: &'a str,
    classifier: Classifier<'a>,
    limit: Option<usize>,
}

impl<'a> Extractor<'a> {
    /// `source` is the whole original file, used for line numbers and for
    /// the original text of each executor.
    pub fn new(source: &'a str, registry: &'a ScopeRegistry, dialect: Dialect) -> Extractor<'a> {
        Extractor {
            source,
            classifier: Classifier::new(registry, dialect),
            limit: None,
        }
    }

    pub fn with_operators(mut self, extra: &'a [String]) -> Extractor<'a> {
        self.classifier = self
            .classifier
            .with_operators(extra);
        self
    }

    /// Cap the rounds of each pass, rather than the default of the unit's
    /// length.
    pub fn with_limit(mut self, limit: Option<usize>) -> Extractor<'a> {
        self.limit = limit;
        self
    }

    /// Find the executors of a unit whose definitions have already been
    /// claimed, in order of discovery.
    pub fn extract_executors(&self, unit: &mut SourceUnit) -> Result<Vec<Executor>, ExtractionError> {
        let mut executors = Vec::new();

        self.run(unit, &mut executors, Step::Assignments, |unit| {
            self.next_assignment(unit)
        })?;

        if self
            .classifier
            .dialect()
            == Dialect::Dsl2
        {
            self.run(unit, &mut executors, Step::Calls, |unit| self.next_call(unit))?;
        }

        let mut tried = BTreeSet::new();
        self.run(unit, &mut executors, Step::DotOperators, |unit| {
            self.next_dot_operator(unit, &mut tried)
        })?;

        self.run(unit, &mut executors, Step::PipeChains, |unit| {
            self.next_pipe_chain(unit)
        })?;

        cleanup(unit, &mut executors);

        debug!(
            "Found {} executor{} in {}",
            executors.len(),
            plural(executors.len()),
            describe(unit)
        );

        Ok(executors)
    }

    fn run(
        &self,
        unit: &mut SourceUnit,
        executors: &mut Vec<Executor>,
        step: Step,
        mut next: impl FnMut(&SourceUnit) -> Result<Option<Found>, ExtractionError>,
    ) -> Result<(), ExtractionError> {
        let mut progress = Progress::new(unit, step, self.limit);

        while let Some(found) = next(&*unit)? {
            let executor = self.executor(unit, &found);
            trace!("{} {:?}: {}", step, executor.kind(), executor.text());

            unit.consume(found.span);
            executors.push(executor);
            progress.advance(unit)?;
        }

        Ok(())
    }

    fn executor(&self, unit: &SourceUnit, found: &Found) -> Executor {
        let span = unit.to_file_span(&found.span);
        let original = self
            .source
            .get(span.clone())
            .unwrap_or("")
            .to_string();

        match &found.verdict {
            Verdict::Call { target } => Executor::Call {
                target: target.clone(),
                text: found
                    .text
                    .clone(),
                original,
                span,
            },
            Verdict::Operation => Executor::Operation {
                calls: self
                    .classifier
                    .invoked(&found.text),
                text: found
                    .text
                    .clone(),
                original,
                span,
            },
        }
    }

    fn scan_error(&self, unit: &SourceUnit, error: ScanError, start: usize, end: usize) -> ExtractionError {
        let offset = unit.to_file(start);
        let line = line_number(self.source, offset);

        match error {
            ScanError::Unbalanced(delimiter) => ExtractionError::UnbalancedDelimiter {
                delimiter,
                kind: unit.kind(),
                name: unit
                    .name()
                    .to_string(),
                offset,
                line,
            },
            ScanError::Unterminated => ExtractionError::SpanExtractionFailed {
                context: scanner::window(unit.working(), start, end)
                    .trim()
                    .to_string(),
                offset,
                line,
            },
        }
    }

    fn classify_chain(
        &self,
        unit: &SourceUnit,
        span: &Range<usize>,
        statement: &str,
        leniency: Leniency,
    ) -> Result<Verdict, ExtractionError> {
        self.classifier
            .classify_chain(statement, leniency)
            .map_err(|UnmappedSegment { segment }| {
                let offset = unit.to_file(span.start);
                ExtractionError::UnmappedPipeSegment {
                    statement: statement
                        .trim()
                        .to_string(),
                    segment,
                    offset,
                    line: line_number(self.source, offset),
                }
            })
    }

    fn rejected(text: &str, span: &Range<usize>) -> bool {
        scanner::in_if_condition(text, span) || scanner::in_string_literal(text, span)
    }

    /// `x = ...`, `def x = ...`, or `(a, b) = ...`.
    fn next_assignment(&self, unit: &SourceUnit) -> Result<Option<Found>, ExtractionError> {
        let text = unit.working();
        let profile = Profile::new(text);

        let patterns = [
            regex!(r"(?m)^[ \t]*(?:def[ \t]+)?(\w+)[ \t]*=[^=~]"),
            regex!(r"(?m)^[ \t]*(?:def[ \t]+)?(\(\s*\w+(?:\s*,\s*\w+)*\s*\))[ \t]*=[^=~]"),
        ];

        for pattern in patterns {
            for caps in pattern.captures_iter(text) {
                let (whole, target) = match (caps.get(0), caps.get(1)) {
                    (Some(whole), Some(target)) => (whole, target),
                    _ => continue,
                };
                let header = whole.as_str();
                let start = whole.start()
                    + (header.len()
                        - header
                            .trim_start()
                            .len());

                if profile.parens_before(start) != 0 || scanner::in_closure(text, &profile, start) {
                    continue;
                }

                let equals = match text[target.end()..].find('=') {
                    Some(i) => target.end() + i,
                    None => continue,
                };

                let end = scanner::end_of_operation(text, equals + 1)
                    .map_err(|e| self.scan_error(unit, e, start, equals + 1))?;
                let span = scanner::extend_through_pipes(text, start..end)
                    .map_err(|e| self.scan_error(unit, e, start, end))?;

                if Self::rejected(text, &span) {
                    continue;
                }

                return Ok(Some(Found {
                    text: slice(text, &span),
                    span,
                    verdict: Verdict::Operation,
                }));
            }
        }

        Ok(None)
    }

    /// `foo(...)` where foo is a known process, subworkflow, or include.
    fn next_call(&self, unit: &SourceUnit) -> Result<Option<Found>, ExtractionError> {
        let text = unit.working();
        let profile = Profile::new(text);

        for caps in regex!(r"\b(\w+)[ \t]*\(").captures_iter(text) {
            let (whole, name) = match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(name)) => (whole, name),
                _ => continue,
            };
            if !self
                .classifier
                .registry()
                .contains(name.as_str())
            {
                continue;
            }

            let start = name.start();
            if text[..start].ends_with('.') || scanner::in_closure(text, &profile, start) {
                continue;
            }

            // the value of an assignment not at the start of a line; the
            // assignment is claimed whole
            let assigned = assignment_before(text, start);

            let end = scanner::balanced_paren(text, whole.end())
                .map_err(|e| self.scan_error(unit, e, start, whole.end()))?;
            let mut span = scanner::extend_through_pipes(text, assigned.unwrap_or(start)..end)
                .map_err(|e| self.scan_error(unit, e, start, end))?;

            if Self::rejected(text, &span) {
                continue;
            }

            let statement = slice(text, &span);
            let verdict = if assigned.is_some() {
                Verdict::Operation
            } else if !scanner::pipe_positions(&statement).is_empty() {
                self.classify_chain(unit, &span, &statement, Leniency::Delimited)?
            } else {
                let widened = scanner::expand_call_to_operation(text, span.clone())
                    .map_err(|e| self.scan_error(unit, e, start, end))?;
                if widened != span {
                    span = widened;
                    Verdict::Operation
                } else {
                    Verdict::Call {
                        target: name
                            .as_str()
                            .to_string(),
                    }
                }
            };

            return Ok(Some(Found {
                text: slice(text, &span),
                span,
                verdict,
            }));
        }

        Ok(None)
    }

    /// A statement containing `.op` for some channel operator `op`.
    fn next_dot_operator(
        &self,
        unit: &SourceUnit,
        tried: &mut BTreeSet<usize>,
    ) -> Result<Option<Found>, ExtractionError> {
        let text = unit.working();
        let profile = Profile::new(text);

        for caps in regex!(r"\.[ \t]*(\w+)").captures_iter(text) {
            let name = match caps.get(1) {
                Some(name) => name,
                None => continue,
            };
            if !self
                .classifier
                .is_operator(name.as_str())
            {
                continue;
            }

            let (start, end) = (name.start(), name.end());
            if profile.parens_before(start) != 0 || profile.parens_after(end) != 0 {
                continue;
            }
            if !tried.insert(start) {
                continue;
            }
            if profile.quoted(start) || scanner::in_closure(text, &profile, start) {
                continue;
            }

            let span = scanner::executor_around_with(text, &profile, start, end)
                .map_err(|_| self.scan_error(unit, ScanError::Unterminated, start, end))?;
            let span = scanner::extend_through_pipes(text, span)
                .map_err(|e| self.scan_error(unit, e, start, end))?;

            if Self::rejected(text, &span) {
                continue;
            }

            let statement = slice(text, &span);
            let verdict = if !scanner::pipe_positions(&statement).is_empty() {
                self.classify_chain(unit, &span, &statement, Leniency::Delimited)?
            } else {
                self.classifier
                    .classify_statement(&statement)
            };

            return Ok(Some(Found {
                text: statement,
                span,
                verdict,
            }));
        }

        Ok(None)
    }

    /// `ch | op | op`, a chain opening with an identifier or a property
    /// path such as `FASTQC.out.zip`.
    fn next_pipe_chain(&self, unit: &SourceUnit) -> Result<Option<Found>, ExtractionError> {
        let text = unit.working();
        let profile = Profile::new(text);

        let pattern = regex!(r"(?m)^[ \t]*(\w+(?:[ \t]*\.[ \t]*\w+)*)[ \t]*\|[ \t]*\w");

        for caps in pattern.captures_iter(text) {
            let head = match caps.get(1) {
                Some(head) => head,
                None => continue,
            };

            let start = head.start();
            if profile.parens_before(start) != 0 || scanner::in_closure(text, &profile, start) {
                continue;
            }

            let span = scanner::expand_pipe(text, start..head.end())
                .map_err(|e| self.scan_error(unit, e, start, head.end()))?;

            if Self::rejected(text, &span) {
                continue;
            }

            let chain = slice(text, &span);
            let first = first_segment(&chain);
            let name = first.trim();

            // a process named at the head of a chain is invoked with no
            // arguments
            let known = self
                .classifier
                .registry()
                .contains(name);
            let rewritten = if known {
                format!(
                    "{}() {}",
                    name,
                    chain[first.len()..].trim_start()
                )
            } else {
                chain.clone()
            };

            // operators trailing an invoked head still make the chain a call
            // of that head
            let verdict = match self.classify_chain(unit, &span, &rewritten, Leniency::Prefix)? {
                Verdict::Operation if known && self.classifier.dialect() == Dialect::Dsl2 => Verdict::Call {
                    target: name.to_string(),
                },
                verdict => verdict,
            };

            return Ok(Some(Found {
                text: rewritten,
                span,
                verdict,
            }));
        }

        Ok(None)
    }
}

/// Where the target of an assignment begins, if the expression at `start`
/// is its right hand side.
fn assignment_before(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();

    let equals = match scanner::previous_significant(bytes, start) {
        Some((i, b'=')) => i,
        _ => return None,
    };
    if equals > 0 && matches!(bytes[equals - 1], b'=' | b'!' | b'<' | b'>' | b'~') {
        return None;
    }

    let target = regex!(r"(?:\bdef[ \t]+)?(?:\w+|\(\s*\w+(?:\s*,\s*\w+)*\s*\))[ \t]*$")
        .find(&text[..equals])?;

    // a property of something, `params.x = ...`, is left to the call
    if text[..target.start()].ends_with('.') {
        return None;
    }

    Some(target.start())
}

/// Drop executors that are console output, handing their text back to the
/// unit.
fn cleanup(unit: &mut SourceUnit, executors: &mut Vec<Executor>) {
    let mut kept = Vec::with_capacity(executors.len());

    for executor in executors.drain(..) {
        let ignored = IGNORED_PREFIXES
            .iter()
            .any(|prefix| {
                executor
                    .text()
                    .starts_with(prefix)
            });

        if ignored {
            let span = executor.span();
            let local = unit.to_local(span.start)..unit.to_local(span.end);
            trace!("Ignoring {}", executor.text());
            unit.release(&local);
        } else {
            kept.push(executor);
        }
    }

    *executors = kept;
}
