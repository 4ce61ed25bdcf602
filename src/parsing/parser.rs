//! Recognition of the top level structure of a Nextflow script: its
//! processes, includes, workflows and functions, and from those the units
//! whose executors are then extracted.

use std::ops::Range;

use tracing::debug;

use crate::config::Settings;
use crate::language::*;

use super::extractor::{self, carve, Carved, Extractor};
use super::scanner;
use super::scope::ScopeRegistry;
use super::unit::SourceUnit;

/// Parse a script with default settings.
pub fn parse_script(content: &str) -> Result<Document<'_>, ExtractionError> {
    parse_with_settings(content, &Settings::default())
}

pub fn parse_with_settings<'i>(content: &'i str, settings: &Settings) -> Result<Document<'i>, ExtractionError> {
    let mut parser = Parser::new(content, settings);
    parser.parse_document()
}

struct Parser<'i, 's> {
    source: &'i str,
    cleaned: String,
    settings: &'s Settings,
    unit: SourceUnit,
}

impl<'i, 's> Parser<'i, 's> {
    fn new(content: &'i str, settings: &'s Settings) -> Parser<'i, 's> {
        let cleaned = scanner::strip_comments(content);
        let unit = SourceUnit::new("script", "file", &cleaned, 0);

        Parser {
            source: content,
            cleaned,
            settings,
            unit,
        }
    }

    fn text(&self, span: Range<usize>) -> &'i str {
        self.source
            .get(span)
            .unwrap_or("")
    }

    fn parse_document(&mut self) -> Result<Document<'i>, ExtractionError> {
        let settings = self.settings;
        let limit = settings.iteration_limit;

        let processes = extractor::extract_processes(&mut self.unit, self.source, limit)?;
        let includes = self.read_includes()?;

        let named = carve(
            &mut self.unit,
            regex!(r"(?m)^[ \t]*workflow\s+(\w+)\s*\{"),
            "workflow",
            self.source,
            limit,
        )?;
        let entry = self.read_entry(limit)?;
        let functions = self.read_functions(limit)?;

        let dialect = match settings.dialect {
            Some(dialect) => dialect,
            None => detect_dialect(
                &self.cleaned,
                &processes,
                !includes.is_empty() || !named.is_empty() || entry.is_some(),
            ),
        };
        debug!("Dialect {}", dialect);

        let names: Vec<&str> = named
            .iter()
            .map(|carved| self.text(carved.name.clone()))
            .collect();
        let registry = ScopeRegistry::build(&processes, &names, &includes);
        debug!(
            "{} name{} in scope",
            registry.len(),
            if registry.len() == 1 { "" } else { "s" }
        );

        let extractor = Extractor::new(self.source, &registry, dialect)
            .with_operators(&settings.operators)
            .with_limit(limit);

        let executors = extractor.extract_executors(&mut self.unit)?;

        let main = match entry {
            Some(carved) => {
                let executors = match dialect {
                    Dialect::Dsl2 => self.extract_workflow(&extractor, "main", &carved)?,
                    Dialect::Dsl1 => Vec::new(),
                };
                Some(Workflow {
                    span: carved.span,
                    executors,
                })
            }
            None => None,
        };

        let mut subworkflows = Vec::with_capacity(named.len());
        for (carved, name) in named
            .iter()
            .zip(names)
        {
            let body = &self.cleaned[carved
                .body
                .clone()];
            let origin = carved
                .body
                .start;

            let mut takes = Vec::new();
            let mut emits = Vec::new();
            for (label, range) in sections(body) {
                let range = origin + range.start..origin + range.end;
                match label {
                    "take" => takes.extend(self.declared(range, false)),
                    "emit" => emits.extend(self.declared(range, true)),
                    _ => {}
                }
            }

            let executors = match dialect {
                Dialect::Dsl2 => self.extract_workflow(&extractor, name, carved)?,
                Dialect::Dsl1 => Vec::new(),
            };

            subworkflows.push(Subworkflow {
                name,
                span: carved
                    .span
                    .clone(),
                takes,
                emits,
                executors,
            });
        }

        debug!(
            "Found {} subworkflow{}",
            subworkflows.len(),
            if subworkflows.len() == 1 { "" } else { "s" }
        );

        Ok(Document {
            source: self.source,
            dialect,
            processes,
            includes,
            functions,
            subworkflows,
            main,
            executors,
        })
    }

    /// Claim every include statement. Includes of plugins are consumed but
    /// make no names visible, so they are not reported.
    fn read_includes(&mut self) -> Result<Vec<Include<'i>>, ExtractionError> {
        let text = self
            .unit
            .working()
            .to_string();
        let pattern = regex!(
            r#"(?m)^[ \t]*include\s*(\{[^}]*\}|\w+(?:\s+as\s+\w+)?)\s*from\s*['"]([^'"\n]+)['"]"#
        );

        let mut includes = Vec::new();
        let mut claimed = Vec::new();

        for caps in pattern.captures_iter(&text) {
            let (whole, names, path) = match (caps.get(0), caps.get(1), caps.get(2)) {
                (Some(whole), Some(names), Some(path)) => (whole, names, path),
                _ => continue,
            };

            let header = whole.as_str();
            let start = whole.start()
                + (header.len()
                    - header
                        .trim_start()
                        .len());
            let mut end = whole.end();

            let path = self.text(
                self.unit
                    .to_file_span(&path.range()),
            );

            if let Some(extension) = regex!(r"^[ \t]*\.?[ \t]*(?:addParams|params)[ \t]*\(").find(&text[end..]) {
                let open = end + extension.end();
                end = scanner::balanced_paren(&text, open).map_err(|_| {
                    let offset = self
                        .unit
                        .to_file(start);
                    ExtractionError::UnbalancedDelimiter {
                        delimiter: '(',
                        kind: "include",
                        name: path.to_string(),
                        offset,
                        line: line_number(self.source, offset),
                    }
                })?;
            }

            claimed.push(start..end);

            if path.starts_with("plugin/") {
                debug!("Skipping plugin {}", path);
                continue;
            }

            let mut imports = Vec::new();
            for caps in regex!(r"(\w+)(?:\s+as\s+(\w+))?").captures_iter(names.as_str()) {
                let name = match caps.get(1) {
                    Some(name) => name,
                    None => continue,
                };
                let locate = |m: regex::Match| {
                    self.unit
                        .to_file_span(&(names.start() + m.start()..names.start() + m.end()))
                };

                imports.push(Import {
                    name: self.text(locate(name)),
                    alias: caps
                        .get(2)
                        .map(|alias| self.text(locate(alias))),
                });
            }

            includes.push(Include {
                path,
                imports,
                span: self
                    .unit
                    .to_file_span(&(start..end)),
            });
        }

        for span in claimed {
            self.unit
                .consume(span);
        }

        debug!(
            "Found {} include{}",
            includes.len(),
            if includes.len() == 1 { "" } else { "s" }
        );

        Ok(includes)
    }

    /// Claim the entry workflow, of which there may be only one.
    fn read_entry(&mut self, limit: Option<usize>) -> Result<Option<Carved>, ExtractionError> {
        let mut entries = carve(
            &mut self.unit,
            regex!(r"(?m)^[ \t]*workflow\s*\{"),
            "workflow",
            self.source,
            limit,
        )?;

        if entries.len() > 1 {
            let offset = entries[1]
                .span
                .start;
            return Err(ExtractionError::MultipleMainWorkflows {
                offset,
                line: line_number(self.source, offset),
            });
        }

        Ok(entries.pop())
    }

    fn read_functions(&mut self, limit: Option<usize>) -> Result<Vec<Function<'i>>, ExtractionError> {
        let carved = carve(
            &mut self.unit,
            regex!(
                r"(?m)^[ \t]*(?:def|void|int|long|boolean|double|float|[A-Z]\w*(?:<[^>\n]*>)?(?:\[\])?)[ \t]+(\w+)[ \t]*\([^)\n]*\)[ \t]*\{"
            ),
            "function",
            self.source,
            limit,
        )?;

        let functions: Vec<Function<'i>> = carved
            .into_iter()
            .map(|carved| Function {
                name: self.text(carved.name),
                span: carved.span,
            })
            .collect();

        debug!(
            "Found {} function{}",
            functions.len(),
            if functions.len() == 1 { "" } else { "s" }
        );

        Ok(functions)
    }

    /// Extract the executors from the part of a workflow body that holds
    /// its statements.
    fn extract_workflow(
        &self,
        extractor: &Extractor,
        name: &str,
        carved: &Carved,
    ) -> Result<Vec<Executor>, ExtractionError> {
        let origin = carved
            .body
            .start;
        let body = &self.cleaned[carved
            .body
            .clone()];

        let range = match main_section(body) {
            Some(range) => range,
            None => return Ok(Vec::new()),
        };

        let mut unit = SourceUnit::new(
            "workflow",
            name,
            &body[range.clone()],
            origin + range.start,
        );
        extractor.extract_executors(&mut unit)
    }

    /// The names in a `take:` or `emit:` section, one per line. An emit may
    /// be an assignment, in which case it's the name being assigned.
    fn declared(&self, range: Range<usize>, assignments: bool) -> Vec<&'i str> {
        let section = &self.cleaned[range.clone()];
        let mut names = Vec::new();

        for caps in regex!(r"(?m)^[ \t]*(\S[^\n]*?)[ \t]*$").captures_iter(section) {
            let line = match caps.get(1) {
                Some(line) => line,
                None => continue,
            };

            let span = if assignments {
                match regex!(r"^(\w+)\s*=[^=]").captures(line.as_str()) {
                    Some(caps) => match caps.get(1) {
                        Some(name) => line.start() + name.start()..line.start() + name.end(),
                        None => line.range(),
                    },
                    None => line.range(),
                }
            } else {
                match regex!(r"^\w+").find(line.as_str()) {
                    Some(name) => line.start() + name.start()..line.start() + name.end(),
                    None => continue,
                }
            };

            names.push(self.text(range.start + span.start..range.start + span.end));
        }

        names
    }
}

/// The labelled sections of a workflow body, as ranges relative to it.
/// Labels nested within braces don't count.
fn sections(body: &str) -> Vec<(&str, Range<usize>)> {
    let labels: Vec<(usize, usize, &str)> = regex!(r"(?m)^[ \t]*(take|main|emit|publish)[ \t]*:")
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?;
            Some((whole.start(), whole.end(), label.as_str()))
        })
        .filter(|(start, _, _)| scanner::curly_depth(&body[..*start]) == 0)
        .collect();

    labels
        .iter()
        .enumerate()
        .map(|(i, (_, end, label))| {
            let until = labels
                .get(i + 1)
                .map(|(start, _, _)| *start)
                .unwrap_or(body.len());
            (*label, *end..until)
        })
        .collect()
}

/// Where a workflow's statements are: its `main:` section, or the whole
/// body if it has no labelled sections at all.
fn main_section(body: &str) -> Option<Range<usize>> {
    let sections = sections(body);
    if sections.is_empty() {
        return Some(0..body.len());
    }

    sections
        .into_iter()
        .find(|(label, _)| *label == "main")
        .map(|(_, range)| range)
}

/// Work out the dialect from the script itself. An explicit declaration
/// wins; after that any of the DSL2 only constructs settles it; failing
/// that, processes connected by `from` and `into` clauses mean DSL1.
fn detect_dialect(cleaned: &str, processes: &[ProcessBlock], structured: bool) -> Dialect {
    if let Some(caps) = regex!(r"nextflow\.enable\.dsl\s*=\s*(\d)").captures(cleaned) {
        return match &caps[1] {
            "1" => Dialect::Dsl1,
            _ => Dialect::Dsl2,
        };
    }

    if structured {
        return Dialect::Dsl2;
    }

    let clauses = regex!(
        r"(?m)^[ \t]*(?:val|path|file|tuple|set|env|each|stdout|stdin)\b[^\n]*\b(?:from|into)\b"
    );
    let script = regex!(r#"(?m)^[ \t]*(?:script|shell|exec)[ \t]*:|""""#);

    for process in processes {
        let text = match cleaned.get(
            process
                .span
                .clone(),
        ) {
            Some(text) => text,
            None => continue,
        };
        let declarations = match script.find(text) {
            Some(found) => &text[..found.start()],
            None => text,
        };
        if clauses.is_match(declarations) {
            return Dialect::Dsl1;
        }
    }

    Dialect::Dsl2
}
