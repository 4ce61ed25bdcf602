//! Outline of the structure extracted from a Nextflow script

use crate::formatting::*;
use crate::language::*;

/// Convert a Document into a Vec of fragments (Syntax tag, String pairs)
/// ready to be styled by a renderer.
pub fn outline(document: &Document) -> Vec<(Syntax, String)> {
    let mut output = Formatter::new(document);

    output.format_document();

    if let Some((_, last)) = output
        .fragments
        .last()
    {
        if !last.ends_with('\n') {
            output.newline();
        }
    }

    output.fragments
}

/// Statements spread over several lines are shown on one.
pub fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

struct Formatter<'d, 'i> {
    document: &'d Document<'i>,
    fragments: Vec<(Syntax, String)>,
    nesting: u8,
}

impl<'d, 'i> Formatter<'d, 'i> {
    fn new(document: &'d Document<'i>) -> Formatter<'d, 'i> {
        Formatter {
            document,
            fragments: Vec::new(),
            nesting: 0,
        }
    }

    fn append(&mut self, syntax: Syntax, content: &str) {
        self.fragments
            .push((syntax, content.to_string()));
    }

    fn append_str(&mut self, content: &str) {
        self.append(Syntax::Neutral, content);
    }

    fn newline(&mut self) {
        self.append(Syntax::Newline, "\n");
    }

    fn indent(&mut self) {
        if self.nesting > 0 {
            let spaces = " ".repeat(4 * self.nesting as usize);
            self.append(Syntax::Indent, &spaces);
        }
    }

    fn increase(&mut self) {
        self.nesting += 1;
    }

    fn decrease(&mut self) {
        self.nesting = self
            .nesting
            .saturating_sub(1);
    }

    fn append_location(&mut self, offset: usize) {
        let line = self
            .document
            .line(offset);
        self.append(Syntax::Structure, " (line ");
        self.append(Syntax::Numeric, &line.to_string());
        self.append(Syntax::Structure, ")");
    }

    fn append_list(&mut self, syntax: Syntax, names: &[&str]) {
        for (i, name) in names
            .iter()
            .enumerate()
        {
            if i > 0 {
                self.append(Syntax::Structure, ", ");
            }
            self.append(syntax, name);
        }
    }

    fn format_document(&mut self) {
        let document = self.document;

        self.append(Syntax::Header, "dialect ");
        self.append(Syntax::Header, &document.dialect.to_string());
        self.newline();

        if !document
            .includes
            .is_empty()
            || !document
                .processes
                .is_empty()
            || !document
                .functions
                .is_empty()
        {
            self.newline();
        }

        for include in &document.includes {
            self.format_include(include);
        }
        for process in &document.processes {
            self.append(Syntax::Keyword, "process");
            self.append_str(" ");
            self.append(Syntax::Declaration, process.name);
            self.append_location(
                process
                    .span
                    .start,
            );
            self.newline();
        }
        for function in &document.functions {
            self.append(Syntax::Keyword, "function");
            self.append_str(" ");
            self.append(Syntax::Function, function.name);
            self.append_location(
                function
                    .span
                    .start,
            );
            self.newline();
        }

        for subworkflow in &document.subworkflows {
            self.newline();
            self.append(Syntax::Keyword, "workflow");
            self.append_str(" ");
            self.append(Syntax::Declaration, subworkflow.name);
            self.append_location(
                subworkflow
                    .span
                    .start,
            );
            self.newline();

            self.increase();
            if !subworkflow
                .takes
                .is_empty()
            {
                self.indent();
                self.append(Syntax::Keyword, "take");
                self.append_str(" ");
                self.append_list(Syntax::Variable, &subworkflow.takes);
                self.newline();
            }
            if !subworkflow
                .emits
                .is_empty()
            {
                self.indent();
                self.append(Syntax::Keyword, "emit");
                self.append_str(" ");
                self.append_list(Syntax::Variable, &subworkflow.emits);
                self.newline();
            }
            self.format_executors(&subworkflow.executors);
            self.decrease();
        }

        if let Some(main) = &document.main {
            self.newline();
            self.append(Syntax::Keyword, "workflow");
            self.append_location(
                main.span
                    .start,
            );
            self.newline();

            self.increase();
            self.format_executors(&main.executors);
            self.decrease();
        }

        if !document
            .executors
            .is_empty()
        {
            self.newline();
            self.append(Syntax::Keyword, "script");
            self.newline();

            self.increase();
            self.format_executors(&document.executors);
            self.decrease();
        }
    }

    fn format_include(&mut self, include: &Include) {
        self.append(Syntax::Keyword, "include");
        self.append_str(" ");

        for (i, import) in include
            .imports
            .iter()
            .enumerate()
        {
            if i > 0 {
                self.append(Syntax::Structure, ", ");
            }
            self.append(Syntax::Invocation, import.name);
            if let Some(alias) = import.alias {
                self.append_str(" ");
                self.append(Syntax::Keyword, "as");
                self.append_str(" ");
                self.append(Syntax::Invocation, alias);
            }
        }

        self.append_str(" ");
        self.append(Syntax::Keyword, "from");
        self.append_str(" ");
        self.append(Syntax::String, &format!("'{}'", include.path));
        self.append_location(
            include
                .span
                .start,
        );
        self.newline();
    }

    fn format_executors(&mut self, executors: &[Executor]) {
        for executor in executors {
            self.indent();
            match executor {
                Executor::Call { target, text, .. } => {
                    self.append(Syntax::Keyword, "call");
                    self.append_str(" ");
                    self.append(Syntax::Invocation, target);
                    self.append(Syntax::Structure, ": ");
                    self.append(Syntax::Description, &collapse(text));
                }
                Executor::Operation { text, calls, .. } => {
                    self.append(Syntax::Operator, "operation");
                    self.append_str(" ");
                    self.append(Syntax::Description, &collapse(text));
                    if !calls.is_empty() {
                        self.append(Syntax::Structure, " -> ");
                        let names: Vec<&str> = calls
                            .iter()
                            .map(String::as_str)
                            .collect();
                        self.append_list(Syntax::Invocation, &names);
                    }
                }
            }
            self.newline();
        }
    }
}
