//! Output generation for the nfstructure CLI application

use serde::Serialize;
use std::path::Path;
use tinytemplate::TinyTemplate;
use tracing::debug;

use nfstructure::formatting::collapse;
use nfstructure::language::{Document, Executor};

static TEMPLATE: &str = r#"# {filename}

Written in {dialect}, with {total} executors.
{{ if processes }}
## Processes

{{ for process in processes }}- `{process.name}` (line {process.line})
{{ endfor }}{{ endif }}{{ if includes }}
## Includes

{{ for include in includes }}- `{include.path}`: {include.names} (line {include.line})
{{ endfor }}{{ endif }}{{ if functions }}
## Functions

{{ for function in functions }}- `{function.name}` (line {function.line})
{{ endfor }}{{ endif }}{{ for unit in units }}
## {unit.title}

{{ if unit.executors }}| Kind | Target | Statement | Line |
|------|--------|-----------|------|
{{ for executor in unit.executors }}| {executor.kind} | {executor.target} | `{executor.text}` | {executor.line} |
{{ endfor }}{{ else }}No executors.
{{ endif }}{{ endfor }}"#;

#[derive(Serialize)]
struct Context {
    filename: String,
    dialect: String,
    total: usize,
    processes: Vec<Entry>,
    includes: Vec<IncludeEntry>,
    functions: Vec<Entry>,
    units: Vec<UnitEntry>,
}

#[derive(Serialize)]
struct Entry {
    name: String,
    line: usize,
}

#[derive(Serialize)]
struct IncludeEntry {
    path: String,
    names: String,
    line: usize,
}

#[derive(Serialize)]
struct UnitEntry {
    title: String,
    executors: Vec<ExecutorEntry>,
}

#[derive(Serialize)]
struct ExecutorEntry {
    kind: &'static str,
    target: String,
    text: String,
    line: usize,
}

fn executor_entry(document: &Document, executor: &Executor) -> ExecutorEntry {
    let (kind, target) = match executor {
        Executor::Call { target, .. } => ("call", target.clone()),
        Executor::Operation { calls, .. } => ("operation", calls.join(", ")),
    };

    ExecutorEntry {
        kind,
        target,
        text: collapse(executor.text()).replace('|', "\\|"),
        line: document.line(
            executor
                .span()
                .start,
        ),
    }
}

fn context(filename: &Path, document: &Document) -> Context {
    let units: Vec<UnitEntry> = document
        .units()
        .into_iter()
        .filter(|(label, executors)| label != "file" || !executors.is_empty())
        .map(|(label, executors)| UnitEntry {
            title: match label.as_str() {
                "file" => "Script".to_string(),
                "workflow" => "Entry workflow".to_string(),
                _ => label.replacen("workflow", "Workflow", 1),
            },
            executors: executors
                .iter()
                .map(|executor| executor_entry(document, executor))
                .collect(),
        })
        .collect();

    Context {
        filename: filename
            .to_string_lossy()
            .to_string(),
        dialect: document
            .dialect
            .to_string(),
        total: units
            .iter()
            .map(|unit| {
                unit.executors
                    .len()
            })
            .sum(),
        processes: document
            .processes
            .iter()
            .map(|process| Entry {
                name: process
                    .name
                    .to_string(),
                line: document.line(
                    process
                        .span
                        .start,
                ),
            })
            .collect(),
        includes: document
            .includes
            .iter()
            .map(|include| IncludeEntry {
                path: include
                    .path
                    .to_string(),
                names: include
                    .imports
                    .iter()
                    .map(|import| match import.alias {
                        Some(alias) => format!("{} as {}", import.name, alias),
                        None => import
                            .name
                            .to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                line: document.line(
                    include
                        .span
                        .start,
                ),
            })
            .collect(),
        functions: document
            .functions
            .iter()
            .map(|function| Entry {
                name: function
                    .name
                    .to_string(),
                line: document.line(
                    function
                        .span
                        .start,
                ),
            })
            .collect(),
        units,
    }
}

/// Summarize the document as Markdown.
pub fn via_report(filename: &Path, document: &Document) -> Result<String, tinytemplate::error::Error> {
    debug!("Reporting on {}", filename.display());

    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("report", TEMPLATE)?;

    tt.render("report", &context(filename, document))
}

/// The whole document as JSON.
pub fn via_json(document: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(document)
}
