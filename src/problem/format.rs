use super::messages::generate_error_message;
use owo_colors::OwoColorize;
use std::path::Path;
use nfstructure::{
    config::ConfigError,
    formatting::Render,
    language::{ExtractionError, LoadingError},
};

/// Format an extraction error with full details including source code
/// context
pub fn full_extraction_error<'i>(
    error: &ExtractionError,
    filename: &'i Path,
    source: &'i str,
    renderer: &impl Render,
) -> String {
    let (problem, details) = generate_error_message(error, renderer);

    let offset = match error.offset() {
        Some(offset) => offset.min(source.len()),
        None => {
            return format!(
                "{}: {}: {}\n\n{}",
                "error".bright_red(),
                filename.to_string_lossy(),
                problem.bold(),
                details
            );
        }
    };

    let i = calculate_line_number(source, offset);
    let j = calculate_column_number(source, offset);

    let code = source
        .lines()
        .nth(i)
        .unwrap_or("?");
    let line = i + 1;
    let column = j + 1;
    let width = 3.max(
        line.to_string()
            .len(),
    );

    format!(
        r#"
{}: {}:{}:{} {}

{:width$} {}
{:width$} {} {}
{:width$} {} {:>column$}

{}
        "#,
        "error".bright_red(),
        filename.to_string_lossy(),
        line,
        column,
        problem.bold(),
        ' ',
        '|'.bright_blue(),
        line.bright_blue(),
        '|'.bright_blue(),
        code,
        ' ',
        '|'.bright_blue(),
        '^'.bright_red(),
        details
    )
    .trim_ascii()
    .to_string()
}

/// Format an extraction error with concise single-line output
pub fn concise_extraction_error<'i>(
    error: &ExtractionError,
    filename: &'i Path,
    source: &'i str,
    renderer: &impl Render,
) -> String {
    let (problem, _) = generate_error_message(error, renderer);

    match error.offset() {
        Some(offset) => {
            let offset = offset.min(source.len());
            let line = calculate_line_number(source, offset) + 1;
            let column = calculate_column_number(source, offset) + 1;

            format!(
                "{}: {}:{}:{} {}",
                "error".bright_red(),
                filename.to_string_lossy(),
                line,
                column,
                problem.bold(),
            )
        }
        None => format!(
            "{}: {}: {}",
            "error".bright_red(),
            filename.to_string_lossy(),
            problem.bold(),
        ),
    }
}

/// Format a LoadingError with concise single-line output
pub fn concise_loading_error<'i>(error: &LoadingError<'i>) -> String {
    if error
        .details
        .is_empty()
    {
        format!(
            "{}: {}: {}",
            "error".bright_red(),
            error
                .filename
                .display(),
            error
                .problem
                .bold()
        )
    } else {
        format!(
            "{}: {}: {} ({})",
            "error".bright_red(),
            error
                .filename
                .display(),
            error
                .problem
                .bold(),
            error.details
        )
    }
}

/// Format a ConfigError with concise single-line output
pub fn concise_config_error(error: &ConfigError) -> String {
    format!("{}: {}", "error".bright_red(), error)
}

// Helper functions for line/column calculation
fn calculate_line_number(content: &str, offset: usize) -> usize {
    content[..offset]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
}

fn calculate_column_number(content: &str, offset: usize) -> usize {
    let before = &content[..offset];
    match before.rfind('\n') {
        Some(start) => content[start + 1..offset]
            .chars()
            .count(),
        None => before
            .chars()
            .count(),
    }
}
