use nfstructure::{
    formatting::{Render, Syntax},
    language::ExtractionError,
};

/// Generate problem and detail messages for extraction errors
pub fn generate_error_message(error: &ExtractionError, renderer: &dyn Render) -> (String, String) {
    match error {
        ExtractionError::UnbalancedDelimiter {
            delimiter,
            kind,
            name,
            ..
        } => {
            let closing = match delimiter {
                '(' => ')',
                '[' => ']',
                _ => '}',
            };
            (
                format!("Unclosed '{}' in {} {}", delimiter, kind, name),
                format!(
                    r#"
The {} {} opens with '{}' but there is no matching '{}' before the end of
the file. Braces and parenthesis within string literals are not counted, so
check for a quote that was opened and never closed as well.
                    "#,
                    kind, name, delimiter, closing
                )
                .trim_ascii()
                .to_string(),
            )
        }
        ExtractionError::UnmappedPipeSegment { segment, .. } => {
            let call = format!(
                "{} {} {}",
                renderer.style(Syntax::Variable, "reads"),
                renderer.style(Syntax::Structure, "|"),
                renderer.style(Syntax::Invocation, "FASTQC")
            );
            let operation = format!(
                "{} {} {}",
                renderer.style(Syntax::Variable, "reads"),
                renderer.style(Syntax::Structure, "|"),
                renderer.style(Syntax::Operator, "view")
            );

            (
                format!(
                    "'{}' is neither a process, subworkflow or an operator",
                    segment
                ),
                format!(
                    r#"
The last step of a pipe chain must name a process or workflow that is
defined in or included into this file, as in

    {}

or be one of the channel operators, as in

    {}

If '{}' is an operator from a plugin, add it to the operators list in the
settings file.
                    "#,
                    call, operation, segment
                )
                .trim_ascii()
                .to_string(),
            )
        }
        ExtractionError::SpanExtractionFailed { context, .. } => (
            "Unable to find where this statement ends".to_string(),
            format!(
                r#"
The statement near

    {}

could not be delimited. Try rewriting it in a simplified version, for
example by splitting a long chain into assignments of intermediate channels.
                "#,
                renderer.style(Syntax::Description, context)
            )
            .trim_ascii()
            .to_string(),
        ),
        ExtractionError::NoProgress {
            unit,
            step,
            iterations,
        } => (
            "Extraction stopped making progress".to_string(),
            format!(
                r#"
Extracting {} from {} went around {} times without claiming any more of the
code. This is a fault in the extractor, not in your script. Sorry.
                "#,
                step, unit, iterations
            )
            .trim_ascii()
            .to_string(),
        ),
        ExtractionError::MultipleMainWorkflows { .. } => (
            "Second entry workflow".to_string(),
            format!(
                r#"
A script can have only one unnamed {} block. Give the others a name, as in

    {} {} {}

and invoke them from the entry workflow.
                "#,
                renderer.style(Syntax::Keyword, "workflow"),
                renderer.style(Syntax::Keyword, "workflow"),
                renderer.style(Syntax::Declaration, "ALIGN"),
                renderer.style(Syntax::Structure, "{ ... }")
            )
            .trim_ascii()
            .to_string(),
        ),
    }
}
