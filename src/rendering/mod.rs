//! Renderers for colourizing outlines

use crate::formatting::*;
use crate::language::Document;

mod terminal;

pub use terminal::Terminal;

/// We render in two passes. First we convert the Document into a Vec of
/// "fragments" (Syntax tag, String pairs). Then second we apply the specified
/// renderer to each pair to result in an embellished/highlighted String.
pub fn render(renderer: &impl Render, document: &Document) -> String {
    let fragments = outline(document);

    render_to_string(renderer, fragments)
}

fn render_to_string(renderer: &impl Render, fragments: Vec<(Syntax, String)>) -> String {
    let mut output = String::new();

    for (syntax, content) in fragments {
        let rendered = renderer.style(syntax, &content);
        output.push_str(&rendered);
    }

    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }

    output
}
