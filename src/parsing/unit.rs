//! A body of code being picked apart. The text is never edited; claimed
//! spans are tracked by offset and the working text is the original with
//! those spans blanked out.

use std::ops::Range;

use super::scanner::blank;

/// Framing put around each body so that patterns looking for a statement
/// boundary before or after a match always find one.
pub(crate) const HEAD: &str = "start\n";
pub(crate) const TAIL: &str = "\nend";

#[derive(Debug, Clone)]
pub struct SourceUnit {
    kind: &'static str,
    name: String,
    origin: usize,
    original: String,
    working: String,
    consumed: Vec<Range<usize>>,
}

impl SourceUnit {
    /// Wrap `body`, which begins at byte `origin` of the source file.
    pub fn new(kind: &'static str, name: &str, body: &str, origin: usize) -> SourceUnit {
        let original = format!("{}{}{}", HEAD, body, TAIL);
        SourceUnit {
            kind,
            name: name.to_string(),
            origin,
            working: original.clone(),
            original,
            consumed: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The framed text as first given.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The framed text with every consumed span blanked.
    pub fn working(&self) -> &str {
        &self.working
    }

    /// The body, without framing.
    pub fn body(&self) -> &str {
        &self.original[HEAD.len()..self.original.len() - TAIL.len()]
    }

    pub fn consumed(&self) -> &[Range<usize>] {
        &self.consumed
    }

    pub fn is_consumed(&self, offset: usize) -> bool {
        self.consumed
            .iter()
            .any(|range| range.contains(&offset))
    }

    /// Claim a span so that later scans no longer see it.
    pub fn consume(&mut self, span: Range<usize>) {
        if span.is_empty() {
            return;
        }

        let mut merged: Vec<Range<usize>> = Vec::with_capacity(self.consumed.len() + 1);
        let mut span = span;
        for range in self
            .consumed
            .drain(..)
        {
            if range.end < span.start || span.end < range.start {
                merged.push(range);
            } else {
                span = range.start.min(span.start)..range.end.max(span.end);
            }
        }
        merged.push(span);
        merged.sort_by_key(|range| range.start);

        self.consumed = merged;
        self.refresh();
    }

    /// Give a previously consumed span back.
    pub fn release(&mut self, span: &Range<usize>) {
        let mut remaining = Vec::with_capacity(self.consumed.len() + 1);
        for range in self
            .consumed
            .drain(..)
        {
            if range.end <= span.start || span.end <= range.start {
                remaining.push(range);
                continue;
            }
            if range.start < span.start {
                remaining.push(range.start..span.start);
            }
            if span.end < range.end {
                remaining.push(span.end..range.end);
            }
        }

        self.consumed = remaining;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.working = blank(&self.original, &self.consumed);
    }

    /// Count of the body's non-whitespace bytes not yet consumed. Every
    /// accepted match must make this smaller.
    pub fn remaining(&self) -> usize {
        self.working[HEAD.len()..self.working.len() - TAIL.len()]
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .count()
    }

    /// Translate an offset within the framed text to one within the source
    /// file.
    pub fn to_file(&self, local: usize) -> usize {
        let body = local
            .saturating_sub(HEAD.len())
            .min(
                self.body()
                    .len(),
            );
        self.origin + body
    }

    pub fn to_file_span(&self, span: &Range<usize>) -> Range<usize> {
        self.to_file(span.start)..self.to_file(span.end)
    }

    /// Translate an offset within the source file to one within the framed
    /// text.
    pub fn to_local(&self, file: usize) -> usize {
        file.saturating_sub(self.origin) + HEAD.len()
    }
}
