//! Scanning primitives over Nextflow source text. Everything here is a pure
//! function of a text and offsets into it.
//!
//! Offsets are byte offsets. The delimiters that matter are all ASCII so the
//! scanning is done over bytes; any offset handed back sits on an ASCII
//! character (or the end of the text) and is therefore a char boundary.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanError {
    /// An opening delimiter was never closed.
    Unbalanced(char),
    /// Ran out of text looking for the edge of a statement.
    Unterminated,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Quote {
    #[default]
    Closed,
    Single,
    Double,
    TripleSingle,
    TripleDouble,
}

/// Running nesting state of a forward scan.
#[derive(Debug, Default, Clone, Copy)]
struct Depth {
    curly: i32,
    paren: i32,
    bracket: i32,
    quote: Quote,
}

impl Depth {
    fn quoted(&self) -> bool {
        self.quote != Quote::Closed
    }

    fn level(&self) -> bool {
        self.curly == 0 && self.paren == 0 && self.bracket == 0
    }

    fn negative(&self) -> bool {
        self.curly < 0 || self.paren < 0 || self.bracket < 0
    }

    /// Advance over the character at `i`, returning how many bytes it took.
    fn step(&mut self, bytes: &[u8], i: usize) -> usize {
        let b = bytes[i];
        match self.quote {
            Quote::TripleSingle => {
                if starts(bytes, i, b"'''") {
                    self.quote = Quote::Closed;
                    return 3;
                }
            }
            Quote::TripleDouble => {
                if starts(bytes, i, b"\"\"\"") {
                    self.quote = Quote::Closed;
                    return 3;
                }
            }
            Quote::Single => {
                if b == b'\'' && !escaped(bytes, i) {
                    self.quote = Quote::Closed;
                }
            }
            Quote::Double => {
                if b == b'"' && !escaped(bytes, i) {
                    self.quote = Quote::Closed;
                }
            }
            Quote::Closed => {
                if starts(bytes, i, b"'''") {
                    self.quote = Quote::TripleSingle;
                    return 3;
                }
                if starts(bytes, i, b"\"\"\"") {
                    self.quote = Quote::TripleDouble;
                    return 3;
                }
                match b {
                    b'\'' if !escaped(bytes, i) => self.quote = Quote::Single,
                    b'"' if !escaped(bytes, i) => self.quote = Quote::Double,
                    b'{' => self.curly += 1,
                    b'}' => self.curly -= 1,
                    b'(' => self.paren += 1,
                    b')' => self.paren -= 1,
                    b'[' => self.bracket += 1,
                    b']' => self.bracket -= 1,
                    _ => {}
                }
            }
        }
        1
    }
}

fn starts(bytes: &[u8], i: usize, pattern: &[u8]) -> bool {
    bytes[i..].starts_with(pattern)
}

/// An odd number of backslashes immediately before `i` escapes it.
fn escaped(bytes: &[u8], i: usize) -> bool {
    bytes[..i]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}

fn measure(bytes: &[u8]) -> Depth {
    let mut depth = Depth::default();
    let mut i = 0;
    while i < bytes.len() {
        i += depth.step(bytes, i);
    }
    depth
}

/// Net count of `{` less `}` over the text, ignoring string literals.
pub fn curly_depth(text: &str) -> i32 {
    measure(text.as_bytes()).curly
}

/// Net count of `(` less `)` over the text, ignoring string literals.
pub fn paren_depth(text: &str) -> i32 {
    measure(text.as_bytes()).paren
}

/// Per-byte facts about a text gathered in a single forward pass: whether
/// each byte belongs to a string literal (delimiters included) and the
/// parenthesis depth in force before it.
pub(crate) struct Profile {
    quoted: Vec<bool>,
    parens: Vec<i32>,
}

impl Profile {
    pub(crate) fn new(text: &str) -> Profile {
        let bytes = text.as_bytes();
        let mut quoted = vec![false; bytes.len()];
        let mut parens = vec![0; bytes.len() + 1];
        let mut depth = Depth::default();

        let mut i = 0;
        while i < bytes.len() {
            let before = depth.quoted();
            let level = depth.paren;
            let width = depth.step(bytes, i);
            let after = depth.quoted();

            let end = (i + width).min(bytes.len());
            for j in i..end {
                quoted[j] = before || after;
                parens[j] = level;
            }
            i = end;
        }
        parens[bytes.len()] = depth.paren;

        Profile { quoted, parens }
    }

    pub(crate) fn quoted(&self, i: usize) -> bool {
        self.quoted
            .get(i)
            .copied()
            .unwrap_or(false)
    }

    /// Parenthesis depth of everything before `i`.
    pub(crate) fn parens_before(&self, i: usize) -> i32 {
        let last = self.parens.len() - 1;
        self.parens[i.min(last)]
    }

    /// Net parenthesis depth of everything from `i` to the end.
    pub(crate) fn parens_after(&self, i: usize) -> i32 {
        let last = self.parens.len() - 1;
        self.parens[last] - self.parens[i.min(last)]
    }
}

/// Given the index just after an opening `{`, return the index one past
/// its matching `}`.
pub fn balanced_curly(text: &str, from: usize) -> Result<usize, ScanError> {
    balanced(text, from, b'{')
}

/// Given the index just after an opening `(`, return the index one past
/// its matching `)`.
pub fn balanced_paren(text: &str, from: usize) -> Result<usize, ScanError> {
    balanced(text, from, b'(')
}

fn balanced(text: &str, from: usize, open: u8) -> Result<usize, ScanError> {
    let bytes = text.as_bytes();
    let mut depth = Depth::default();

    let mut i = from;
    while i < bytes.len() {
        i += depth.step(bytes, i);
        if depth.quoted() {
            continue;
        }
        let level = match open {
            b'{' => depth.curly,
            _ => depth.paren,
        };
        if level < 0 {
            return Ok(i);
        }
    }

    Err(ScanError::Unbalanced(open as char))
}

/// Whether a string literal is open at the start of the span.
pub fn in_string_literal(text: &str, span: &Range<usize>) -> bool {
    let bytes = text.as_bytes();
    measure(&bytes[..span.start.min(bytes.len())]).quoted()
}

/// Whether the span sits within the parenthesised condition of an `if`,
/// that is the nearest preceding `if (` is still open at the span and is
/// closed somewhere after it.
pub fn in_if_condition(text: &str, span: &Range<usize>) -> bool {
    let bytes = text.as_bytes();
    let start = span.start.min(bytes.len());
    let end = span.end.min(bytes.len());

    let found = match regex!(r"\bif\s*\(")
        .find_iter(&text[..start])
        .last()
    {
        Some(found) => found,
        None => return false,
    };

    if measure(&bytes[..found.start()]).paren != 0 {
        return false;
    }
    let opened = measure(&bytes[found.start()..start]).paren;
    if opened <= 0 {
        return false;
    }

    let rest = &bytes[end..];
    let mut depth = Depth::default();
    let mut i = 0;
    while i < rest.len() {
        i += depth.step(rest, i);
        if !depth.quoted() && depth.paren == -opened {
            return measure(&rest[i..]).paren == 0;
        }
    }

    false
}

/// Find the first non-whitespace byte at or after `from`.
pub(crate) fn next_significant(bytes: &[u8], from: usize) -> Option<(usize, u8)> {
    bytes
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(i, &b)| (i, b))
}

/// Find the last non-whitespace byte before `before`.
pub(crate) fn previous_significant(bytes: &[u8], before: usize) -> Option<(usize, u8)> {
    bytes[..before.min(bytes.len())]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(i, &b)| (i, b))
}

/// A statement carries on past the newline at `i` if the next line opens
/// with a method call or a pipe, or if this line ends on a pipe, comma, or
/// equals sign.
fn continues(bytes: &[u8], i: usize) -> bool {
    matches!(next_significant(bytes, i + 1), Some((_, b'.' | b'|')))
        || matches!(
            previous_significant(bytes, i),
            Some((_, b'|' | b',' | b'='))
        )
}

/// Scan forward from `from` to where the statement running through it
/// ends: a `;` or an unconnected newline at the starting depth, or the
/// closing delimiter of an enclosing block (which is not included).
pub fn end_of_operation(text: &str, from: usize) -> Result<usize, ScanError> {
    let bytes = text.as_bytes();
    let mut depth = Depth::default();

    let mut i = from;
    while i < bytes.len() {
        if !depth.quoted() && depth.level() {
            match bytes[i] {
                b';' => return Ok(i),
                b'\n' if !continues(bytes, i) => return Ok(i),
                _ => {}
            }
        }
        let width = depth.step(bytes, i);
        if !depth.quoted() && depth.negative() {
            return Ok(i);
        }
        i += width;
    }

    Err(ScanError::Unterminated)
}

/// A newline at `i` begins a new statement if the next line starts with an
/// identifier or a parenthesis and this line doesn't leave an expression
/// dangling.
fn begins_statement(bytes: &[u8], i: usize) -> bool {
    let next = next_significant(bytes, i + 1).map(|(_, b)| b);
    let previous = previous_significant(bytes, i).map(|(_, b)| b);

    matches!(next, Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'(')
        && !matches!(previous, Some(b'(' | b'[' | b',' | b'.' | b'|' | b'='))
}

fn statement_start(bytes: &[u8], profile: &Profile, from: usize) -> Result<usize, ScanError> {
    let mut nesting = 0usize;

    let mut i = from.min(bytes.len());
    while i > 0 {
        i -= 1;
        if profile.quoted(i) {
            continue;
        }
        match bytes[i] {
            b')' | b'}' | b']' => nesting += 1,
            b'(' | b'{' | b'[' => {
                if nesting == 0 {
                    return Ok(i + 1);
                }
                nesting -= 1;
            }
            b';' if nesting == 0 => return Ok(i + 1),
            b'\n' if nesting == 0 && begins_statement(bytes, i) => return Ok(i + 1),
            _ => {}
        }
    }

    Err(ScanError::Unterminated)
}

/// Given a match somewhere in the middle of a statement, walk left to where
/// that statement begins and right to where it ends.
pub fn executor_around(text: &str, start: usize, end: usize) -> Result<Range<usize>, ScanError> {
    let profile = Profile::new(text);
    executor_around_with(text, &profile, start, end)
}

pub(crate) fn executor_around_with(
    text: &str,
    profile: &Profile,
    start: usize,
    end: usize,
) -> Result<Range<usize>, ScanError> {
    let begin = statement_start(text.as_bytes(), profile, start)?;
    let finish = end_of_operation(text, end)?;
    Ok(trim(text, begin..finish))
}

/// Extend a span forward through the rest of a pipe chain, along with any
/// closure or argument list opened on the same line.
pub fn expand_pipe(text: &str, span: Range<usize>) -> Result<Range<usize>, ScanError> {
    let bytes = text.as_bytes();
    let mut span = span;

    loop {
        let extends = match next_significant(bytes, span.end) {
            Some((i, b'|')) => bytes.get(i + 1) != Some(&b'|'),
            Some((i, b'{' | b'(')) => !bytes[span.end..i].contains(&b'\n'),
            _ => false,
        };
        if !extends {
            return Ok(span);
        }

        let end = end_of_operation(text, span.end)?;
        let widened = trim(text, span.start..end);
        if widened.end <= span.end {
            return Ok(span);
        }
        span = widened;
    }
}

/// Drop a dangling trailing `|` from the span and, if a pipe chain follows
/// the span, extend through it.
pub fn extend_through_pipes(text: &str, span: Range<usize>) -> Result<Range<usize>, ScanError> {
    let bytes = text.as_bytes();
    let mut span = trim(text, span);

    if span.end > span.start
        && bytes[span.end - 1] == b'|'
        && !(span.end - span.start >= 2 && bytes[span.end - 2] == b'|')
    {
        span = trim(text, span.start..span.end - 1);
    }

    if regex!(r"^\s*\|\s*\w").is_match(&text[span.end..]) {
        expand_pipe(text, span)
    } else {
        Ok(span)
    }
}

/// Widen a call `foo(...)` to take in a method chain hanging off it, such
/// as `.set { ch }`.
pub fn expand_call_to_operation(text: &str, span: Range<usize>) -> Result<Range<usize>, ScanError> {
    match next_significant(text.as_bytes(), span.end) {
        Some((_, b'.')) => {
            let end = end_of_operation(text, span.end)?;
            let widened = trim(text, span.start..end);
            if widened.end > span.end {
                Ok(widened)
            } else {
                Ok(span)
            }
        }
        _ => Ok(span),
    }
}

/// Offsets of every `|` at the top level of the text, skipping those that
/// are half of a `||`.
pub fn pipe_positions(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut depth = Depth::default();
    let mut found = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'|' && !depth.quoted() && depth.level() {
            let doubled = bytes.get(i + 1) == Some(&b'|') || (i > 0 && bytes[i - 1] == b'|');
            if !doubled {
                found.push(i);
            }
        }
        i += depth.step(bytes, i);
    }

    found
}

/// Walk left from `from` to the innermost delimiter still open there.
pub(crate) fn enclosing_opener(bytes: &[u8], profile: &Profile, from: usize) -> Option<usize> {
    let mut nesting = 0usize;

    let mut i = from.min(bytes.len());
    while i > 0 {
        i -= 1;
        if profile.quoted(i) {
            continue;
        }
        match bytes[i] {
            b')' | b'}' | b']' => nesting += 1,
            b'(' | b'{' | b'[' => {
                if nesting == 0 {
                    return Some(i);
                }
                nesting -= 1;
            }
            _ => {}
        }
    }

    None
}

/// Whether `from` lies in the body of a closure rather than at the top
/// level or within the block of a control statement.
pub(crate) fn in_closure(text: &str, profile: &Profile, from: usize) -> bool {
    let bytes = text.as_bytes();
    match enclosing_opener(bytes, profile, from) {
        Some(i) if bytes[i] == b'{' => !is_control_block(text, profile, i),
        _ => false,
    }
}

fn is_control_block(text: &str, profile: &Profile, brace: usize) -> bool {
    let bytes = text.as_bytes();

    match previous_significant(bytes, brace) {
        Some((close, b')')) => match enclosing_opener(bytes, profile, close) {
            Some(open) => matches!(
                trailing_word(text, open),
                "if" | "for" | "while" | "switch" | "catch"
            ),
            None => false,
        },
        Some((last, _)) => matches!(
            trailing_word(text, last + 1),
            "else" | "try" | "finally" | "do"
        ),
        None => false,
    }
}

fn trailing_word(text: &str, end: usize) -> &str {
    let bytes = text.as_bytes();

    let mut end = end;
    while end > 0 && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && (bytes[start - 1].is_ascii_alphanumeric() || bytes[start - 1] == b'_') {
        start -= 1;
    }

    &text[start..end]
}

/// Narrow a span to exclude leading and trailing whitespace.
pub fn trim(text: &str, span: Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();
    let mut start = span
        .start
        .min(bytes.len());
    let mut end = span
        .end
        .min(bytes.len());

    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }

    start..end
}

/// Up to ten characters either side of a span, for use in diagnostics.
pub(crate) fn window(text: &str, start: usize, end: usize) -> &str {
    let mut from = start
        .saturating_sub(10)
        .min(text.len());
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + 10).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from.min(to)..to]
}

/// Replace the characters covered by `ranges` with spaces, keeping newlines
/// so that line numbers and byte offsets are unchanged. The ranges must be
/// sorted.
pub(crate) fn blank(text: &str, ranges: &[Range<usize>]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut ranges = ranges.iter().peekable();

    for (i, c) in text.char_indices() {
        while let Some(range) = ranges.peek() {
            if range.end <= i {
                ranges.next();
            } else {
                break;
            }
        }
        let hidden = match ranges.peek() {
            Some(range) => range.start <= i,
            None => false,
        };

        if hidden && c != '\n' {
            for _ in 0..c.len_utf8() {
                result.push(' ');
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Blank out `//` and `/* */` comments.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut hidden = Vec::new();
    let mut depth = Depth::default();

    let mut i = 0;
    while i < bytes.len() {
        if !depth.quoted() {
            if starts(bytes, i, b"//") && !escaped(bytes, i) {
                let end = find(bytes, i, b"\n").unwrap_or(bytes.len());
                hidden.push(i..end);
                i = end;
                continue;
            }
            if starts(bytes, i, b"/*") {
                let end = find(bytes, i + 2, b"*/")
                    .map(|j| j + 2)
                    .unwrap_or(bytes.len());
                hidden.push(i..end);
                i = end;
                continue;
            }
        }
        i += depth.step(bytes, i);
    }

    blank(text, &hidden)
}

fn find(bytes: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    bytes[from.min(bytes.len())..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|j| from + j)
}
