//! Existing constructor location and decomposition.
//!
//! Structure is always read from the masked view; text is always sliced from
//! the original lines at the same byte offsets.

use super::mask::MaskedSource;
use super::scan::ClassRange;
use crate::error::{EngineError, EngineResult};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructorRange {
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtorSearch {
    Absent,
    Found(ConstructorRange),
    /// A constructor starts at this line but its body never closes inside the class.
    Unterminated(usize),
}

/// Locate the class's constructor.
///
/// Only constructor-shaped lines at member depth count. More than one of
/// those (overload signatures, duplicate declarations) is rejected.
pub fn locate(
    masked: &MaskedSource,
    depths: &[i64],
    class: &ClassRange,
    ctor_re: &Regex,
) -> EngineResult<CtorSearch> {
    let member_depth = depths.get(class.open_line).copied().unwrap_or(0) + 1;
    let mut candidates = class
        .body_lines()
        .filter(|&i| depths.get(i).copied() == Some(member_depth))
        .filter(|&i| ctor_re.is_match(masked.line(i)));

    let Some(start_line) = candidates.next() else {
        return Ok(CtorSearch::Absent);
    };
    if let Some(second) = candidates.next() {
        return Err(EngineError::AmbiguousConstructor {
            class: class.name.clone(),
            first: start_line + 1,
            second: second + 1,
        });
    }

    // Braces inside the parameter list (object-literal defaults) are not the body.
    let mut parens = 0i64;
    let mut braces = 0i64;
    let mut opened = false;
    for j in start_line..=class.close_line {
        for b in masked.line(j).bytes() {
            match b {
                b'(' => parens += 1,
                b')' => parens -= 1,
                b'{' if parens == 0 => {
                    braces += 1;
                    opened = true;
                }
                b'}' if parens == 0 => braces -= 1,
                _ => {}
            }
        }
        if opened && braces == 0 {
            return Ok(CtorSearch::Found(ConstructorRange {
                start_line,
                end_line: j,
            }));
        }
    }

    Ok(CtorSearch::Unterminated(start_line))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorParts {
    pub params: Vec<String>,
    pub body: Vec<String>,
}

/// Split a constructor into its parameter fragments and body lines.
pub fn decompose(lines: &[&str], masked: &MaskedSource, range: ConstructorRange) -> ConstructorParts {
    let end = range.end_line.min(lines.len().saturating_sub(1));
    if range.start_line > end {
        return ConstructorParts::default();
    }
    let full = lines[range.start_line..=end].join("\n");
    let structure = masked.join(range.start_line, end);
    debug_assert_eq!(full.len(), structure.len());

    let param_span = matching_delimiter(structure.as_bytes(), 0, b'(', b')');
    let params = match param_span {
        Some((open, close)) => split_params(&full[open + 1..close], &structure[open + 1..close]),
        None => Vec::new(),
    };

    let body_from = param_span.map(|(_, close)| close + 1).unwrap_or(0);
    let body = matching_delimiter(structure.as_bytes(), body_from, b'{', b'}')
        .map(|(open, close)| body_lines(&full[open + 1..close]))
        .unwrap_or_default();

    ConstructorParts { params, body }
}

/// Byte offsets of the first `open` at or after `from` and its matching `close`.
fn matching_delimiter(bytes: &[u8], from: usize, open: u8, close: u8) -> Option<(usize, usize)> {
    let start = from + bytes.get(from..)?.iter().position(|&b| b == open)?;
    let mut depth = 0usize;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some((start, start + offset));
            }
        }
    }
    None
}

/// Split on commas outside `()`, `<>`, `[]` and `{}`.
///
/// A `>` that ends an `=>` arrow does not close anything.
fn split_params(text: &str, structure: &str) -> Vec<String> {
    let bytes = structure.as_bytes();
    let mut params = Vec::new();
    let mut depth = 0i64;
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'<' | b'[' | b'{' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b')' | b'>' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                push_param(&mut params, &text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_param(&mut params, &text[start..]);
    params
}

fn push_param(params: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        params.push(trimmed.to_string());
    }
}

fn body_lines(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.split('\n').collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].iter().map(|l| l.to_string()).collect(),
        _ => Vec::new(),
    }
}
