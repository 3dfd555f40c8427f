//! Structural view of a source file.
//!
//! Blanks out the contents of comments, string literals and template
//! literals so brace counting only ever sees structural delimiters. Every
//! masked byte becomes a space and line breaks (`\n` and `\r`) are kept, so
//! line indices and byte offsets line up with the original text.
//!
//! Regular expression literals are not recognized; a `{` inside `/a{2}/`
//! still counts.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    SingleQuoted,
    DoubleQuoted,
    Template,
}

/// Mask a whole text. The result has exactly the same byte length.
pub fn mask(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    // Brace depth inside each open `${ ... }` interpolation, innermost last.
    let mut interpolations: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            State::Code => match b {
                b'/' if next == Some(b'/') => {
                    out.extend_from_slice(b"//");
                    i += 2;
                    state = State::LineComment;
                    continue;
                }
                b'/' if next == Some(b'*') => {
                    out.extend_from_slice(b"/*");
                    i += 2;
                    state = State::BlockComment;
                    continue;
                }
                b'\'' => {
                    out.push(b);
                    state = State::SingleQuoted;
                }
                b'"' => {
                    out.push(b);
                    state = State::DoubleQuoted;
                }
                b'`' => {
                    out.push(b);
                    state = State::Template;
                }
                b'{' => {
                    if let Some(depth) = interpolations.last_mut() {
                        *depth += 1;
                    }
                    out.push(b);
                }
                b'}' => match interpolations.last_mut() {
                    Some(0) => {
                        interpolations.pop();
                        out.push(b' ');
                        state = State::Template;
                    }
                    Some(depth) => {
                        *depth -= 1;
                        out.push(b);
                    }
                    None => out.push(b),
                },
                _ => out.push(b),
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                }
                out.push(blank(b));
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    out.extend_from_slice(b"*/");
                    i += 2;
                    state = State::Code;
                    continue;
                }
                out.push(blank(b));
            }
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if state == State::SingleQuoted { b'\'' } else { b'"' };
                if b == b'\\' {
                    out.push(b' ');
                    if let Some(escaped) = next {
                        out.push(blank(escaped));
                        i += 2;
                    } else {
                        i += 1;
                    }
                    continue;
                }
                if b == quote {
                    out.push(b);
                    state = State::Code;
                } else if b == b'\n' {
                    // Unterminated literal; recover at the line break.
                    out.push(b);
                    state = State::Code;
                } else {
                    out.push(blank(b));
                }
            }
            State::Template => {
                if b == b'\\' {
                    out.push(b' ');
                    if let Some(escaped) = next {
                        out.push(blank(escaped));
                        i += 2;
                    } else {
                        i += 1;
                    }
                    continue;
                }
                if b == b'`' {
                    out.push(b);
                    state = State::Code;
                } else if b == b'$' && next == Some(b'{') {
                    out.extend_from_slice(b"  ");
                    interpolations.push(0);
                    i += 2;
                    state = State::Code;
                    continue;
                } else {
                    out.push(blank(b));
                }
            }
        }
        i += 1;
    }

    // States only change on ASCII bytes, so every byte of a multibyte
    // character is either kept or blanked along with the rest of it and the
    // buffer is still valid UTF-8.
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

fn blank(b: u8) -> u8 {
    match b {
        b'\n' | b'\r' => b,
        _ => b' ',
    }
}

/// Masked copy of a file, split into the same lines as the original with any
/// trailing `\r` removed.
#[derive(Debug, Clone)]
pub struct MaskedSource {
    lines: Vec<String>,
}

impl MaskedSource {
    pub fn new(text: &str) -> Self {
        Self {
            lines: mask(text)
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect(),
        }
    }

    pub fn line(&self, idx: usize) -> &str {
        self.lines.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join lines `start..=end` with `\n`, mirroring the original text layout.
    pub fn join(&self, start: usize, end: usize) -> String {
        let end = end.min(self.lines.len().saturating_sub(1));
        if start > end {
            return String::new();
        }
        self.lines[start..=end].join("\n")
    }

    /// Net brace count of one line.
    pub fn brace_delta(&self, idx: usize) -> i64 {
        brace_delta(self.line(idx))
    }

    /// Brace depth at the start of every line, relative to the top of file.
    pub fn depth_before_lines(&self) -> Vec<i64> {
        let mut depths = Vec::with_capacity(self.lines.len());
        let mut depth = 0i64;
        for line in &self.lines {
            depths.push(depth);
            depth += brace_delta(line);
        }
        depths
    }
}

pub fn brace_delta(line: &str) -> i64 {
    line.bytes().fold(0i64, |acc, b| match b {
        b'{' => acc + 1,
        b'}' => acc - 1,
        _ => acc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_length_and_lines() {
        let src = "const a = '{';\n// }\nlet b = \"é}\";\n";
        let masked = mask(src);
        assert_eq!(masked.len(), src.len());
        assert_eq!(masked.matches('\n').count(), src.matches('\n').count());
        assert!(!masked.contains('{'));
        assert!(!masked.contains('}'));
    }

    #[test]
    fn block_comment_spans_lines() {
        let src = "a /* {\n } */ b {";
        assert_eq!(mask(src), "a /*  \n   */ b {");
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let src = r#"x = 'it\'s {'; y {"#;
        let masked = mask(src);
        assert_eq!(brace_delta(&masked), 1);
        assert!(masked.ends_with("y {"));
    }

    #[test]
    fn template_interpolation_is_code() {
        let src = "t = `a { ${ fn({ k: 1 }) } }`; {";
        let masked = mask(src);
        // The object literal inside the interpolation is balanced, the template
        // text braces are masked, the trailing block brace survives.
        assert_eq!(brace_delta(&masked), 1);
        assert!(masked.contains("fn({ k: 1 })"));
    }

    #[test]
    fn nested_template_inside_interpolation() {
        let src = "`${ `}` }` {";
        assert_eq!(brace_delta(&mask(src)), 1);
    }

    #[test]
    fn carriage_returns_survive_masking() {
        let src = "a = '{\r\n// }\r\nb {\r\n";
        let masked = mask(src);
        assert_eq!(masked.matches("\r\n").count(), 3);

        let lines = MaskedSource::new(src);
        assert_eq!(lines.line(2), "b {");
        assert_eq!(lines.depth_before_lines(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn depth_before_lines_tracks_blocks() {
        let masked = MaskedSource::new("class A {\n  x = '}';\n  m() {\n  }\n}\n");
        assert_eq!(masked.depth_before_lines(), vec![0, 1, 1, 2, 1, 0]);
    }
}
