//! Whole-file reconstruction and import cleanup.

use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};

/// Line-level edits collected for one file before anything is applied.
#[derive(Debug, Clone, Default)]
pub struct RewritePlan {
    deletions: BTreeSet<usize>,
    replacements: BTreeMap<usize, String>,
}

impl RewritePlan {
    /// Drop a line. A line that already has a replacement stays replaced.
    pub fn delete(&mut self, line: usize) {
        if !self.replacements.contains_key(&line) {
            self.deletions.insert(line);
        }
    }

    /// Replace a line with (possibly multi-line) text.
    pub fn replace(&mut self, line: usize, text: String) {
        self.deletions.remove(&line);
        self.replacements.insert(line, text);
    }

    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.replacements.is_empty()
    }

    /// Rebuild the text from `lines` (without line terminators), joining with `eol`.
    pub fn apply(&self, lines: &[&str], eol: &str) -> String {
        let mut out: Vec<&str> = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if let Some(replacement) = self.replacements.get(&i) {
                out.extend(replacement.split('\n'));
            } else if !self.deletions.contains(&i) {
                out.push(line);
            }
        }
        out.join(eol)
    }
}

/// `"\r\n"` when the first line break is CRLF, otherwise `"\n"`.
pub fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// Regex source for a named-import statement from `source`.
///
/// Groups: 1 leading indent, 2 symbol list, 3 quote, 4 optional `;`, 5 line break.
pub fn import_pattern(source: &str) -> String {
    format!(
        r#"(?m)^([ \t]*)import\s*\{{([^}}]*)\}}\s*from\s*(['"]){}['"][ \t]*(;?)[ \t]*(\r?\n)?"#,
        regex::escape(source)
    )
}

/// Symbols of an import list, in order, without surrounding whitespace.
pub fn import_symbols(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn render_import(caps: &Captures, source: &str, symbols: &[String]) -> String {
    let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let quote = caps.get(3).map(|m| m.as_str()).unwrap_or("'");
    let semi = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    let newline = caps.get(5).map(|m| m.as_str()).unwrap_or("");
    format!(
        "{indent}import {{ {} }} from {quote}{source}{quote}{semi}{newline}",
        symbols.join(", ")
    )
}

/// Drop `symbol` from imports of `source` when `still_used` no longer matches.
///
/// An import left without symbols is removed together with its line break.
pub fn remove_unused_import(
    text: &str,
    symbol: &str,
    source: &str,
    still_used: &Regex,
    import_re: &Regex,
) -> String {
    if still_used.is_match(text) {
        return text.to_string();
    }

    import_re
        .replace_all(text, |caps: &Captures| {
            let list = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let symbols = import_symbols(list);
            if !symbols.iter().any(|s| s == symbol) {
                return caps[0].to_string();
            }
            let remaining: Vec<String> = symbols.into_iter().filter(|s| s != symbol).collect();
            if remaining.is_empty() {
                String::new()
            } else {
                render_import(caps, source, &remaining)
            }
        })
        .into_owned()
}

/// Collapse runs of three or more line breaks to two `eol`s.
pub fn collapse_blank_lines(text: &str, blank_runs: &Regex, eol: &str) -> String {
    let pair = format!("{eol}{eol}");
    blank_runs
        .replace_all(text, regex::NoExpand(pair.as_str()))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import_re() -> Regex {
        Regex::new(&import_pattern("@angular/core")).unwrap()
    }

    fn used() -> Regex {
        Regex::new(r"\binject\s*\(").unwrap()
    }

    #[test]
    fn plan_applies_replacements_before_deletions() {
        let mut plan = RewritePlan::default();
        plan.delete(1);
        plan.replace(1, "  constructor(public a: A) { }".to_string());
        plan.delete(1);
        plan.delete(3);
        let lines = ["class X {", "  a = inject(A);", "  x = 1;", "  b = 2;", "}"];
        assert_eq!(
            plan.apply(&lines, "\n"),
            "class X {\n  constructor(public a: A) { }\n  x = 1;\n}"
        );
    }

    #[test]
    fn removes_symbol_and_keeps_others() {
        let text = "import { Component, inject, OnInit } from '@angular/core';\nclass X {}\n";
        let out = remove_unused_import(text, "inject", "@angular/core", &used(), &import_re());
        assert_eq!(out, "import { Component, OnInit } from '@angular/core';\nclass X {}\n");
    }

    #[test]
    fn removes_emptied_import_line() {
        let text = "import { inject } from \"@angular/core\";\nimport { A } from './a';\n";
        let out = remove_unused_import(text, "inject", "@angular/core", &used(), &import_re());
        assert_eq!(out, "import { A } from './a';\n");
    }

    #[test]
    fn multiline_import_is_rewritten() {
        let text = "import {\n  Component,\n  inject,\n} from '@angular/core';\n";
        let out = remove_unused_import(text, "inject", "@angular/core", &used(), &import_re());
        assert_eq!(out, "import { Component } from '@angular/core';\n");
    }

    #[test]
    fn import_kept_while_lookup_still_called() {
        let text = "import { inject } from '@angular/core';\nexport const g = () => inject(Router);\n";
        let out = remove_unused_import(text, "inject", "@angular/core", &used(), &import_re());
        assert_eq!(out, text);
    }

    #[test]
    fn other_sources_untouched() {
        let text = "import { inject } from '@other/di';\n";
        let out = remove_unused_import(text, "inject", "@angular/core", &used(), &import_re());
        assert_eq!(out, text);
    }

    #[test]
    fn plan_splits_replacements_on_crlf() {
        let mut plan = RewritePlan::default();
        plan.replace(1, "  constructor(\n    public a: A\n  ) { }".to_string());
        let lines = ["class X {", "  a = inject(A);", "}", ""];
        assert_eq!(
            plan.apply(&lines, "\r\n"),
            "class X {\r\n  constructor(\r\n    public a: A\r\n  ) { }\r\n}\r\n"
        );
    }

    #[test]
    fn line_ending_follows_first_break() {
        assert_eq!(line_ending("a\r\nb\n"), "\r\n");
        assert_eq!(line_ending("a\nb\r\n"), "\n");
        assert_eq!(line_ending("\nb"), "\n");
        assert_eq!(line_ending("single"), "\n");
    }

    #[test]
    fn blank_runs_collapse() {
        let runs = Regex::new(r"(?:\r?\n){3,}").unwrap();
        assert_eq!(
            collapse_blank_lines("a\n\n\n\nb\n\nc\n", &runs, "\n"),
            "a\n\nb\n\nc\n"
        );
        let once = collapse_blank_lines("a\n\n\nb", &runs, "\n");
        assert_eq!(collapse_blank_lines(&once, &runs, "\n"), once);
        assert_eq!(
            collapse_blank_lines("a\r\n\r\n\r\n\r\nb\r\n", &runs, "\r\n"),
            "a\r\n\r\nb\r\n"
        );
    }
}
