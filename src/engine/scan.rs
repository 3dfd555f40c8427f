//! Class boundary detection by brace counting over the masked source.

use super::mask::MaskedSource;
use regex::Regex;

/// Lines searched for the opening brace, starting at the declaration line.
const OPEN_BRACE_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRange {
    pub name: String,
    pub decl_line: usize,
    pub open_line: usize,
    pub close_line: usize,
}

impl ClassRange {
    /// Lines strictly between the opening and closing brace lines.
    pub fn body_lines(&self) -> std::ops::Range<usize> {
        (self.open_line + 1)..self.close_line.max(self.open_line + 1)
    }
}

/// Find every top-level class declaration with a resolvable body, in source order.
///
/// Declarations without an opening brace in the window, or whose braces never
/// balance, are dropped without affecting the others.
pub fn find_classes(masked: &MaskedSource, class_decl: &Regex) -> Vec<ClassRange> {
    let mut classes = Vec::new();

    for decl_line in 0..masked.len() {
        let Some(caps) = class_decl.captures(masked.line(decl_line)) else {
            continue;
        };
        let name = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let window_end = (decl_line + OPEN_BRACE_WINDOW).min(masked.len());
        let Some(open_line) = (decl_line..window_end).find(|&j| masked.line(j).contains('{')) else {
            tracing::debug!(class = %name, line = decl_line + 1, "no opening brace near class declaration");
            continue;
        };

        match find_close_line(masked, open_line) {
            Some(close_line) => classes.push(ClassRange {
                name,
                decl_line,
                open_line,
                close_line,
            }),
            None => {
                tracing::debug!(class = %name, line = decl_line + 1, "class body never closes");
            }
        }
    }

    classes
}

/// First line, starting at `open_line`, where the running brace count is zero.
fn find_close_line(masked: &MaskedSource, open_line: usize) -> Option<usize> {
    let mut depth = 0i64;
    for j in open_line..masked.len() {
        depth += masked.brace_delta(j);
        if depth == 0 {
            return Some(j);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Patterns;

    fn classes_of(src: &str) -> Vec<ClassRange> {
        let patterns = Patterns::new(&crate::config::Config::default()).unwrap();
        find_classes(&MaskedSource::new(src), &patterns.class_decl)
    }

    #[test]
    fn finds_multiple_classes_in_order() {
        let src = "\
@Directive({ selector: '[a]' })
export class A {
  x = 1;
}

export abstract class B
  extends Base
{
  m() {
    if (x) { }
  }
}
";
        let classes = classes_of(src);
        assert_eq!(classes.len(), 2);
        assert_eq!(
            classes[0],
            ClassRange {
                name: "A".to_string(),
                decl_line: 1,
                open_line: 1,
                close_line: 3
            }
        );
        assert_eq!(classes[1].name, "B");
        assert_eq!(classes[1].open_line, 7);
        assert_eq!(classes[1].close_line, 11);
    }

    #[test]
    fn braces_in_literals_do_not_end_class() {
        let src = "\
export class A {
  label = '}';
  // closing } here is a comment
  tpl = `${'{'}`;
}
";
        let classes = classes_of(src);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].close_line, 4);
    }

    #[test]
    fn unclosed_class_is_dropped_but_others_survive() {
        let src = "\
export class Good {
}
export class Broken {
  m() {
";
        let classes = classes_of(src);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Good");
    }

    #[test]
    fn brace_on_last_window_line_is_accepted() {
        let src = "export class Near\n  extends Base<\n    Item\n  >\n{\n}\n";
        let classes = classes_of(src);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].decl_line, 0);
        assert_eq!(classes[0].open_line, 4);
        assert_eq!(classes[0].close_line, 5);
    }

    #[test]
    fn declaration_without_nearby_brace_is_skipped() {
        let src = "export class Far\n\n\n\n\n\n{\n}\n";
        assert!(classes_of(src).is_empty());
    }

    #[test]
    fn empty_single_line_class() {
        let classes = classes_of("export class Empty {}\n");
        assert_eq!(classes[0].open_line, 0);
        assert_eq!(classes[0].close_line, 0);
        assert!(classes[0].body_lines().is_empty());
    }
}
