//! Replacement constructor rendering.

use crate::error::{EngineError, EngineResult};
use std::collections::HashSet;

const PARAM_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Render the merged constructor.
///
/// Derived parameters come first so they are bound before any field
/// initializer that might read them. The body is reattached verbatim.
pub fn build_constructor(
    derived: &[String],
    existing: &[String],
    body: &[String],
    indent: &str,
) -> String {
    let params: Vec<&str> = derived
        .iter()
        .chain(existing.iter())
        .map(String::as_str)
        .collect();

    if params.is_empty() && body.is_empty() {
        return format!("{}constructor() {{ }}", indent);
    }
    if params.len() == 1 && body.is_empty() {
        return format!("{}constructor({}) {{ }}", indent, params[0]);
    }

    let param_indent = format!("{}  ", indent);
    let last = params.len().saturating_sub(1);
    let params_block = params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let comma = if i < last { "," } else { "" };
            format!("{}{}{}", param_indent, p, comma)
        })
        .collect::<Vec<_>>()
        .join("\n");

    if body.is_empty() {
        format!("{indent}constructor(\n{params_block}\n{indent}) {{ }}")
    } else {
        let body_block = body.join("\n");
        format!("{indent}constructor(\n{params_block}\n{indent}) {{\n{body_block}\n{indent}}}")
    }
}

/// Binding name of a raw parameter fragment.
///
/// Strips decorators, modifiers, `...` and optional markers. Destructured
/// parameters have no single name and yield `None`.
pub fn param_name(fragment: &str) -> Option<String> {
    let mut rest = fragment.trim_start();

    while let Some(after_at) = rest.strip_prefix('@') {
        rest = skip_decorator(after_at)?.trim_start();
    }

    loop {
        let word_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        let word = &rest[..word_end];
        let is_modifier = PARAM_MODIFIERS.contains(&word)
            && rest[word_end..].starts_with(|c: char| c.is_whitespace());
        if !is_modifier {
            break;
        }
        rest = rest[word_end..].trim_start();
    }

    let rest = rest.strip_prefix("...").unwrap_or(rest);
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Skip `Name(args)` or `Name` after a decorator's `@`.
fn skip_decorator(s: &str) -> Option<&str> {
    let name_end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'))
        .unwrap_or(s.len());
    let rest = &s[name_end..];
    if !rest.starts_with('(') {
        return Some(rest);
    }
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[i + 1..]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reject merges that would bind the same name twice.
pub fn check_collisions(class: &str, derived: &[String], existing: &[String]) -> EngineResult<()> {
    let mut seen = HashSet::new();
    for name in derived.iter().chain(existing.iter()).filter_map(|p| param_name(p)) {
        if !seen.insert(name.clone()) {
            return Err(EngineError::NameCollision {
                class: class.to_string(),
                name,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_constructor_is_single_line() {
        assert_eq!(build_constructor(&[], &[], &[], "  "), "  constructor() { }");
    }

    #[test]
    fn single_param_without_body_is_single_line() {
        assert_eq!(
            build_constructor(&strings(&["public a: A"]), &[], &[], "  "),
            "  constructor(public a: A) { }"
        );
    }

    #[test]
    fn derived_params_precede_existing() {
        let out = build_constructor(
            &strings(&["private a: A", "public b: B"]),
            &strings(&["c: C"]),
            &strings(&["    this.d = 1;"]),
            "  ",
        );
        assert_eq!(
            out,
            "  constructor(\n    private a: A,\n    public b: B,\n    c: C\n  ) {\n    this.d = 1;\n  }"
        );
    }

    #[test]
    fn single_param_with_body_is_multiline() {
        let out = build_constructor(&strings(&["public a: A"]), &[], &strings(&["    go();"]), "  ");
        assert_eq!(out, "  constructor(\n    public a: A\n  ) {\n    go();\n  }");
    }

    #[test]
    fn two_params_without_body() {
        let out = build_constructor(&strings(&["public a: A"]), &strings(&["b: B"]), &[], "\t");
        assert_eq!(out, "\tconstructor(\n\t  public a: A,\n\t  b: B\n\t) { }");
    }

    #[test]
    fn param_names() {
        assert_eq!(param_name("private readonly http: HttpClient").as_deref(), Some("http"));
        assert_eq!(param_name("@Inject(DOCUMENT) private doc: Document").as_deref(), Some("doc"));
        assert_eq!(param_name("@Optional() @Self() svc?: Svc").as_deref(), Some("svc"));
        assert_eq!(param_name("...rest: string[]").as_deref(), Some("rest"));
        assert_eq!(param_name("readonly: boolean").as_deref(), Some("readonly"));
        assert_eq!(param_name("{ a, b }: Opts"), None);
    }

    #[test]
    fn collision_is_an_error() {
        let err = check_collisions(
            "Widget",
            &strings(&["private http: HttpClient"]),
            &strings(&["@Optional() http: HttpClient"]),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::NameCollision { ref name, .. } if name == "http"));
        assert!(check_collisions("Widget", &strings(&["public a: A"]), &strings(&["b: B"])).is_ok());
    }
}
