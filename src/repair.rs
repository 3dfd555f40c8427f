//! Post-conversion repair pass
//!
//! Some dependencies are injection tokens rather than classes (`DOCUMENT`,
//! `PLATFORM_ID`). After conversion they show up as `private doc: DOCUMENT`,
//! which does not type-check; they need `@Inject(DOCUMENT) private doc:
//! Document` instead. This pass rewrites those parameters, makes sure the
//! annotation is imported, and drops a lookup import that nothing calls.

use crate::config::Config;
use crate::engine::rewrite::{import_symbols, line_ending, remove_unused_import, render_import};
use crate::error::EngineResult;
use regex::{Captures, Regex};
use serde::Serialize;

#[derive(Debug, Clone)]
struct TokenRule {
    token: String,
    type_name: String,
    param: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepairOutcome {
    Repaired { params: usize, import_cleaned: bool },
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct Repair {
    pub text: String,
    pub outcome: RepairOutcome,
}

#[derive(Debug, Clone)]
pub struct Repairer {
    rules: Vec<TokenRule>,
    annotation: String,
    lookup_call: String,
    import_source: String,
    lookup_use: Regex,
    import_stmt: Regex,
    first_import: Regex,
}

impl Repairer {
    pub fn new(config: &Config) -> EngineResult<Self> {
        let rules = config
            .special_tokens
            .iter()
            .map(|(token, type_name)| {
                let param = Regex::new(&format!(
                    r"((?:private|protected|public)\s+(?:readonly\s+)?\w+)\s*:\s*{}\b",
                    regex::escape(token)
                ))?;
                Ok(TokenRule {
                    token: token.clone(),
                    type_name: type_name.clone(),
                    param,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self {
            rules,
            annotation: config.annotation.clone(),
            lookup_call: config.lookup_call.clone(),
            import_source: config.import_source.clone(),
            lookup_use: Regex::new(&format!(r"\b{}\s*\(", regex::escape(&config.lookup_call)))?,
            import_stmt: Regex::new(&crate::engine::rewrite::import_pattern(&config.import_source))?,
            first_import: Regex::new(r"(?m)^import\b")?,
        })
    }

    pub fn repair(&self, text: &str) -> Repair {
        let mut content = text.to_string();
        let mut params = 0;

        for rule in &self.rules {
            let replaced = rule.param.replace_all(&content, |caps: &Captures| {
                params += 1;
                format!(
                    "@{}({}) {}: {}",
                    self.annotation, rule.token, &caps[1], rule.type_name
                )
            });
            content = replaced.into_owned();
        }

        if params > 0 {
            content = self.ensure_annotation_import(&content);
        }

        let before_cleanup = content.len();
        content = remove_unused_import(
            &content,
            &self.lookup_call,
            &self.import_source,
            &self.lookup_use,
            &self.import_stmt,
        );
        let import_cleaned = content.len() != before_cleanup;

        let outcome = if content == text {
            RepairOutcome::Unchanged
        } else {
            RepairOutcome::Repaired {
                params,
                import_cleaned,
            }
        };
        Repair {
            text: content,
            outcome,
        }
    }

    /// Add the annotation to the core import, keeping the symbol list sorted.
    fn ensure_annotation_import(&self, text: &str) -> String {
        if !self.import_stmt.is_match(text) {
            let line = format!(
                "import {{ {} }} from '{}';{}",
                self.annotation,
                self.import_source,
                line_ending(text)
            );
            let at = self.first_import.find(text).map(|m| m.start()).unwrap_or(0);
            let mut out = String::with_capacity(text.len() + line.len());
            out.push_str(&text[..at]);
            out.push_str(&line);
            out.push_str(&text[at..]);
            return out;
        }

        let mut done = false;
        self.import_stmt
            .replace_all(text, |caps: &Captures| {
                let mut symbols = import_symbols(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
                if done || symbols.iter().any(|s| s == &self.annotation) {
                    done = true;
                    return caps[0].to_string();
                }
                let at = symbols
                    .iter()
                    .position(|s| s.as_str() > self.annotation.as_str())
                    .unwrap_or(symbols.len());
                symbols.insert(at, self.annotation.clone());
                done = true;
                render_import(caps, &self.import_source, &symbols)
            })
            .into_owned()
    }
}
