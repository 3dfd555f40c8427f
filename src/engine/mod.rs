//! inject() field → constructor parameter conversion
//!
//! One pass per file: find class bodies, collect their `x = inject(T);`
//! fields, merge them into the class constructor (creating one when absent)
//! and rebuild the text from a single line-level plan. Nothing is kept
//! between files.

pub mod ctor;
pub mod fields;
pub mod mask;
pub mod rewrite;
pub mod scan;
pub mod synth;

use crate::config::Config;
use crate::error::EngineResult;
use ctor::CtorSearch;
use mask::MaskedSource;
use regex::Regex;
use rewrite::RewritePlan;
use serde::Serialize;

/// Compiled recognizers for one configuration.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub class_decl: Regex,
    pub field: Regex,
    pub constructor: Regex,
    pub lookup_use: Regex,
    pub import_stmt: Regex,
    pub blank_runs: Regex,
}

impl Patterns {
    pub fn new(config: &Config) -> EngineResult<Self> {
        let lookup = regex::escape(&config.lookup_call);
        Ok(Self {
            class_decl: Regex::new(r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)")?,
            field: Regex::new(&fields::field_pattern(&config.lookup_call))?,
            constructor: Regex::new(r"^\s+constructor\s*\(")?,
            lookup_use: Regex::new(&format!(r"\b{}\s*\(", lookup))?,
            import_stmt: Regex::new(&rewrite::import_pattern(&config.import_source))?,
            blank_runs: Regex::new(r"(?:\r?\n){3,}")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoClasses,
    NoFields,
    /// Fields were found but every such class had an unbalanced constructor.
    Unbalanced,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoClasses => "No classes found",
            SkipReason::NoFields => "No inject fields in classes",
            SkipReason::Unbalanced => "Constructor braces never balance",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Converted { classes: usize, fields: usize },
    Skipped { reason: SkipReason },
}

impl FileOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub text: String,
    pub outcome: FileOutcome,
}

impl Conversion {
    fn skipped(text: &str, reason: SkipReason) -> Self {
        Self {
            text: text.to_string(),
            outcome: FileOutcome::Skipped { reason },
        }
    }
}

/// The conversion engine for one configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    patterns: Patterns,
}

impl Engine {
    pub fn new(config: Config) -> EngineResult<Self> {
        let patterns = Patterns::new(&config)?;
        Ok(Self { config, patterns })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Convert one file's text. Skipped files come back unchanged; converted
    /// files are written with the line ending of their first line break.
    pub fn convert(&self, text: &str) -> EngineResult<Conversion> {
        let eol = rewrite::line_ending(text);
        let lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let masked = MaskedSource::new(text);

        let classes = scan::find_classes(&masked, &self.patterns.class_decl);
        if classes.is_empty() {
            return Ok(Conversion::skipped(text, SkipReason::NoClasses));
        }

        let depths = masked.depth_before_lines();
        let mut plan = RewritePlan::default();
        let mut converted_classes = 0;
        let mut converted_fields = 0;
        let mut unbalanced = 0;

        for class in &classes {
            let found = fields::find_fields(&lines, &masked, &depths, class, &self.patterns.field);
            let Some(first) = found.first() else {
                continue;
            };

            let (existing, body, anchor, ctor_range) =
                match ctor::locate(&masked, &depths, class, &self.patterns.constructor)? {
                    CtorSearch::Absent => (Vec::new(), Vec::new(), first.line, None),
                    CtorSearch::Found(range) => {
                        let parts = ctor::decompose(&lines, &masked, range);
                        (parts.params, parts.body, range.start_line, Some(range))
                    }
                    CtorSearch::Unterminated(line) => {
                        tracing::debug!(class = %class.name, line = line + 1, "constructor never closes, class skipped");
                        unbalanced += 1;
                        continue;
                    }
                };

            let derived: Vec<String> = found.iter().map(fields::DependencyField::to_param).collect();
            synth::check_collisions(&class.name, &derived, &existing)?;
            let replacement = synth::build_constructor(&derived, &existing, &body, &first.indent);

            for field in &found {
                plan.delete(field.line);
            }
            if let Some(range) = ctor_range {
                for line in range.start_line..=range.end_line {
                    plan.delete(line);
                }
            }
            plan.replace(anchor, replacement);

            tracing::debug!(
                class = %class.name,
                fields = found.len(),
                merged_params = existing.len(),
                "class converted"
            );
            converted_classes += 1;
            converted_fields += found.len();
        }

        if plan.is_empty() {
            let reason = if unbalanced > 0 {
                SkipReason::Unbalanced
            } else {
                SkipReason::NoFields
            };
            return Ok(Conversion::skipped(text, reason));
        }

        let rebuilt = plan.apply(&lines, eol);
        let cleaned = rewrite::remove_unused_import(
            &rebuilt,
            &self.config.lookup_call,
            &self.config.import_source,
            &self.patterns.lookup_use,
            &self.patterns.import_stmt,
        );
        let text = rewrite::collapse_blank_lines(&cleaned, &self.patterns.blank_runs, eol);

        Ok(Conversion {
            text,
            outcome: FileOutcome::Converted {
                classes: converted_classes,
                fields: converted_fields,
            },
        })
    }
}
