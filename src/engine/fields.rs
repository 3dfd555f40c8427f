//! Single-line `name = inject(Type);` field recognition.

use super::mask::MaskedSource;
use super::scan::ClassRange;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Private,
    Protected,
    Public,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::Protected => "protected",
            Access::Public => "public",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "private" => Some(Access::Private),
            "protected" => Some(Access::Protected),
            "public" => Some(Access::Public),
            _ => None,
        }
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A class field initialized by the lookup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyField {
    pub line: usize,
    pub indent: String,
    pub access: Option<Access>,
    pub readonly: bool,
    pub name: String,
    pub service: String,
}

impl DependencyField {
    /// Constructor parameter for this field. A missing modifier becomes an
    /// explicit `public`.
    pub fn to_param(&self) -> String {
        let access = self.access.unwrap_or(Access::Public);
        let readonly = if self.readonly { "readonly " } else { "" };
        format!("{} {}{}: {}", access, readonly, self.name, self.service)
    }
}

/// Regex source for a field line using `lookup` as the lookup call.
pub fn field_pattern(lookup: &str) -> String {
    format!(
        r"^(\s+)(?:(private|protected|public)\s+)?(readonly\s+)?(\w+)(?:\s*:\s*[^=;]+)?\s*=\s*{}\((\w+(?:<[^>]+>)?)\)\s*;\s*$",
        regex::escape(lookup)
    )
}

/// Dependency fields declared directly in the class body.
///
/// `depths` holds the brace depth at the start of each line; only lines at
/// the class's member depth are considered. A line must match in the masked
/// view as well, so field-shaped text inside comments and literals is skipped.
pub fn find_fields(
    lines: &[&str],
    masked: &MaskedSource,
    depths: &[i64],
    class: &ClassRange,
    field_re: &Regex,
) -> Vec<DependencyField> {
    let member_depth = depths.get(class.open_line).copied().unwrap_or(0) + 1;

    class
        .body_lines()
        .filter(|&i| depths.get(i).copied() == Some(member_depth))
        .filter(|&i| field_re.is_match(masked.line(i)))
        .filter_map(|i| {
            let line = lines.get(i)?;
            let caps = field_re.captures(line)?;
            Some(DependencyField {
                line: i,
                indent: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
                access: caps.get(2).and_then(|m| Access::parse(m.as_str())),
                readonly: caps.get(3).is_some(),
                name: caps.get(4)?.as_str().to_string(),
                service: caps.get(5)?.as_str().to_string(),
            })
        })
        .collect()
}
