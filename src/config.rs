//! Configuration for ctorize
//!
//! Policy data (lookup call name, denylist, special tokens) lives here and is
//! handed to the engine explicitly. Loaded from `ctorize.toml` in the working
//! directory when present, or from a file given with `--config`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "ctorize.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the dependency-lookup call, e.g. `inject`
    pub lookup_call: String,
    /// Module the lookup call (and the annotation) is imported from
    pub import_source: String,
    /// File extensions to consider, without the dot
    pub extensions: Vec<String>,
    /// File names containing any of these are treated as tests and skipped
    pub test_markers: Vec<String>,
    /// File names known to use the lookup call in functional position
    pub skip_files: Vec<String>,
    /// Directory names never descended into
    pub ignore_dirs: Vec<String>,
    /// Parameter annotation used for special tokens, e.g. `Inject`
    pub annotation: String,
    /// Injection tokens that need an annotation wrapper, mapped to the
    /// parameter type written in place of the token
    pub special_tokens: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut special_tokens = BTreeMap::new();
        special_tokens.insert("PLATFORM_ID".to_string(), "Object".to_string());
        special_tokens.insert("DOCUMENT".to_string(), "Document".to_string());

        Self {
            lookup_call: "inject".to_string(),
            import_source: "@angular/core".to_string(),
            extensions: vec!["ts".to_string()],
            test_markers: vec![".spec.".to_string(), ".test.".to_string()],
            skip_files: [
                "app.config.ts",
                "auth.guard.ts",
                "role.guard.ts",
                "error.interceptor.ts",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            ignore_dirs: [
                "node_modules",
                "dist",
                "build",
                "coverage",
                ".git",
                ".angular",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            annotation: "Inject".to_string(),
            special_tokens,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the effective config for a directory.
    ///
    /// An explicit path must exist. Otherwise `ctorize.toml` in `root` is
    /// used when present, and defaults when it is not.
    pub fn resolve(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate: PathBuf = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using corpus config");
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.lookup_call) {
            return Err(anyhow!(
                "lookup_call '{}' must be a plain identifier",
                self.lookup_call
            ));
        }
        if !is_identifier(&self.annotation) {
            return Err(anyhow!(
                "annotation '{}' must be a plain identifier",
                self.annotation
            ));
        }
        if self.import_source.trim().is_empty() {
            return Err(anyhow!("import_source must not be empty"));
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(anyhow!("extensions must name at least one extension"));
        }
        for (token, type_name) in &self.special_tokens {
            if !is_identifier(token) {
                return Err(anyhow!("special token '{}' must be a plain identifier", token));
            }
            if type_name.trim().is_empty() {
                return Err(anyhow!("special token '{}' has an empty type", token));
            }
        }
        Ok(())
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    pub fn is_test_file(&self, name: &str) -> bool {
        self.test_markers.iter().any(|marker| name.contains(marker.as_str()))
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip_files.iter().any(|skip| skip == name)
    }

    /// Literal text every convertible file contains: `= inject(`
    pub fn field_marker(&self) -> String {
        format!("= {}(", self.lookup_call)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.lookup_call, "inject");
        assert_eq!(config.field_marker(), "= inject(");
        assert!(config.special_tokens.contains_key("DOCUMENT"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "skip_files = [\"legacy.ts\"]\n\n[special_tokens]\nWINDOW = \"Window\"\n",
        )
        .unwrap();

        let config = Config::resolve(dir.path(), None).unwrap();
        assert_eq!(config.skip_files, vec!["legacy.ts".to_string()]);
        assert_eq!(config.lookup_call, "inject");
        assert_eq!(config.special_tokens.len(), 1);
        assert_eq!(config.special_tokens["WINDOW"], "Window");
    }

    #[test]
    fn missing_corpus_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::resolve(dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::resolve(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn rejects_non_identifier_lookup() {
        let config = Config {
            lookup_call: "inject(".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_filters() {
        let config = Config::default();
        assert!(config.matches_extension(Path::new("a/b.component.ts")));
        assert!(!config.matches_extension(Path::new("a/b.component.html")));
        assert!(config.is_test_file("b.component.spec.ts"));
        assert!(!config.is_test_file("b.component.ts"));
        assert!(config.is_skipped("auth.guard.ts"));
    }
}
