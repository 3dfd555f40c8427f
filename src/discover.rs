use crate::config::Config;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Why a file under the root was not handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excluded {
    Extension,
    TestFile,
    Denylisted,
    NoFieldMarker,
}

/// Walks a corpus root and yields the files worth converting.
pub struct Discovery<'a> {
    config: &'a Config,
}

impl<'a> Discovery<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Files that contain a `= inject(` field marker, sorted by path.
    ///
    /// Files that cannot be read as text are kept so the run reports them.
    pub fn candidates(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let marker = self.config.field_marker();
        let mut files = Vec::new();

        for path in self.source_files(root)? {
            match self.classify(&path, Some(&marker)) {
                None => files.push(path),
                Some(reason) => {
                    tracing::trace!(path = %path.display(), ?reason, "excluded");
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// Every non-test, non-denylisted source file under the root, sorted.
    pub fn source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            anyhow::bail!("{} is not a directory", root.display());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_ignore(e))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(%err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.classify(path, None).is_none() {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// `None` when the file passes every filter.
    fn classify(&self, path: &Path, marker: Option<&str>) -> Option<Excluded> {
        if !self.config.matches_extension(path) {
            return Some(Excluded::Extension);
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.config.is_test_file(name) {
            return Some(Excluded::TestFile);
        }
        if self.config.is_skipped(name) {
            return Some(Excluded::Denylisted);
        }
        if let Some(marker) = marker {
            match fs::read_to_string(path) {
                Ok(content) if content.contains(marker) => {}
                Ok(_) => return Some(Excluded::NoFieldMarker),
                Err(err) => {
                    tracing::debug!(path = %path.display(), %err, "unreadable candidate kept");
                }
            }
        }
        None
    }

    fn should_ignore(&self, entry: &walkdir::DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| self.config.ignore_dirs.iter().any(|d| d == name) || name.starts_with('.'))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn applies_every_filter() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let field = "export class A {\n  a = inject(A);\n}\n";
        write(root, "src/app/b.component.ts", field);
        write(root, "src/app/a.service.ts", field);
        write(root, "src/app/a.service.spec.ts", field);
        write(root, "src/app/auth.guard.ts", field);
        write(root, "src/app/plain.ts", "export class P {}\n");
        write(root, "src/app/view.html", field);
        write(root, "node_modules/lib/index.ts", field);
        write(root, ".angular/cache/x.ts", field);

        let config = Config::default();
        let files = Discovery::new(&config).candidates(root).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["src/app/a.service.ts", "src/app/b.component.ts"]);
    }

    #[test]
    fn unreadable_files_stay_candidates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.ts");
        fs::write(&path, b"export class A {\n  a = inject(A);\n  s = '\xff';\n}\n").unwrap();
        let config = Config::default();
        let files = Discovery::new(&config).candidates(dir.path()).unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn source_files_ignores_marker() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.ts", "export class P {}\n");
        write(dir.path(), "b.spec.ts", "");
        let config = Config::default();
        let files = Discovery::new(&config).source_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.ts")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        assert!(Discovery::new(&config)
            .candidates(&dir.path().join("missing"))
            .is_err());
    }
}
