//! Per-file processing loop
//!
//! Every file is read, transformed and written on its own. Any failure is
//! caught at the file boundary, recorded, and the loop moves on; nothing is
//! retried since the files are rewritten in place.

use crate::engine::{Engine, FileOutcome};
use crate::error::{EngineError, EngineResult};
use crate::repair::{RepairOutcome, Repairer};
use crate::util::{relative_display, write_atomic};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute outcomes without writing anything
    pub dry_run: bool,
}

/// Result for one file, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Entry {
    Converted {
        path: String,
        classes: usize,
        fields: usize,
        repaired_params: usize,
    },
    Skipped {
        path: String,
        reason: String,
    },
    Repaired {
        path: String,
        params: usize,
        import_cleaned: bool,
    },
    Unchanged {
        path: String,
    },
    Errored {
        path: String,
        message: String,
    },
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::Converted { path, .. }
            | Entry::Skipped { path, .. }
            | Entry::Repaired { path, .. }
            | Entry::Unchanged { path }
            | Entry::Errored { path, .. } => path,
        }
    }

    /// Console line for this entry; unchanged files are not announced.
    pub fn status_line(&self) -> Option<String> {
        match self {
            Entry::Converted { path, .. } => Some(format!("  [OK] {}", path)),
            Entry::Skipped { path, reason } => Some(format!("  [SKIP] {}: {}", path, reason)),
            Entry::Repaired { path, .. } => Some(format!("  [FIXED] {}", path)),
            Entry::Unchanged { .. } => None,
            Entry::Errored { path, message } => Some(format!("  [ERR] {}: {}", path, message)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub entries: Vec<Entry>,
}

impl RunReport {
    pub fn converted(&self) -> usize {
        self.count(|e| matches!(e, Entry::Converted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|e| matches!(e, Entry::Skipped { .. }))
    }

    pub fn repaired(&self) -> usize {
        self.count(|e| matches!(e, Entry::Repaired { .. }))
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Errored { path, message } => Some((path.as_str(), message.as_str())),
            _ => None,
        })
    }

    pub fn errored(&self) -> usize {
        self.errors().count()
    }

    pub fn exit_code(&self) -> i32 {
        if self.errored() > 0 {
            1
        } else {
            0
        }
    }

    fn count(&self, pred: impl Fn(&Entry) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(e)).count()
    }
}

pub struct Runner<'a> {
    root: &'a Path,
    options: RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(root: &'a Path, options: RunOptions) -> Self {
        Self { root, options }
    }

    /// Convert each file, reporting every entry to `observe` as it completes.
    ///
    /// With a `repairer`, converted text goes through the repair pass before
    /// it is written.
    pub fn convert(
        &self,
        engine: &Engine,
        repairer: Option<&Repairer>,
        files: &[PathBuf],
        mut observe: impl FnMut(&Entry),
    ) -> RunReport {
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            entries: Vec::with_capacity(files.len()),
        };

        for path in files {
            let rel = relative_display(self.root, path);
            let entry = match self.convert_file(engine, repairer, path) {
                Ok(FileResult::Converted {
                    classes,
                    fields,
                    repaired_params,
                }) => {
                    tracing::info!(path = %rel, classes, fields, "converted");
                    Entry::Converted {
                        path: rel,
                        classes,
                        fields,
                        repaired_params,
                    }
                }
                Ok(FileResult::Skipped(reason)) => Entry::Skipped { path: rel, reason },
                Err(err) => {
                    tracing::warn!(path = %rel, error = %err, "conversion failed");
                    Entry::Errored {
                        path: rel,
                        message: err.to_string(),
                    }
                }
            };
            observe(&entry);
            report.entries.push(entry);
        }

        report
    }

    /// Run only the repair pass over `files`.
    pub fn repair(
        &self,
        repairer: &Repairer,
        files: &[PathBuf],
        mut observe: impl FnMut(&Entry),
    ) -> RunReport {
        let mut report = RunReport {
            dry_run: self.options.dry_run,
            entries: Vec::with_capacity(files.len()),
        };

        for path in files {
            let rel = relative_display(self.root, path);
            let entry = match self.repair_file(repairer, path) {
                Ok(RepairOutcome::Repaired {
                    params,
                    import_cleaned,
                }) => Entry::Repaired {
                    path: rel,
                    params,
                    import_cleaned,
                },
                Ok(RepairOutcome::Unchanged) => Entry::Unchanged { path: rel },
                Err(err) => {
                    tracing::warn!(path = %rel, error = %err, "repair failed");
                    Entry::Errored {
                        path: rel,
                        message: err.to_string(),
                    }
                }
            };
            observe(&entry);
            report.entries.push(entry);
        }

        report
    }

    fn convert_file(
        &self,
        engine: &Engine,
        repairer: Option<&Repairer>,
        path: &Path,
    ) -> EngineResult<FileResult> {
        let original = read(path)?;
        let conversion = engine.convert(&original)?;

        let (classes, fields) = match conversion.outcome {
            FileOutcome::Converted { classes, fields } => (classes, fields),
            FileOutcome::Skipped { reason } => {
                return Ok(FileResult::Skipped(reason.to_string()));
            }
        };

        let (text, repaired_params) = match repairer {
            Some(repairer) => {
                let repair = repairer.repair(&conversion.text);
                let params = match repair.outcome {
                    RepairOutcome::Repaired { params, .. } => params,
                    RepairOutcome::Unchanged => 0,
                };
                (repair.text, params)
            }
            None => (conversion.text, 0),
        };

        self.write(path, &text)?;
        Ok(FileResult::Converted {
            classes,
            fields,
            repaired_params,
        })
    }

    fn repair_file(&self, repairer: &Repairer, path: &Path) -> EngineResult<RepairOutcome> {
        let original = read(path)?;
        let repair = repairer.repair(&original);
        if repair.outcome != RepairOutcome::Unchanged {
            self.write(path, &repair.text)?;
        }
        Ok(repair.outcome)
    }

    fn write(&self, path: &Path, text: &str) -> EngineResult<()> {
        if self.options.dry_run {
            return Ok(());
        }
        write_atomic(path, text).map_err(|source| EngineError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

enum FileResult {
    Converted {
        classes: usize,
        fields: usize,
        repaired_params: usize,
    },
    Skipped(String),
}

fn read(path: &Path) -> EngineResult<String> {
    fs::read_to_string(path).map_err(|source| EngineError::Read {
        path: path.to_path_buf(),
        source,
    })
}
