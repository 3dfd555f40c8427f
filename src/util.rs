use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }

    if max <= 3 {
        return s.chars().take(max).collect();
    }

    let truncated: String = s.chars().take(max - 3).collect();
    format!("{}...", truncated)
}

/// `path` relative to `root` with forward slashes, for reporting.
pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Replace a file's contents via a sibling temp file and a rename, keeping
/// the original permissions.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.ctorize.tmp", file_name));

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    if let Err(err) = file.write_all(content.as_bytes()).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(file);

    if let Some(permissions) = permissions {
        if let Err(err) = fs::set_permissions(&tmp_path, permissions) {
            tracing::warn!(path = %tmp_path.display(), %err, "failed to copy permissions");
        }
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{relative_display, truncate, write_atomic};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_truncate_unicode_safe() {
        let input = "ééééé";
        assert_eq!(truncate(input, 4), "é...");
    }

    #[test]
    fn test_truncate_small_max() {
        let input = "こんにちは";
        assert_eq!(truncate(input, 3), "こんに");
        assert_eq!(truncate(input, 0), "");
    }

    #[test]
    fn test_relative_display() {
        let root = Path::new("/corpus/src");
        assert_eq!(
            relative_display(root, Path::new("/corpus/src/app/a.ts")),
            "app/a.ts"
        );
        assert_eq!(relative_display(root, Path::new("/elsewhere/b.ts")), "/elsewhere/b.ts");
    }

    #[test]
    fn test_write_atomic_replaces_content_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.component.ts");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
