use std::path::{Path, PathBuf};

use super::descriptor::is_plugin_file;

/// Plugin files directly inside `dir`, sorted by path. A missing directory
/// yields nothing.
pub fn plugin_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if is_plugin_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lists_only_plugin_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["pkg.json", "mem.json", "__cache.json", ".hidden.json", "README.md"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir_all(dir.path().join("nested.json")).unwrap();

        let files = plugin_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["mem.json", "pkg.json"]);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(plugin_files(&dir.path().join("nope")).unwrap().is_empty());
    }
}
