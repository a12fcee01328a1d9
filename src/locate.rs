use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};

/// Finds `filename` in `start` or the nearest parent directory containing it.
///
/// Build artifacts can sit at arbitrary depth below the project root, so the
/// search walks all the way up and only fails at the filesystem root.
pub fn find_in_parent_dirs(start: &Path, filename: &str) -> Result<PathBuf> {
    let mut dir = start
        .canonicalize()
        .map_err(|_| anyhow!("can not resolve directory: {}", start.display()))?;

    loop {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Ok(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => bail!("could not find {filename} in any parent directory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_file_in_grandparent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("a/project.slcp"), "").unwrap();

        let found = find_in_parent_dirs(&nested, "project.slcp").unwrap();

        assert_eq!(found, tmp.path().canonicalize().unwrap().join("a/project.slcp"));
    }

    #[test]
    fn prefers_nearest_match() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("a/target.txt"), "outer").unwrap();
        fs::write(nested.join("target.txt"), "inner").unwrap();

        let found = find_in_parent_dirs(&nested, "target.txt").unwrap();

        assert_eq!(fs::read_to_string(found).unwrap(), "inner");
    }

    #[test]
    fn missing_file_reports_name() {
        let tmp = tempfile::tempdir().unwrap();

        let err = find_in_parent_dirs(tmp.path(), "no_such.slcp").unwrap_err();

        assert!(err.to_string().contains("no_such.slcp"));
    }
}
