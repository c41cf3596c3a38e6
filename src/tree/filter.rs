//! Hidden-file and gitignore filtering for one directory level

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{Error, Result};

/// Paths of the entries directly inside `dir` that pass the filters.
///
/// `.gitignore` files of parent directories are honoured too. `.git` itself
/// is dropped whenever ignored entries are.
pub fn list_children(dir: &Path, show_hidden: bool, skip_gitignored: bool) -> Result<Vec<PathBuf>> {
    // Surface an unreadable directory as an error instead of an empty walk.
    fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let walker = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .follow_links(false)
        .hidden(!show_hidden)
        .parents(skip_gitignored)
        .ignore(skip_gitignored)
        .git_ignore(skip_gitignored)
        .git_global(skip_gitignored)
        .git_exclude(skip_gitignored)
        .build();

    let mut children = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        if skip_gitignored && entry.file_name() == ".git" {
            continue;
        }
        children.push(entry.into_path());
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_hidden_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        fs::write(dir.path().join("shown"), "").unwrap();

        let visible = list_children(dir.path(), false, false).unwrap();
        assert_eq!(names(&visible), vec!["shown"]);
        let all = list_children(dir.path(), true, false).unwrap();
        assert_eq!(names(&all), vec![".hidden", "shown"]);
    }

    #[test]
    fn test_gitignore_is_honoured_in_repos() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "target/\n*.log\n").unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("debug.log"), "").unwrap();
        fs::write(dir.path().join("main.rs"), "").unwrap();

        let filtered = list_children(dir.path(), true, true).unwrap();
        assert_eq!(names(&filtered), vec![".gitignore", "main.rs"]);

        let unfiltered = list_children(dir.path(), true, false).unwrap();
        assert_eq!(
            names(&unfiltered),
            vec![".git", ".gitignore", "debug.log", "main.rs", "target"]
        );
    }

    #[test]
    fn test_parent_gitignore_applies_to_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".gitignore"), "*.tmp\n").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("keep.txt"), "").unwrap();
        fs::write(sub.join("drop.tmp"), "").unwrap();

        assert_eq!(names(&list_children(&sub, false, true).unwrap()), vec!["keep.txt"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(list_children(&dir.path().join("nope"), false, true).is_err());
    }
}
