//! Test harness for l integration tests

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;

pub use ltree::test_utils::{
    TestRepo, mp4_bytes, pdf_bytes, png_bytes, text_lines, wav_bytes,
};

/// `l` run inside `dir` with `HOME` pointed there too, so no user config or
/// size cache leaks into the test.
pub fn l_with_icons(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_l"));
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("L_CONFIG")
        .env_remove("NO_COLOR")
        .env_remove("FORCE_COLOR");
    cmd
}

/// Like [`l_with_icons`], with glyphs turned off so rows compare as plain text.
pub fn l_command(dir: &Path) -> Command {
    let mut cmd = l_with_icons(dir);
    cmd.arg("--no-icons");
    cmd
}

pub fn l_sizes_command(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_l-sizes"));
    cmd.current_dir(dir).env("HOME", dir);
    cmd
}

/// Run `l` and collect (stdout, stderr, success).
pub fn run_l(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = l_command(dir)
        .args(args)
        .output()
        .expect("Failed to run l");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// The listing row ending in `name`.
pub fn row<'a>(stdout: &'a str, name: &str) -> Option<&'a str> {
    stdout.lines().find(|line| line.trim_end().ends_with(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_creates_temp_dir() {
        let repo = TestRepo::new();
        assert!(repo.path().exists());
    }

    #[test]
    fn test_harness_git_init() {
        let repo = TestRepo::with_git();
        assert!(repo.path().join(".git").exists());
    }

    #[test]
    fn test_row_lookup() {
        let out = "├── a.txt\n└── b.txt\n";
        assert_eq!(row(out, "b.txt"), Some("└── b.txt"));
        assert_eq!(row(out, "c.txt"), None);
    }
}
