//! Nerd Font glyphs for entries.
//!
//! Named slots cover entry kinds; an extension map refines regular files.
//! Both can be overridden from the `[icons]` and `[extensions]` config tables.

use std::collections::HashMap;

use crate::entry::{ContentKind, FileEntry, FileKind};

const BUILTIN_EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "\u{e7a8}"),
    ("py", "\u{e606}"),
    ("js", "\u{e74e}"),
    ("ts", "\u{e628}"),
    ("go", "\u{e626}"),
    ("c", "\u{e61e}"),
    ("h", "\u{f0fd}"),
    ("cpp", "\u{e61d}"),
    ("java", "\u{e738}"),
    ("rb", "\u{e791}"),
    ("lua", "\u{e620}"),
    ("sh", "\u{e795}"),
    ("html", "\u{e736}"),
    ("css", "\u{e749}"),
    ("md", "\u{f48a}"),
    ("json", "\u{e60b}"),
    ("toml", "\u{f013}"),
    ("yaml", "\u{f013}"),
    ("yml", "\u{f013}"),
    ("lock", "\u{f023}"),
    ("txt", "\u{f0f6}"),
    ("zip", "\u{f1c6}"),
    ("tar", "\u{f1c6}"),
    ("gz", "\u{f1c6}"),
    ("xz", "\u{f1c6}"),
    ("zst", "\u{f1c6}"),
    ("7z", "\u{f1c6}"),
    ("mp4", "\u{f03d}"),
    ("mov", "\u{f03d}"),
    ("mkv", "\u{f03d}"),
    ("webm", "\u{f03d}"),
];

/// Glyph table. Every slot is a plain string so that `--no-icons` is just
/// an all-empty table.
#[derive(Debug, Clone)]
pub struct Icons {
    pub dir: String,
    pub file: String,
    pub exec: String,
    pub symlink: String,
    pub symlink_broken: String,
    pub image: String,
    pub audio: String,
    pub video: String,
    pub pdf: String,
    pub archive: String,
    pub mount: String,
    pub git_repo: String,
    pub device: String,
    pub pipe: String,
    pub socket: String,
    extensions: HashMap<String, String>,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            dir: "\u{f07b}".into(),
            file: "\u{f15b}".into(),
            exec: "\u{f489}".into(),
            symlink: "\u{f0c1}".into(),
            symlink_broken: "\u{f127}".into(),
            image: "\u{f03e}".into(),
            audio: "\u{f001}".into(),
            video: "\u{f03d}".into(),
            pdf: "\u{f1c1}".into(),
            archive: "\u{f1c6}".into(),
            mount: "\u{f0a0}".into(),
            git_repo: "\u{f1d3}".into(),
            device: "\u{f2db}".into(),
            pipe: "\u{f0ec}".into(),
            socket: "\u{f1e6}".into(),
            extensions: BUILTIN_EXTENSIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Icons {
    /// No glyphs at all.
    pub fn disabled() -> Self {
        Self {
            dir: String::new(),
            file: String::new(),
            exec: String::new(),
            symlink: String::new(),
            symlink_broken: String::new(),
            image: String::new(),
            audio: String::new(),
            video: String::new(),
            pdf: String::new(),
            archive: String::new(),
            mount: String::new(),
            git_repo: String::new(),
            device: String::new(),
            pipe: String::new(),
            socket: String::new(),
            extensions: HashMap::new(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.dir.is_empty() && self.file.is_empty()
    }

    /// Override the slot called `key`. Returns false for unknown slot names.
    pub fn set(&mut self, key: &str, glyph: &str) -> bool {
        let slot = match key {
            "dir" | "directory" => &mut self.dir,
            "file" => &mut self.file,
            "exec" | "executable" => &mut self.exec,
            "symlink" => &mut self.symlink,
            "symlink_broken" => &mut self.symlink_broken,
            "image" => &mut self.image,
            "audio" => &mut self.audio,
            "video" => &mut self.video,
            "pdf" => &mut self.pdf,
            "archive" => &mut self.archive,
            "mount" => &mut self.mount,
            "git_repo" | "repo" => &mut self.git_repo,
            "device" => &mut self.device,
            "pipe" | "fifo" => &mut self.pipe,
            "socket" => &mut self.socket,
            _ => return false,
        };
        *slot = glyph.to_string();
        true
    }

    pub fn set_extension(&mut self, extension: &str, glyph: &str) {
        self.extensions
            .insert(extension.to_lowercase(), glyph.to_string());
    }

    pub fn for_extension(&self, extension: &str) -> Option<&str> {
        self.extensions.get(extension).map(String::as_str)
    }

    /// Glyph for `entry`, most specific first.
    pub fn for_entry(&self, entry: &FileEntry) -> &str {
        match entry.kind {
            FileKind::Dir if entry.is_mount_point => &self.mount,
            FileKind::Dir if entry.git.is_repo_root => &self.git_repo,
            FileKind::Dir => &self.dir,
            FileKind::SymlinkBroken => &self.symlink_broken,
            FileKind::Symlink | FileKind::SymlinkDir => &self.symlink,
            FileKind::Fifo => &self.pipe,
            FileKind::Socket => &self.socket,
            FileKind::CharDevice | FileKind::BlockDevice => &self.device,
            FileKind::File | FileKind::Executable | FileKind::Unknown => {
                if let Some(glyph) = entry.extension().and_then(|e| self.for_extension(&e)) {
                    return glyph;
                }
                match entry.content {
                    ContentKind::Image => &self.image,
                    ContentKind::Audio => &self.audio,
                    ContentKind::Pdf => &self.pdf,
                    _ if entry.kind == FileKind::Executable => &self.exec,
                    _ => &self.file,
                }
            }
        }
    }
}
