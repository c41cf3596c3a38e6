//! Per-entry metadata: content classification and git fields.
//!
//! Content classification runs the probes in a fixed order (image, audio,
//! PDF) and falls back to the line counter; whichever answers first decides
//! the content kind. A file the line counter refuses is binary.

use std::path::Path;

use crate::entry::{ContentKind, FileEntry};
use crate::file_utils::count_text;
use crate::git::{GitCache, RepoInfo};
use crate::probes::{get_audio_duration, get_image_megapixels, get_pdf_page_count};
use crate::tree::ComputeOpts;
use crate::tree::utils::format_count;

const SHORT_HASH_LEN: usize = 7;

/// Fill content, line/word counts and git fields as `compute` asks.
pub fn annotate(entry: &mut FileEntry, git: &dyn GitCache, compute: &ComputeOpts) {
    classify_content(entry, compute);
    apply_git(entry, git, compute);
}

pub fn classify_content(entry: &mut FileEntry, compute: &ComputeOpts) {
    if !entry.kind.is_regular() || entry.content != ContentKind::Unknown {
        return;
    }
    let path = entry.path.clone();

    if compute.media_info {
        let probes: [(ContentKind, fn(&Path) -> Option<u64>); 3] = [
            (ContentKind::Image, get_image_megapixels),
            (ContentKind::Audio, get_audio_duration),
            (ContentKind::Pdf, get_pdf_page_count),
        ];
        for (kind, probe) in probes {
            if let Some(value) = probe(&path) {
                entry.content = kind;
                entry.content_value = Some(value);
                return;
            }
        }
    }

    if compute.line_counts || compute.media_info {
        match count_text(&path) {
            Some(counts) => {
                entry.content = ContentKind::Text;
                entry.line_count = Some(counts.lines);
                entry.word_count = Some(counts.words);
                entry.content_value = Some(counts.lines);
            }
            None => {
                log::debug!("{} is binary", path.display());
                entry.content = ContentKind::Binary;
            }
        }
    }
}

pub fn apply_git(entry: &mut FileEntry, git: &dyn GitCache, compute: &ComputeOpts) {
    if !compute.git_status {
        return;
    }
    let path = entry.path.as_path();
    entry.git.status = git.query_status(path).map(|mut status| {
        if !compute.git_diff {
            status.diff_added = 0;
            status.diff_removed = 0;
        }
        status
    });

    if !entry.is_dir() {
        return;
    }
    entry.git.is_repo_root = git.is_repo_root(path);
    if entry.git.is_repo_root {
        entry.git.branch = git.branch_info(path).map(|b| b.branch);
    }
    if !entry.git.ignored() {
        entry.git.summary = git.query_dir_summary(path);
    }
    if compute.git_repo_info && entry.git.is_repo_root {
        entry.git.repo = repo_info(git, path).map(Box::new);
    }
}

/// Branch, tag, remote, hash and counts for the work tree at `root`.
pub fn repo_info(git: &dyn GitCache, root: &Path) -> Option<RepoInfo> {
    let branch = git.branch_info(root)?;
    let (tag, tag_distance) = match git.describe(root) {
        Some((tag, distance)) => (Some(tag), distance),
        None => (None, 0),
    };
    let short_hash = git
        .read_ref(root, "HEAD")
        .map(|hash| hash.chars().take(SHORT_HASH_LEN).collect())
        .unwrap_or_default();
    Some(RepoInfo {
        branch: branch.branch,
        tag,
        tag_distance,
        remote_url: git.remote_url(root),
        short_hash,
        commit_count: git
            .commit_count(root)
            .map(|n| format_count(n as u64))
            .unwrap_or_default(),
        has_upstream: branch.has_upstream,
        out_of_sync: branch.out_of_sync,
        ahead: branch.ahead,
        behind: branch.behind,
        summary: git.query_dir_summary(root).unwrap_or_default(),
    })
}
