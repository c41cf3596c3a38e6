//! Git repository integration
//!
//! The tree builder only talks to [`GitCache`]. [`Git2Cache`] answers those
//! queries from `git2`, loading each repository's status table once on first
//! use; [`NoGit`] answers nothing and is used with `--no-git`.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use git2::{BranchType, DescribeFormatOptions, DescribeOptions, DiffOptions, Patch, Repository, Status, StatusOptions};
use serde::Serialize;

/// Status of a single path, in `git status --porcelain` terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    /// Two-character porcelain code such as `" M"`, `"A "`, `"??"` or `"!!"`.
    pub code: String,
    pub ignored: bool,
    pub diff_added: u32,
    pub diff_removed: u32,
}

impl GitStatus {
    fn ignored() -> Self {
        Self {
            code: "!!".to_string(),
            ignored: true,
            diff_added: 0,
            diff_removed: 0,
        }
    }
}

/// Counts of changed paths below a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GitSummary {
    pub modified: u32,
    pub added: u32,
    pub deleted: u32,
    pub renamed: u32,
    pub untracked: u32,
    pub conflicted: u32,
}

impl GitSummary {
    pub fn is_clean(&self) -> bool {
        *self == GitSummary::default()
    }

    fn record(&mut self, code: &str) {
        let bytes = code.as_bytes();
        let (x, y) = (bytes.first().copied(), bytes.get(1).copied());
        match (x, y) {
            (Some(b'?'), _) => self.untracked += 1,
            (Some(b'!'), _) => {}
            (Some(b'U'), _) | (_, Some(b'U')) => self.conflicted += 1,
            (Some(b'A'), _) => self.added += 1,
            (Some(b'R'), _) | (_, Some(b'R')) => self.renamed += 1,
            (Some(b'D'), _) | (_, Some(b'D')) => self.deleted += 1,
            _ => self.modified += 1,
        }
    }
}

impl fmt::Display for GitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ('+', self.added),
            ('~', self.modified),
            ('-', self.deleted),
            ('>', self.renamed),
            ('?', self.untracked),
            ('!', self.conflicted),
        ];
        let mut first = true;
        for (sigil, n) in parts {
            if n == 0 {
                continue;
            }
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}{}", sigil, n)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub branch: String,
    pub has_upstream: bool,
    pub out_of_sync: bool,
    pub ahead: usize,
    pub behind: usize,
}

/// Repository-wide facts shown for repository roots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoInfo {
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub tag_distance: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    pub short_hash: String,
    /// With thousand separators, e.g. `"1,234"`.
    pub commit_count: String,
    pub has_upstream: bool,
    pub out_of_sync: bool,
    pub ahead: usize,
    pub behind: usize,
    pub summary: GitSummary,
}

/// Query interface the tree builder uses for git facts.
pub trait GitCache {
    fn query_status(&self, path: &Path) -> Option<GitStatus>;

    fn query_dir_summary(&self, dir: &Path) -> Option<GitSummary>;

    /// Resolve `reference` (e.g. `"HEAD"`) inside `repo` to a full hash.
    fn read_ref(&self, repo: &Path, reference: &str) -> Option<String>;

    fn branch_info(&self, repo: &Path) -> Option<BranchInfo>;

    /// Nearest tag reachable from HEAD and the number of commits since it.
    fn describe(&self, _repo: &Path) -> Option<(String, u32)> {
        None
    }

    fn remote_url(&self, _repo: &Path) -> Option<String> {
        None
    }

    fn commit_count(&self, _repo: &Path) -> Option<usize> {
        None
    }

    fn is_repo_root(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }
}

/// Git disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGit;

impl GitCache for NoGit {
    fn query_status(&self, _path: &Path) -> Option<GitStatus> {
        None
    }

    fn query_dir_summary(&self, _dir: &Path) -> Option<GitSummary> {
        None
    }

    fn read_ref(&self, _repo: &Path, _reference: &str) -> Option<String> {
        None
    }

    fn branch_info(&self, _repo: &Path) -> Option<BranchInfo> {
        None
    }

    fn is_repo_root(&self, _path: &Path) -> bool {
        false
    }
}

struct RepoState {
    repo: Repository,
    root: PathBuf,
    /// Absolute path -> porcelain code. Clean tracked files are absent.
    statuses: HashMap<PathBuf, String>,
    /// Ignored files and directories (git does not descend into the latter).
    ignored: HashSet<PathBuf>,
    /// Rollup of `statuses` for every directory holding a changed path.
    summaries: HashMap<PathBuf, GitSummary>,
    diffs: HashMap<PathBuf, (u32, u32)>,
}

impl RepoState {
    fn load(root: &Path, with_diff: bool) -> Option<Self> {
        let repo = Repository::open(root).ok()?;
        let workdir = repo.workdir()?.to_path_buf();
        let workdir = workdir.canonicalize().unwrap_or(workdir);

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(true)
            .recurse_ignored_dirs(false);

        let mut statuses = HashMap::new();
        let mut ignored = HashSet::new();
        if let Ok(list) = repo.statuses(Some(&mut opts)) {
            for entry in list.iter() {
                let Some(rel) = entry.path() else { continue };
                let abs = workdir.join(rel.trim_end_matches('/'));
                let flags = entry.status();
                if flags.contains(Status::IGNORED) {
                    ignored.insert(abs);
                    continue;
                }
                statuses.insert(abs, porcelain_code(flags));
            }
        }

        let diffs = if with_diff {
            collect_diff_stats(&repo, &workdir)
        } else {
            HashMap::new()
        };

        log::debug!(
            "loaded git status for {} ({} changed, {} ignored)",
            workdir.display(),
            statuses.len(),
            ignored.len()
        );

        let summaries = summarize(&workdir, &statuses);
        Some(Self {
            repo,
            root: workdir,
            statuses,
            ignored,
            summaries,
            diffs,
        })
    }

    fn is_ignored(&self, path: &Path) -> bool {
        path.ancestors()
            .take_while(|p| p.starts_with(&self.root))
            .any(|p| self.ignored.contains(p))
    }
}

/// Credit each changed path to every directory above it, up to `root`.
fn summarize(root: &Path, statuses: &HashMap<PathBuf, String>) -> HashMap<PathBuf, GitSummary> {
    let mut summaries: HashMap<PathBuf, GitSummary> = HashMap::new();
    for (path, code) in statuses {
        for dir in path.ancestors().skip(1) {
            if !dir.starts_with(root) {
                break;
            }
            summaries.entry(dir.to_path_buf()).or_default().record(code);
        }
    }
    summaries
}

/// Translate libgit2 status flags into a porcelain `XY` code.
fn porcelain_code(flags: Status) -> String {
    if flags.contains(Status::WT_NEW)
        && !flags.intersects(Status::INDEX_NEW | Status::INDEX_MODIFIED)
    {
        return "??".to_string();
    }
    if flags.contains(Status::CONFLICTED) {
        return "UU".to_string();
    }
    let x = if flags.contains(Status::INDEX_NEW) {
        'A'
    } else if flags.contains(Status::INDEX_MODIFIED) {
        'M'
    } else if flags.contains(Status::INDEX_DELETED) {
        'D'
    } else if flags.contains(Status::INDEX_RENAMED) {
        'R'
    } else if flags.contains(Status::INDEX_TYPECHANGE) {
        'T'
    } else {
        ' '
    };
    let y = if flags.contains(Status::WT_MODIFIED) {
        'M'
    } else if flags.contains(Status::WT_DELETED) {
        'D'
    } else if flags.contains(Status::WT_RENAMED) {
        'R'
    } else if flags.contains(Status::WT_TYPECHANGE) {
        'T'
    } else {
        ' '
    };
    format!("{}{}", x, y)
}

fn collect_diff_stats(repo: &Repository, workdir: &Path) -> HashMap<PathBuf, (u32, u32)> {
    let mut stats = HashMap::new();
    let head_tree = repo.head().ok().and_then(|h| h.peel_to_tree().ok());
    let mut opts = DiffOptions::new();
    opts.include_untracked(false);
    let diff = match repo.diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts)) {
        Ok(d) => d,
        Err(e) => {
            log::debug!("git diff failed in {}: {}", workdir.display(), e);
            return stats;
        }
    };
    for idx in 0..diff.deltas().len() {
        let Ok(Some(patch)) = Patch::from_diff(&diff, idx) else {
            continue;
        };
        let Ok((_, added, removed)) = patch.line_stats() else {
            continue;
        };
        let delta = patch.delta();
        let Some(rel) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
            continue;
        };
        stats.insert(workdir.join(rel), (added as u32, removed as u32));
    }
    stats
}

/// `git2`-backed cache. Single-threaded; repositories load lazily.
pub struct Git2Cache {
    with_diff: bool,
    repos: RefCell<HashMap<PathBuf, Option<Rc<RepoState>>>>,
    roots: RefCell<HashMap<PathBuf, Option<PathBuf>>>,
}

impl Git2Cache {
    pub fn new(with_diff: bool) -> Self {
        Self {
            with_diff,
            repos: RefCell::new(HashMap::new()),
            roots: RefCell::new(HashMap::new()),
        }
    }

    /// Work tree root containing `dir`, memoised per directory.
    fn root_for_dir(&self, dir: &Path) -> Option<PathBuf> {
        if let Some(hit) = self.roots.borrow().get(dir) {
            return hit.clone();
        }
        let found = if dir.join(".git").exists() {
            Some(dir.to_path_buf())
        } else {
            dir.parent().and_then(|p| self.root_for_dir(p))
        };
        self.roots
            .borrow_mut()
            .insert(dir.to_path_buf(), found.clone());
        found
    }

    fn state_for(&self, path: &Path, is_dir: bool) -> Option<Rc<RepoState>> {
        let dir = if is_dir { path } else { path.parent()? };
        let root = self.root_for_dir(dir)?;
        self.state_at(&root)
    }

    fn state_at(&self, root: &Path) -> Option<Rc<RepoState>> {
        if let Some(hit) = self.repos.borrow().get(root) {
            return hit.clone();
        }
        let state = RepoState::load(root, self.with_diff).map(Rc::new);
        self.repos
            .borrow_mut()
            .insert(root.to_path_buf(), state.clone());
        state
    }
}

impl GitCache for Git2Cache {
    fn query_status(&self, path: &Path) -> Option<GitStatus> {
        let state = self.state_for(path, path.is_dir())?;
        if state.is_ignored(path) {
            return Some(GitStatus::ignored());
        }
        let code = state.statuses.get(path)?;
        let (diff_added, diff_removed) = state.diffs.get(path).copied().unwrap_or((0, 0));
        Some(GitStatus {
            code: code.clone(),
            ignored: false,
            diff_added,
            diff_removed,
        })
    }

    fn query_dir_summary(&self, dir: &Path) -> Option<GitSummary> {
        let state = self.state_for(dir, true)?;
        if state.is_ignored(dir) {
            return None;
        }
        Some(state.summaries.get(dir).copied().unwrap_or_default())
    }

    fn read_ref(&self, repo: &Path, reference: &str) -> Option<String> {
        let state = self.state_at(repo)?;
        let object = state.repo.revparse_single(reference).ok()?;
        Some(object.id().to_string())
    }

    fn branch_info(&self, repo: &Path) -> Option<BranchInfo> {
        let state = self.state_at(repo)?;
        let head = state.repo.head().ok()?;
        let branch = if head.is_branch() {
            head.shorthand().unwrap_or("HEAD").to_string()
        } else {
            "HEAD".to_string()
        };
        let mut info = BranchInfo {
            branch,
            ..Default::default()
        };
        let upstream = state
            .repo
            .find_branch(&info.branch, BranchType::Local)
            .ok()
            .and_then(|b| b.upstream().ok());
        if let (Some(upstream), Some(local)) = (upstream, head.target()) {
            info.has_upstream = true;
            if let Some(remote) = upstream.get().target() {
                if let Ok((ahead, behind)) = state.repo.graph_ahead_behind(local, remote) {
                    info.ahead = ahead;
                    info.behind = behind;
                    info.out_of_sync = ahead > 0 || behind > 0;
                }
            }
        }
        Some(info)
    }

    fn describe(&self, repo: &Path) -> Option<(String, u32)> {
        let state = self.state_at(repo)?;
        let mut opts = DescribeOptions::new();
        opts.describe_tags();
        let description = state.repo.describe(&opts).ok()?;
        let mut format = DescribeFormatOptions::new();
        format.always_use_long_format(true);
        let text = description.format(Some(&format)).ok()?;
        parse_describe(&text)
    }

    fn remote_url(&self, repo: &Path) -> Option<String> {
        let state = self.state_at(repo)?;
        let remote = state.repo.find_remote("origin").ok()?;
        remote.url().map(str::to_string)
    }

    fn commit_count(&self, repo: &Path) -> Option<usize> {
        let state = self.state_at(repo)?;
        let mut walk = state.repo.revwalk().ok()?;
        walk.push_head().ok()?;
        Some(walk.count())
    }

    fn is_repo_root(&self, path: &Path) -> bool {
        path.join(".git").exists()
            && self
                .state_at(path)
                .is_some_and(|state| state.root.as_path() == path)
    }
}

/// Split `v1.2-3-gabcdef0` into `("v1.2", 3)`.
fn parse_describe(text: &str) -> Option<(String, u32)> {
    let mut parts = text.rsplitn(3, '-');
    let _hash = parts.next()?;
    let distance = parts.next()?.parse().ok()?;
    let tag = parts.next()?;
    Some((tag.to_string(), distance))
}
