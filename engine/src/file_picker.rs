//! In-terminal file picker for loading a command file.
//!
//! Stands in for the operating system's file dialog. Like a browser
//! `<input type="file" accept=".txt">`, the listing is narrowed to `.txt`
//! files by default and can be widened to all files. Widening the listing
//! does not bypass the content-type check done at ingestion.
//!
//! The directory walk runs on the blocking pool; `App::tick()` applies the
//! listing once it is ready.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tokio::task::{self, JoinHandle};

/// Maximum number of files to scan.
const MAX_FILES_SCAN: usize = 10_000;

/// Maximum number of results to display.
const MAX_DISPLAY_RESULTS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptFilter {
    /// Only `.txt` files, the dialog's default.
    #[default]
    TextFiles,
    AllFiles,
}

impl AcceptFilter {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            AcceptFilter::TextFiles => "Text files (*.txt)",
            AcceptFilter::AllFiles => "All files (*)",
        }
    }

    fn accepts(self, path: &Path) -> bool {
        match self {
            AcceptFilter::AllFiles => true,
            AcceptFilter::TextFiles => path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt")),
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            AcceptFilter::TextFiles => AcceptFilter::AllFiles,
            AcceptFilter::AllFiles => AcceptFilter::TextFiles,
        }
    }
}

/// A scanned file: path relative to the scan root (forward slashes) plus
/// the full path that will be read.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub display: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct FilePickerState {
    all_files: Vec<FileEntry>,
    /// Directory walk still in progress.
    scan: Option<JoinHandle<Vec<FileEntry>>>,
    /// Indices into `all_files`, best match first.
    visible: Vec<usize>,
    filter: String,
    accept: AcceptFilter,
    selected: usize,
}

impl FilePickerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset filter and selection and start scanning `root` in the
    /// background. A scan still running from an earlier open is abandoned.
    pub fn open(&mut self, root: &Path) {
        self.all_files.clear();
        self.visible.clear();
        self.filter.clear();
        self.accept = AcceptFilter::default();
        self.selected = 0;

        let root = root.to_path_buf();
        self.scan = Some(task::spawn_blocking(move || scan_files(&root)));
    }

    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scan.is_some()
    }

    /// Apply the listing if the scan has finished. Returns `true` when it was
    /// applied.
    pub fn poll_scan(&mut self) -> bool {
        use futures_util::future::FutureExt;

        if !self.scan.as_ref().is_some_and(JoinHandle::is_finished) {
            return false;
        }
        let Some(mut handle) = self.scan.take() else {
            return false;
        };
        match (&mut handle).now_or_never() {
            Some(result) => {
                self.finish_scan(result);
                true
            }
            None => {
                self.scan = Some(handle);
                false
            }
        }
    }

    /// Wait for a running scan, if any, and apply it.
    pub async fn wait_for_scan(&mut self) {
        if let Some(handle) = self.scan.take() {
            let result = handle.await;
            self.finish_scan(result);
        }
    }

    fn finish_scan(&mut self, result: Result<Vec<FileEntry>, task::JoinError>) {
        match result {
            Ok(files) => {
                tracing::debug!(files = files.len(), "File picker scan finished");
                self.all_files = files;
            }
            Err(e) => {
                tracing::warn!(error = %e, "File picker scan failed");
                self.all_files.clear();
            }
        }
        self.refresh();
    }

    #[cfg(test)]
    fn with_entries(paths: &[&str]) -> Self {
        let mut state = Self {
            all_files: paths
                .iter()
                .map(|p| FileEntry {
                    display: (*p).to_string(),
                    path: PathBuf::from(p),
                })
                .collect(),
            ..Self::default()
        };
        state.refresh();
        state
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub fn accept(&self) -> AcceptFilter {
        self.accept
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter.push(c);
        self.refresh();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter.pop();
        self.refresh();
    }

    pub fn toggle_accept(&mut self) {
        self.accept = self.accept.toggled();
        self.refresh();
    }

    pub fn select_next(&mut self) {
        if !self.visible.is_empty() {
            self.selected = (self.selected + 1) % self.visible.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.visible.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.visible.len() - 1);
        }
    }

    #[must_use]
    pub fn visible_files(&self) -> Vec<&FileEntry> {
        self.visible
            .iter()
            .filter_map(|&idx| self.all_files.get(idx))
            .collect()
    }

    #[must_use]
    pub fn selected_file(&self) -> Option<&FileEntry> {
        self.visible
            .get(self.selected)
            .and_then(|&idx| self.all_files.get(idx))
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.all_files.len()
    }

    fn refresh(&mut self) {
        let needle: Vec<char> = self.filter.to_lowercase().chars().collect();

        let mut scored: Vec<(usize, u32)> = self
            .all_files
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.accept.accepts(&entry.path))
            .filter_map(|(idx, entry)| match_score(&entry.display, &needle).map(|s| (idx, s)))
            .collect();

        // Stable sort keeps alphabetical order among equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        self.visible = scored
            .into_iter()
            .take(MAX_DISPLAY_RESULTS)
            .map(|(idx, _)| idx)
            .collect();
        self.selected = self.selected.min(self.visible.len().saturating_sub(1));
    }
}

/// Walk `root` (respecting `.gitignore`) and list its files sorted by
/// their display path.
fn scan_files(root: &Path) -> Vec<FileEntry> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !matches!(name.as_ref(), ".git" | "target" | "node_modules")
        })
        .build();

    let mut files = Vec::new();
    for entry in walker.flatten() {
        if files.len() >= MAX_FILES_SCAN {
            tracing::debug!(limit = MAX_FILES_SCAN, "File picker scan truncated");
            break;
        }
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.into_path();
        let display = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        if display.is_empty() {
            continue;
        }
        files.push(FileEntry { display, path });
    }

    files.sort_by(|a, b| a.display.cmp(&b.display));
    files
}

/// Subsequence match of `needle` in `path`, case-insensitive.
///
/// `None` when some needle character is missing. Consecutive hits and hits
/// inside the file name (after the last `/`) score higher.
fn match_score(path: &str, needle: &[char]) -> Option<u32> {
    if needle.is_empty() {
        return Some(0);
    }

    let haystack: Vec<char> = path.to_lowercase().chars().collect();
    let name_start = haystack
        .iter()
        .rposition(|&c| c == '/')
        .map_or(0, |i| i + 1);

    let mut score = 0u32;
    let mut want = needle.iter().peekable();
    let mut last_hit: Option<usize> = None;

    for (i, c) in haystack.iter().enumerate() {
        let Some(&&next) = want.peek() else { break };
        if *c != next {
            continue;
        }
        want.next();
        score += 1;
        if last_hit.is_some_and(|prev| prev + 1 == i) {
            score += 4;
        }
        if i >= name_start {
            score += 2;
        }
        last_hit = Some(i);
    }

    want.peek().is_none().then_some(score)
}
