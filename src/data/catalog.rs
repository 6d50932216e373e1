use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use walkdir::WalkDir;

use super::model::DataFile;

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Whether `name` ends with one of `extensions`, ignoring case.
pub fn has_extension(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(&ext.to_lowercase()))
}

/// Recursively collect files under `root` whose name ends with one of
/// `extensions`.  Unreadable directories are skipped.  Entries are visited
/// in file-name order so repeated scans return the same sequence.
pub fn scan(root: &Path, extensions: &[String]) -> Vec<DataFile> {
    scan_until(root, extensions, &AtomicBool::new(false)).unwrap_or_default()
}

/// Like [`scan`] but checks `cancel` between entries; `None` when cancelled.
pub fn scan_until(root: &Path, extensions: &[String], cancel: &AtomicBool) -> Option<Vec<DataFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("Scan of {} cancelled", root.display());
            return None;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if has_extension(&name, extensions) {
            files.push(DataFile::new(entry.path()));
        }
    }

    Some(files)
}

/// Case-insensitive substring match on file names, extension included.
/// Pure; never touches the filesystem.
pub fn filter(catalog: &[DataFile], text: &str) -> Vec<DataFile> {
    let needle = text.to_lowercase();
    catalog
        .iter()
        .filter(|f| f.file_name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Background scan
// ---------------------------------------------------------------------------

/// A scan running on its own thread.  Cancellation is cooperative: the
/// walker polls a shared flag between entries.
pub struct ScanTask {
    root: PathBuf,
    cancel: Arc<AtomicBool>,
    rx: mpsc::Receiver<Vec<DataFile>>,
}

impl ScanTask {
    pub fn spawn(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        let root = root.into();
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let worker_root = root.clone();
        let worker_cancel = Arc::clone(&cancel);
        thread::spawn(move || {
            if let Some(files) = scan_until(&worker_root, &extensions, &worker_cancel) {
                // Receiver gone means the caller stopped waiting.
                let _ = tx.send(files);
            }
        });

        ScanTask { root, cancel, rx }
    }

    /// Ask the worker to stop at its next entry.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Block until the scan finishes or `timeout` elapses.  On timeout the
    /// worker is cancelled and no files are reported.
    pub fn wait(self, timeout: Duration) -> Vec<DataFile> {
        match self.rx.recv_timeout(timeout) {
            Ok(files) => {
                log::info!("Found {} data files under {}", files.len(), self.root.display());
                files
            }
            Err(RecvTimeoutError::Timeout) => {
                self.cancel();
                log::warn!(
                    "Scan of {} aborted after {:.1}s",
                    self.root.display(),
                    timeout.as_secs_f64()
                );
                Vec::new()
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Scan of {} cancelled", self.root.display());
                Vec::new()
            }
        }
    }
}

impl Drop for ScanTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
