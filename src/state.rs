use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::axis::AxisBinding;
use crate::config::EngineConfig;
use crate::data::catalog::{self, ScanTask};
use crate::data::filter::TimeWindow;
use crate::data::loader::{self, LoadError, LoadOutcome};
use crate::data::model::{DataFile, DecimalSeparator, TableCache};
use crate::data::schema::{self, ColumnChoices};
use crate::error::RequestError;
use crate::export::{self, SeriesFrame};
use crate::settings::{LAST_FOLDER_KEY, SettingsStore};
use crate::summary::{self, MetricSet, SummaryTable};

// ---------------------------------------------------------------------------
// In-flight operations
// ---------------------------------------------------------------------------

/// A scan started by [`Session::start_scan`].
pub struct PendingScan {
    pub generation: u64,
    pub task: ScanTask,
}

/// Snapshot of what to load, taken when the load was requested.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub generation: u64,
    pub files: Vec<DataFile>,
    pub decimal: DecimalSeparator,
}

impl LoadRequest {
    /// Parse the snapshot.  Safe to run off the session's thread.
    pub fn run(self) -> LoadResponse {
        LoadResponse {
            generation: self.generation,
            outcome: loader::load(&self.files, self.decimal),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadResponse {
    pub generation: u64,
    pub outcome: LoadOutcome,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Everything an operator has chosen, independent of any presentation.
pub struct Session {
    pub config: EngineConfig,
    settings: Box<dyn SettingsStore>,

    /// Files found by the last accepted scan.
    pub catalog: Vec<DataFile>,

    pub filter_text: String,

    /// Catalog entries passing the name filter (cached).
    pub visible: Vec<DataFile>,

    /// Checked files, by path.
    pub selected: BTreeSet<PathBuf>,

    /// Tables of the last accepted load.
    pub tables: TableCache,
    pub load_errors: Vec<LoadError>,

    pub columns: ColumnChoices,
    pub axes: AxisBinding,
    pub time_column: Option<String>,
    pub window: TimeWindow,
    pub metrics: MetricSet,

    /// Status line for the presentation layer.
    pub status_message: Option<String>,

    scan_generation: u64,
    load_generation: u64,
}

impl Session {
    pub fn new(config: EngineConfig, settings: Box<dyn SettingsStore>) -> Self {
        Self {
            config,
            settings,
            catalog: Vec::new(),
            filter_text: String::new(),
            visible: Vec::new(),
            selected: BTreeSet::new(),
            tables: TableCache::new(),
            load_errors: Vec::new(),
            columns: ColumnChoices::default(),
            axes: AxisBinding::default(),
            time_column: None,
            window: TimeWindow::default(),
            metrics: MetricSet::default(),
            status_message: None,
            scan_generation: 0,
            load_generation: 0,
        }
    }

    pub fn last_folder(&self) -> Option<PathBuf> {
        self.settings.get(LAST_FOLDER_KEY).map(PathBuf::from)
    }

    // -- Scanning --

    /// Start a background scan.  Any scan started earlier becomes stale.
    pub fn start_scan(&mut self, root: &Path) -> PendingScan {
        self.scan_generation += 1;
        self.status_message = Some("Scanning folder…".to_string());
        PendingScan {
            generation: self.scan_generation,
            task: ScanTask::spawn(root, self.config.extensions.clone()),
        }
    }

    /// Install a scan result.  Returns `false` (and changes nothing) when a
    /// newer scan has been started since.
    pub fn finish_scan(&mut self, generation: u64, root: &Path, files: Vec<DataFile>) -> bool {
        if generation != self.scan_generation {
            log::debug!("Discarding stale scan #{generation} of {}", root.display());
            return false;
        }

        self.status_message = Some(format!("Found {} data files.", files.len()));
        self.catalog = files;
        self.selected.clear();
        self.refilter();
        self.refresh_columns();

        if let Err(e) = self.settings.set(LAST_FOLDER_KEY, &root.to_string_lossy()) {
            log::warn!("Could not remember last folder: {e}");
        }
        true
    }

    /// Scan `root` and wait for it, honoring the configured timeout.
    pub fn scan(&mut self, root: &Path) -> usize {
        let pending = self.start_scan(root);
        let files = pending.task.wait(self.config.scan_timeout());
        self.finish_scan(pending.generation, root, files);
        self.catalog.len()
    }

    // -- File selection --

    pub fn set_filter(&mut self, text: &str) {
        self.filter_text = text.to_string();
        self.refilter();
    }

    fn refilter(&mut self) {
        self.visible = catalog::filter(&self.catalog, &self.filter_text);
    }

    pub fn toggle(&mut self, path: &Path) {
        if !self.selected.remove(path) {
            self.selected.insert(path.to_path_buf());
        }
        self.refresh_columns();
    }

    pub fn select_all(&mut self) {
        self.selected = self.visible.iter().map(|f| f.path.clone()).collect();
        self.refresh_columns();
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
        self.refresh_columns();
    }

    /// Visible files that are checked, in catalog order.
    pub fn selected_files(&self) -> Vec<DataFile> {
        self.visible
            .iter()
            .filter(|f| self.selected.contains(&f.path))
            .cloned()
            .collect()
    }

    /// Re-infer column choices for the current selection.  Keeps the chosen
    /// time column if it is still offered; axis bindings are left alone.
    pub fn refresh_columns(&mut self) {
        let files = self.selected_files();
        self.columns = schema::inspect_columns(
            &files,
            self.config.decimal_separator,
            self.config.sample_rows,
            self.config.header_sample_rows,
            &self.config.time_tokens,
        );

        let keep = self
            .time_column
            .as_ref()
            .is_some_and(|c| self.columns.time.contains(c));
        if !keep {
            self.time_column = self.columns.time.first().cloned();
        }
    }

    // -- Loading --

    /// Snapshot the current selection for loading.  Earlier requests become
    /// stale.
    pub fn begin_load(&mut self) -> LoadRequest {
        self.load_generation += 1;
        LoadRequest {
            generation: self.load_generation,
            files: self.selected_files(),
            decimal: self.config.decimal_separator,
        }
    }

    /// Replace the table cache with `response`, unless it is stale.
    pub fn apply_load(&mut self, response: LoadResponse) -> bool {
        if response.generation != self.load_generation {
            log::debug!("Discarding stale load #{}", response.generation);
            return false;
        }
        let LoadOutcome { tables, errors } = response.outcome;
        if !errors.is_empty() {
            let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            self.status_message = Some(format!("File load errors:\n{}", lines.join("\n")));
        }
        self.tables = tables;
        self.load_errors = errors;
        true
    }

    pub fn load_selected(&mut self) {
        let request = self.begin_load();
        let response = request.run();
        self.apply_load(response);
    }

    // -- Analysis --

    fn check_request(&self) -> Result<&str, RequestError> {
        if self.selected_files().is_empty() {
            return Err(RequestError::NoFilesSelected);
        }
        self.time_column
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(RequestError::MissingTimeColumn)
    }

    /// Reload the selection and summarise it with the current bindings,
    /// window and metrics.
    pub fn summarize(&mut self) -> Result<SummaryTable, RequestError> {
        self.check_request()?;
        if self.axes.bound_columns().is_empty() {
            return Err(RequestError::NoBoundColumns);
        }
        self.load_selected();
        let time_column = self.check_request()?;
        summary::compute(&self.tables, &self.axes, time_column, &self.metrics, &self.window)
    }

    /// Reload the selection and merge its series for export.
    pub fn merged_series(&mut self) -> Result<SeriesFrame, RequestError> {
        self.check_request()?;
        self.load_selected();
        let time_column = self.check_request()?;
        export::merge_series(&self.tables, &self.axes, time_column)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::data::model::Table;
    use crate::settings::MemoryStore;
    use crate::summary::SummaryMetric;

    fn session() -> Session {
        Session::new(EngineConfig::default(), Box::new(MemoryStore::default()))
    }

    fn folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.txt"), "Time\tRPM\tTemp\n0.0\t1000\t80\n1.0\t1200\t85\n2.0\t1100\t90\n").unwrap();
        fs::write(dir.path().join("B.txt"), "Time\tRPM\n0.0\t900\n").unwrap();
        fs::write(dir.path().join("readme.md"), "ignored").unwrap();
        dir
    }

    #[test]
    fn scan_fills_catalog_and_remembers_folder() {
        let dir = folder();
        let mut s = session();
        assert_eq!(s.scan(dir.path()), 2);
        assert_eq!(s.visible.len(), 2);
        assert_eq!(s.last_folder().as_deref(), Some(dir.path()));
        assert_eq!(s.status_message.as_deref(), Some("Found 2 data files."));
    }

    #[test]
    fn stale_scan_is_discarded() {
        let dir = folder();
        let mut s = session();
        let first = s.start_scan(dir.path());
        let second = s.start_scan(dir.path());

        let files = first.task.wait(std::time::Duration::from_secs(10));
        assert!(!s.finish_scan(first.generation, dir.path(), files));
        assert!(s.catalog.is_empty());

        let files = second.task.wait(std::time::Duration::from_secs(10));
        assert!(s.finish_scan(second.generation, dir.path(), files));
        assert_eq!(s.catalog.len(), 2);
    }

    #[test]
    fn stale_load_is_discarded() {
        let dir = folder();
        let mut s = session();
        s.scan(dir.path());
        s.select_all();

        let old = s.begin_load();
        let new = s.begin_load();
        assert!(!s.apply_load(old.run()));
        assert!(s.tables.is_empty());
        assert!(s.apply_load(new.run()));
        assert_eq!(s.tables.len(), 2);
    }

    #[test]
    fn load_replaces_cache_wholesale() {
        let dir = folder();
        let mut s = session();
        s.scan(dir.path());
        s.tables.insert(
            PathBuf::from("/stale.txt"),
            Table {
                source: DataFile::new("/stale.txt"),
                columns: vec![],
                rows: vec![],
                decimal: DecimalSeparator::Dot,
            },
        );
        s.set_filter("a");
        s.select_all();
        s.load_selected();
        assert_eq!(s.tables.len(), 1);
        assert!(s.tables.keys().all(|p| p.ends_with("A.txt")));
    }

    #[test]
    fn selection_drives_column_choices() {
        let dir = folder();
        let mut s = session();
        s.scan(dir.path());
        assert!(s.columns.numeric.is_empty());
        s.select_all();
        assert_eq!(s.columns.numeric, vec!["RPM", "Temp", "Time"]);
        assert_eq!(s.time_column.as_deref(), Some("Time"));
    }

    #[test]
    fn summarize_end_to_end() {
        let dir = folder();
        let mut s = session();
        s.scan(dir.path());
        assert_eq!(s.summarize(), Err(RequestError::NoFilesSelected));

        s.select_all();
        assert_eq!(s.summarize(), Err(RequestError::NoBoundColumns));

        s.axes.bind(0, Some("RPM")).unwrap();
        s.window = TimeWindow::new(Some(0.0), Some(1.0));
        s.metrics = MetricSet::new([SummaryMetric::Mean, SummaryMetric::Max]).unwrap();
        let out = s.summarize().unwrap();
        assert_eq!(out.lookup("A", "RPM", SummaryMetric::Mean), Some(Some(1100.0)));
        assert_eq!(out.lookup("B", "RPM", SummaryMetric::Max), Some(Some(900.0)));
    }
}
