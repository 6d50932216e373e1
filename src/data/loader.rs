use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result, bail};

use super::model::{DataFile, DecimalSeparator, Table, TableCache};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// A file that could not be parsed.  The batch keeps going without it.
#[derive(Debug, Clone)]
pub struct LoadError {
    pub file: DataFile,
    pub message: String,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.file_name(), self.message)
    }
}

/// Result of one load cycle: every file lands in exactly one of the two.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub tables: TableCache,
    pub errors: Vec<LoadError>,
}

/// Fully parse `files`.  A failing file becomes an error entry and is absent
/// from `tables`; it never aborts its siblings.
pub fn load(files: &[DataFile], decimal: DecimalSeparator) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    for file in files {
        match read_table(file, decimal, None) {
            Ok(table) => {
                log::debug!(
                    "Loaded {} rows x {} columns from {}",
                    table.len(),
                    table.columns.len(),
                    file.path.display()
                );
                outcome.tables.insert(file.path.clone(), table);
            }
            Err(e) => {
                log::warn!("Failed to load {}: {e:#}", file.path.display());
                outcome.errors.push(LoadError {
                    file: file.clone(),
                    message: format!("{e:#}"),
                });
            }
        }
    }

    log::info!(
        "Loaded {} of {} files ({} failed)",
        outcome.tables.len(),
        files.len(),
        outcome.errors.len()
    );
    outcome
}

/// First `rows` rows of each file, or the reason it could not be read.
pub fn preview(
    files: &[DataFile],
    decimal: DecimalSeparator,
    rows: usize,
) -> Vec<(DataFile, Result<Table, String>)> {
    files
        .iter()
        .map(|file| {
            let table = read_table(file, decimal, Some(rows)).map_err(|e| format!("Failed: {e:#}"));
            (file.clone(), table)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tab-delimited reader
// ---------------------------------------------------------------------------

/// Layout: one header row, then one record per line, fields separated by
/// tabs.  Short records are padded with empty cells; records wider than the
/// header are rejected.
///
/// `limit` caps the number of data rows read (schema sampling).
pub fn read_table(file: &DataFile, decimal: DecimalSeparator, limit: Option<usize>) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_path(&file.path)
        .with_context(|| format!("opening {}", file.path.display()))?;

    let raw_headers = reader.headers().context("reading header row")?.clone();
    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
        bail!("No columns to parse from file");
    }
    let columns = dedupe_headers(raw_headers.iter());
    let width = columns.len();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        if limit.is_some_and(|n| row_no >= n) {
            break;
        }
        // +2: 1-based lines, header on line 1
        let line = row_no + 2;
        let record = result.with_context(|| format!("reading line {line}"))?;

        if record.len() > width {
            bail!("Expected {width} fields in line {line}, saw {}", record.len());
        }

        let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(Table {
        source: file.clone(),
        columns,
        rows,
        decimal,
    })
}

/// Repeated header names get a `.N` suffix: `X`, `X.1`, `X.2`, ...
fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for header in raw {
        let mut name = header.to_string();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{header}.{n}");
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> DataFile {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        DataFile::new(path)
    }

    #[test]
    fn reads_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let f = write(&dir, "a.txt", "Time\tRPM\n0\t1000\n1\t1200\n");
        let table = read_table(&f, DecimalSeparator::Dot, None).unwrap();
        assert_eq!(table.columns, vec!["Time", "RPM"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("RPM").unwrap(), vec!["1000", "1200"]);
    }

    #[test]
    fn short_rows_are_padded_and_wide_rows_fail() {
        let dir = tempfile::tempdir().unwrap();
        let short = write(&dir, "short.txt", "A\tB\tC\n1\t2\n");
        let table = read_table(&short, DecimalSeparator::Dot, None).unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);

        let wide = write(&dir, "wide.txt", "A\tB\n1\t2\t3\n");
        let err = read_table(&wide, DecimalSeparator::Dot, None).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn duplicate_headers_get_suffix() {
        let cols = dedupe_headers(["T", "X", "X", "X.1", "X"].into_iter());
        assert_eq!(cols, vec!["T", "X", "X.1", "X.1.1", "X.2"]);
    }

    #[test]
    fn limit_caps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let f = write(&dir, "a.txt", "A\n1\n2\n3\n4\n");
        let table = read_table(&f, DecimalSeparator::Dot, Some(2)).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn batch_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(&dir, "good.txt", "A\tB\n1\t2\n");
        let empty = write(&dir, "empty.txt", "");
        let missing = DataFile::new(dir.path().join("missing.txt"));

        let outcome = load(&[good.clone(), empty, missing], DecimalSeparator::Dot);
        assert_eq!(outcome.tables.len(), 1);
        assert!(outcome.tables.contains_key(&good.path));
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors[0].to_string().starts_with("empty.txt: "));
    }

    #[test]
    fn preview_reports_failures_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(&dir, "good.txt", "A\n1\n2\n3\n");
        let missing = DataFile::new(dir.path().join("nope.txt"));
        let previews = preview(&[good, missing], DecimalSeparator::Dot, 2);
        assert_eq!(previews[0].1.as_ref().unwrap().len(), 2);
        assert!(previews[1].1.as_ref().unwrap_err().starts_with("Failed: "));
    }
}
