use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::axis::AxisBinding;
use crate::data::model::{DecimalSeparator, TableCache};
use crate::data::time;
use crate::error::{ExportError, RequestError};
use crate::summary::SummaryTable;

/// Header of the elapsed-time column in merged series.
pub const ELAPSED_HEADER: &str = "Time [s]";

// ---------------------------------------------------------------------------
// Merged series
// ---------------------------------------------------------------------------

/// Elapsed time plus bound columns for every loaded file, stacked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl SeriesFrame {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Concatenate the series of every table that has `time_column`.  Rows are
/// not aligned across files; a column a file lacks is missing in its rows.
pub fn merge_series(
    tables: &TableCache,
    axes: &AxisBinding,
    time_column: &str,
) -> Result<SeriesFrame, RequestError> {
    if time_column.trim().is_empty() {
        return Err(RequestError::MissingTimeColumn);
    }
    let bound = axes.bound_columns();

    let mut columns = vec![ELAPSED_HEADER.to_string()];
    columns.extend(bound.iter().map(|c| c.to_string()));

    let mut rows = Vec::new();
    for table in tables.values() {
        let Some(elapsed) = time::normalize(table, time_column) else {
            continue;
        };
        let series: Vec<Option<Vec<Option<f64>>>> =
            bound.iter().map(|col| table.numeric_column(col)).collect();

        for (i, t) in elapsed.into_iter().enumerate() {
            let mut row = Vec::with_capacity(columns.len());
            row.push(t);
            row.extend(series.iter().map(|s| s.as_ref().and_then(|values| values[i])));
            rows.push(row);
        }
    }

    Ok(SeriesFrame { columns, rows })
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Delimiter and number rendering of text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayout {
    pub delimiter: u8,
    pub decimal: DecimalSeparator,
}

impl TextLayout {
    pub const CSV: TextLayout = TextLayout {
        delimiter: b',',
        decimal: DecimalSeparator::Dot,
    };

    pub fn tab(decimal: DecimalSeparator) -> Self {
        TextLayout {
            delimiter: b'\t',
            decimal,
        }
    }

    /// Tab-delimited for `.tsv`/`.txt`, comma-delimited otherwise.
    pub fn for_path(path: &Path, decimal: DecimalSeparator) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "tsv" | "txt" => TextLayout::tab(decimal),
            _ => TextLayout::CSV,
        }
    }

    fn field(&self, value: Option<f64>) -> String {
        value.map(|v| self.decimal.format_number(v)).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Text(TextLayout),
    Spreadsheet,
}

impl SummaryFormat {
    /// `.xlsx` targets get a spreadsheet, everything else text.
    pub fn for_path(path: &Path) -> Self {
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
        if is_xlsx {
            SummaryFormat::Spreadsheet
        } else {
            SummaryFormat::Text(TextLayout::for_path(path, DecimalSeparator::Dot))
        }
    }
}

/// One spreadsheet cell.  Missing values are `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SerializedSummary {
    Text(String),
    Sheet(Vec<Vec<Cell>>),
}

/// Writes a grid of cells as a workbook.  Provided by the caller.
pub trait WorkbookWriter {
    fn write_workbook(&mut self, path: &Path, rows: &[Vec<Cell>]) -> std::io::Result<()>;
}

/// Header row followed by one row per file; see [`SummaryTable::header`].
pub fn summary_grid(summary: &SummaryTable) -> Vec<Vec<Cell>> {
    let mut grid = Vec::with_capacity(summary.rows.len() + 1);
    grid.push(summary.header().into_iter().map(Cell::Text).collect());
    for row in &summary.rows {
        let mut cells = vec![Cell::Text(row.file.display_name.clone())];
        cells.extend(row.values.iter().map(|v| v.map_or(Cell::Empty, Cell::Number)));
        grid.push(cells);
    }
    grid
}

pub fn serialize_summary(summary: &SummaryTable, format: SummaryFormat) -> Result<SerializedSummary, ExportError> {
    match format {
        SummaryFormat::Spreadsheet => Ok(SerializedSummary::Sheet(summary_grid(summary))),
        SummaryFormat::Text(layout) => {
            let mut buf = Vec::new();
            write_summary(summary, layout, &mut buf)?;
            Ok(SerializedSummary::Text(String::from_utf8_lossy(&buf).into_owned()))
        }
    }
}

pub fn write_summary<W: Write>(summary: &SummaryTable, layout: TextLayout, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(layout.delimiter)
        .from_writer(out);
    writer.write_record(summary.header())?;
    for row in &summary.rows {
        let mut record = vec![row.file.display_name.clone()];
        record.extend(row.values.iter().map(|v| layout.field(*v)));
        writer.write_record(&record)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_series<W: Write>(frame: &SeriesFrame, layout: TextLayout, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(layout.delimiter)
        .from_writer(out);
    writer.write_record(&frame.columns)?;
    for row in &frame.rows {
        writer.write_record(row.iter().map(|v| layout.field(*v)))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write merged series to `path`.  Nothing is created when the frame is
/// empty.
pub fn export_series(frame: &SeriesFrame, path: &Path, layout: TextLayout) -> Result<(), ExportError> {
    if frame.is_empty() {
        return Err(ExportError::NoData);
    }
    write_series(frame, layout, create(path)?)?;
    log::info!("Data exported: {}", path.display());
    Ok(())
}

/// Write a summary to `path`, choosing the format from its extension.
/// Spreadsheets go through `workbook`.
pub fn export_summary(
    summary: &SummaryTable,
    path: &Path,
    workbook: Option<&mut dyn WorkbookWriter>,
) -> Result<(), ExportError> {
    match serialize_summary(summary, SummaryFormat::for_path(path))? {
        SerializedSummary::Text(text) => {
            create(path)?
                .write_all(text.as_bytes())
                .map_err(|source| ExportError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        SerializedSummary::Sheet(grid) => {
            let writer = workbook.ok_or_else(|| ExportError::SpreadsheetUnavailable(PathBuf::from(path)))?;
            writer
                .write_workbook(path, &grid)
                .map_err(|source| ExportError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
    }
    log::info!("Summary exported: {}", path.display());
    Ok(())
}

/// Value as shown in a summary preview: six decimals, blank when missing.
pub fn preview_value(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let rounded = (v * 1e6).round() / 1e6;
            format!("{rounded}")
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DataFile, Table};
    use crate::summary::{MetricSet, SummaryMetric, SummaryRow};

    fn table(name: &str, columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            source: DataFile::new(format!("/data/{name}.txt")),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            decimal: DecimalSeparator::Dot,
        }
    }

    fn cache(tables: Vec<Table>) -> TableCache {
        tables.into_iter().map(|t| (t.source.path.clone(), t)).collect()
    }

    fn summary() -> SummaryTable {
        SummaryTable {
            columns: vec!["RPM".into()],
            metrics: MetricSet::new([SummaryMetric::Mean, SummaryMetric::Std]).unwrap().as_slice().to_vec(),
            rows: vec![SummaryRow {
                file: DataFile::new("/data/A.txt"),
                samples: 1,
                values: vec![Some(1100.5), None],
            }],
        }
    }

    #[test]
    fn series_are_concatenated_not_aligned() {
        let tables = cache(vec![
            table("a", &["Time", "RPM"], &[&["0", "1000"], &["1", "1100"]]),
            table("b", &["Time", "Temp"], &[&["5", "80"]]),
            table("c", &["Other"], &[&["1"]]),
        ]);
        let axes = AxisBinding::with_columns(["RPM", "Temp"]).unwrap();
        let frame = merge_series(&tables, &axes, "Time").unwrap();

        assert_eq!(frame.columns, vec!["Time [s]", "RPM", "Temp"]);
        assert_eq!(
            frame.rows,
            vec![
                vec![Some(0.0), Some(1000.0), None],
                vec![Some(1.0), Some(1100.0), None],
                vec![Some(5.0), None, Some(80.0)],
            ]
        );
    }

    #[test]
    fn summary_text_leaves_missing_blank() {
        let SerializedSummary::Text(text) =
            serialize_summary(&summary(), SummaryFormat::Text(TextLayout::CSV)).unwrap()
        else {
            panic!("expected text");
        };
        assert_eq!(text, "File,RPM-mean,RPM-std\nA,1100.5,\n");
    }

    #[test]
    fn summary_grid_layout() {
        let grid = summary_grid(&summary());
        assert_eq!(grid[0][1], Cell::Text("RPM-mean".into()));
        assert_eq!(grid[1], vec![Cell::Text("A".into()), Cell::Number(1100.5), Cell::Empty]);
    }

    #[test]
    fn series_with_comma_decimal() {
        let frame = SeriesFrame {
            columns: vec![ELAPSED_HEADER.into(), "T".into()],
            rows: vec![vec![Some(0.5), None]],
        };
        let mut buf = Vec::new();
        write_series(&frame, TextLayout::tab(DecimalSeparator::Comma), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Time [s]\tT\n0,5\t\n");
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(SummaryFormat::for_path(Path::new("out.XLSX")), SummaryFormat::Spreadsheet);
        assert_eq!(
            SummaryFormat::for_path(Path::new("out.tsv")),
            SummaryFormat::Text(TextLayout::tab(DecimalSeparator::Dot))
        );
        assert_eq!(SummaryFormat::for_path(Path::new("out.csv")), SummaryFormat::Text(TextLayout::CSV));
    }

    #[test]
    fn spreadsheet_needs_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.xlsx");
        let err = export_summary(&summary(), &path, None).unwrap_err();
        assert!(matches!(err, ExportError::SpreadsheetUnavailable(_)));
        assert!(!path.exists());
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("s.csv");
        let err = export_summary(&summary(), &path, None).unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }

    #[test]
    fn empty_series_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let err = export_series(&SeriesFrame::default(), &path, TextLayout::CSV).unwrap_err();
        assert!(matches!(err, ExportError::NoData));
    }

    #[test]
    fn preview_rounds_to_six_places() {
        assert_eq!(preview_value(Some(1.23456789)), "1.234568");
        assert_eq!(preview_value(None), "");
    }
}
