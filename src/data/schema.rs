use std::collections::BTreeSet;

use super::loader::read_table;
use super::model::{CellValue, DataFile, DecimalSeparator};

// ---------------------------------------------------------------------------
// Column choices offered to the operator
// ---------------------------------------------------------------------------

/// Candidate columns across a set of files, both sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnChoices {
    pub numeric: Vec<String>,
    pub time: Vec<String>,
}

/// Numeric and time candidates for `files`.  When no header looks like a
/// time column, the first numeric column is offered instead.
pub fn inspect_columns(
    files: &[DataFile],
    decimal: DecimalSeparator,
    sample_rows: usize,
    header_rows: usize,
    time_tokens: &[String],
) -> ColumnChoices {
    let numeric: Vec<String> = infer_numeric_columns(files, decimal, sample_rows)
        .into_iter()
        .collect();
    let mut time: Vec<String> = infer_time_columns(files, decimal, header_rows, time_tokens)
        .into_iter()
        .collect();

    if time.is_empty() {
        if let Some(first) = numeric.first() {
            time.push(first.clone());
        }
    }

    ColumnChoices { numeric, time }
}

/// Union over `files` of the columns whose first `sample_rows` cells all
/// coerce to numbers (empty cells allowed).  Unreadable files contribute
/// nothing.
pub fn infer_numeric_columns(
    files: &[DataFile],
    decimal: DecimalSeparator,
    sample_rows: usize,
) -> BTreeSet<String> {
    let mut cols = BTreeSet::new();

    for file in files {
        let table = match read_table(file, decimal, Some(sample_rows)) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("Skipping {} during column inference: {e:#}", file.path.display());
                continue;
            }
        };

        for (idx, name) in table.columns.iter().enumerate() {
            let numeric = table
                .rows
                .iter()
                .all(|row| decimal.classify(&row[idx]) != CellValue::Text);
            if numeric {
                cols.insert(name.clone());
            }
        }
    }

    cols
}

/// Whether a header names a time/date quantity.
pub fn is_time_column(name: &str, tokens: &[String]) -> bool {
    let lower = name.to_lowercase();
    tokens.iter().any(|t| lower.contains(&t.to_lowercase()))
}

/// Union over `files` of headers matching [`is_time_column`].  Only names
/// are considered, never values.
pub fn infer_time_columns(
    files: &[DataFile],
    decimal: DecimalSeparator,
    header_rows: usize,
    tokens: &[String],
) -> BTreeSet<String> {
    files
        .iter()
        .filter_map(|f| read_table(f, decimal, Some(header_rows)).ok())
        .flat_map(|t| t.columns.into_iter())
        .filter(|c| is_time_column(c, tokens))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn tokens() -> Vec<String> {
        ["time", "zaman", "date"].iter().map(|s| s.to_string()).collect()
    }

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> DataFile {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        DataFile::new(path)
    }

    #[test]
    fn numeric_columns_are_unioned() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.txt", "Time\tRPM\tNote\n0\t1000\tok\n1\t\tok\n");
        let b = write(&dir, "b.txt", "Time\tNote\tTorque\n0\t5\t12,5\n");

        let only_a = infer_numeric_columns(&[a.clone()], DecimalSeparator::Dot, 10);
        assert_eq!(only_a.into_iter().collect::<Vec<_>>(), vec!["RPM", "Time"]);

        let both = infer_numeric_columns(&[a, b], DecimalSeparator::Dot, 10);
        // Note is numeric in b; Torque uses a comma so it is text under '.'
        assert_eq!(both.into_iter().collect::<Vec<_>>(), vec!["Note", "RPM", "Time"]);
    }

    #[test]
    fn sample_rows_bound_the_check() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.txt", "X\n1\n2\nbad\n");
        assert!(infer_numeric_columns(&[a.clone()], DecimalSeparator::Dot, 2).contains("X"));
        assert!(!infer_numeric_columns(&[a], DecimalSeparator::Dot, 3).contains("X"));
    }

    #[test]
    fn time_columns_match_tokens() {
        assert!(is_time_column("Zaman [s]", &tokens()));
        assert!(is_time_column("DateTime", &tokens()));
        assert!(!is_time_column("RPM", &tokens()));
    }

    #[test]
    fn falls_back_to_first_numeric_column() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.txt", "Step\tRPM\n0\t1000\n");
        let choices = inspect_columns(&[a], DecimalSeparator::Dot, 10, 5, &tokens());
        assert_eq!(choices.numeric, vec!["RPM", "Step"]);
        assert_eq!(choices.time, vec!["RPM"]);
    }

    #[test]
    fn no_files_no_choices() {
        let choices = inspect_columns(&[], DecimalSeparator::Dot, 10, 5, &tokens());
        assert_eq!(choices, ColumnChoices::default());
    }
}
