use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// DecimalSeparator – locale of numeric literals in a file
// ---------------------------------------------------------------------------

/// Decimal separator used by numeric fields.  Configured per load, never
/// auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DecimalSeparator {
    #[default]
    #[serde(rename = ".")]
    Dot,
    #[serde(rename = ",")]
    Comma,
}

/// Cell texts that count as "no value" rather than as unparseable text.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl DecimalSeparator {
    pub fn as_char(self) -> char {
        match self {
            DecimalSeparator::Dot => '.',
            DecimalSeparator::Comma => ',',
        }
    }

    /// Classify a raw cell as empty, numeric or text under this separator.
    ///
    /// With `,` as separator a literal containing `.` is text, just as `1,5`
    /// is text under `.`.
    pub fn classify(self, raw: &str) -> CellValue {
        let s = raw.trim();
        if MISSING_MARKERS.contains(&s) {
            return CellValue::Empty;
        }
        let parsed = match self {
            DecimalSeparator::Dot => s.parse::<f64>(),
            DecimalSeparator::Comma => {
                if s.contains('.') {
                    return CellValue::Text;
                }
                s.replacen(',', ".", 1).parse::<f64>()
            }
        };
        match parsed {
            Ok(v) if v.is_nan() => CellValue::Empty,
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text,
        }
    }

    /// Numeric coercion: unparseable and empty cells both become `None`.
    pub fn parse_number(self, raw: &str) -> Option<f64> {
        self.classify(raw).as_f64()
    }

    /// Render a number with this separator (shortest round-trip form).
    pub fn format_number(self, value: f64) -> String {
        let text = value.to_string();
        match self {
            DecimalSeparator::Dot => text,
            DecimalSeparator::Comma => text.replace('.', ","),
        }
    }
}

impl fmt::Display for DecimalSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for DecimalSeparator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "." => Ok(DecimalSeparator::Dot),
            "," => Ok(DecimalSeparator::Comma),
            other => Err(ConfigError::DecimalSeparator(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// CellValue – a coerced cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text,
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DataFile – one discovered log file
// ---------------------------------------------------------------------------

/// A discovered file.  Ordered by path so catalogs and caches iterate
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataFile {
    pub path: PathBuf,
    /// File stem shown to the operator and used to key summary rows.
    pub display_name: String,
}

impl DataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_stem()
            .or_else(|| path.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        DataFile { path, display_name }
    }

    /// File name including the extension, for error messages.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display_name.clone())
    }
}

impl From<&Path> for DataFile {
    fn from(path: &Path) -> Self {
        DataFile::new(path)
    }
}

// ---------------------------------------------------------------------------
// Table – parsed contents of one DataFile
// ---------------------------------------------------------------------------

/// Raw cells of one file.  Every row has exactly `columns.len()` cells;
/// values stay as text and are coerced on use with `decimal`.
#[derive(Debug, Clone)]
pub struct Table {
    pub source: DataFile,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub decimal: DecimalSeparator,
}

impl Table {
    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Raw values of one column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Column coerced to numbers; unparseable cells are missing.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let decimal = self.decimal;
        self.column(name)
            .map(|cells| cells.into_iter().map(|c| decimal.parse_number(c)).collect())
    }

    /// One row as a column-name → raw value mapping.
    pub fn row(&self, index: usize) -> Option<BTreeMap<&str, &str>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter().map(String::as_str))
                .collect(),
        )
    }
}

/// Parsed tables of one load cycle, keyed by file path.  Replaced wholesale
/// by every load.
pub type TableCache = BTreeMap<PathBuf, Table>;
