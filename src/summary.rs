use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::axis::AxisBinding;
use crate::data::filter::{TimeWindow, included_indices};
use crate::data::model::{DataFile, TableCache};
use crate::data::time;
use crate::error::RequestError;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMetric {
    Mean,
    Median,
    Min,
    Max,
    Std,
}

impl SummaryMetric {
    pub const ALL: [SummaryMetric; 5] = [
        SummaryMetric::Mean,
        SummaryMetric::Median,
        SummaryMetric::Min,
        SummaryMetric::Max,
        SummaryMetric::Std,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SummaryMetric::Mean => "mean",
            SummaryMetric::Median => "median",
            SummaryMetric::Min => "min",
            SummaryMetric::Max => "max",
            SummaryMetric::Std => "std",
        }
    }

    /// Evaluate over non-missing values.  `None` for an empty slice, and for
    /// `Std` with fewer than two values.
    pub fn compute(self, values: &[f64]) -> Option<f64> {
        match self {
            SummaryMetric::Mean => mean(values),
            SummaryMetric::Median => median(values),
            SummaryMetric::Min => values.iter().copied().reduce(f64::min),
            SummaryMetric::Max => values.iter().copied().reduce(f64::max),
            SummaryMetric::Std => sample_std(values),
        }
    }
}

impl fmt::Display for SummaryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SummaryMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(SummaryMetric::Mean),
            "median" => Ok(SummaryMetric::Median),
            "min" => Ok(SummaryMetric::Min),
            "max" => Ok(SummaryMetric::Max),
            "std" | "std dev" | "stddev" => Ok(SummaryMetric::Std),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// 50th percentile, averaging the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Sample standard deviation (N - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

// ---------------------------------------------------------------------------
// MetricSet – non-empty, ordered request
// ---------------------------------------------------------------------------

/// Requested metrics in request order, without repeats.  Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSet(Vec<SummaryMetric>);

impl Default for MetricSet {
    fn default() -> Self {
        MetricSet(vec![SummaryMetric::Mean])
    }
}

impl MetricSet {
    /// `None` when `metrics` is empty.
    pub fn new(metrics: impl IntoIterator<Item = SummaryMetric>) -> Option<Self> {
        let mut out: Vec<SummaryMetric> = Vec::new();
        for m in metrics {
            if !out.contains(&m) {
                out.push(m);
            }
        }
        (!out.is_empty()).then_some(MetricSet(out))
    }

    /// Operator text: a preset (`mean`, `median`, `min/max`, `std dev`) or a
    /// comma-separated list.  Unknown names are dropped; nothing valid means
    /// `{mean}`.
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("min/max") {
            return MetricSet(vec![SummaryMetric::Min, SummaryMetric::Max]);
        }
        let chosen = text.split(',').filter_map(|part| match part.parse::<SummaryMetric>() {
            Ok(m) => Some(m),
            Err(e) => {
                if !part.trim().is_empty() {
                    log::debug!("Dropping {e}");
                }
                None
            }
        });
        MetricSet::new(chosen).unwrap_or_default()
    }

    pub fn as_slice(&self) -> &[SummaryMetric] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = SummaryMetric> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

/// One file's statistics.  `values` holds, for each column in
/// [`SummaryTable::columns`], one entry per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub file: DataFile,
    /// Rows inside the time window.
    pub samples: usize,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub metrics: Vec<SummaryMetric>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// `File`, then `<column>-<metric>` for every pairing.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["File".to_string()];
        for col in &self.columns {
            for m in &self.metrics {
                header.push(format!("{col}-{m}"));
            }
        }
        header
    }

    fn position(&self, column: &str, metric: SummaryMetric) -> Option<usize> {
        let c = self.columns.iter().position(|x| x == column)?;
        let m = self.metrics.iter().position(|x| *x == metric)?;
        Some(c * self.metrics.len() + m)
    }

    pub fn row(&self, display_name: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.file.display_name == display_name)
    }

    /// Outer `None`: no such file/column/metric.  Inner `None`: missing value.
    pub fn lookup(&self, display_name: &str, column: &str, metric: SummaryMetric) -> Option<Option<f64>> {
        let pos = self.position(column, metric)?;
        self.row(display_name).map(|r| r.values[pos])
    }
}

/// Statistics for every loaded table that has `time_column`, restricted to
/// rows inside `window`.  Tables without the time column are left out;
/// a bound column a table lacks yields missing values for that table.
pub fn compute(
    tables: &TableCache,
    axes: &AxisBinding,
    time_column: &str,
    metrics: &MetricSet,
    window: &TimeWindow,
) -> Result<SummaryTable, RequestError> {
    if time_column.trim().is_empty() {
        return Err(RequestError::MissingTimeColumn);
    }
    let columns: Vec<String> = axes.bound_columns().into_iter().map(str::to_string).collect();
    if columns.is_empty() {
        return Err(RequestError::NoBoundColumns);
    }

    let mut rows = Vec::new();
    for table in tables.values() {
        let Some(elapsed) = time::normalize(table, time_column) else {
            log::debug!("{} has no column '{time_column}', skipping", table.source.display_name);
            continue;
        };
        let included = included_indices(&elapsed, window);

        let mut values = Vec::with_capacity(columns.len() * metrics.len());
        for col in &columns {
            let slice: Vec<f64> = match table.column_index(col) {
                Some(idx) => included
                    .iter()
                    .filter_map(|&r| table.decimal.parse_number(&table.rows[r][idx]))
                    .collect(),
                None => Vec::new(),
            };
            values.extend(metrics.iter().map(|m| m.compute(&slice)));
        }

        rows.push(SummaryRow {
            file: table.source.clone(),
            samples: included.len(),
            values,
        });
    }

    log::info!(
        "Summarised {} of {} tables over {} columns",
        rows.len(),
        tables.len(),
        columns.len()
    );

    Ok(SummaryTable {
        columns,
        metrics: metrics.as_slice().to_vec(),
        rows,
    })
}
