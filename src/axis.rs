use crate::error::AxisError;

// ---------------------------------------------------------------------------
// Axis slots
// ---------------------------------------------------------------------------

/// Canonical slot names, by position.
pub const AXIS_NAMES: [&str; 4] = ["Primary Y", "Secondary Y", "Tertiary Y", "Quaternary Y"];

pub const MAX_AXES: usize = AXIS_NAMES.len();

/// One slot as seen by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSlot {
    pub name: &'static str,
    pub column: Option<String>,
}

/// Ordered list of 1..=4 slots.  Names are derived from position, so
/// removing a slot renames the ones after it.
///
/// Bound columns are not checked against any table here; consumers skip a
/// column that a given table lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisBinding {
    columns: Vec<Option<String>>,
}

impl Default for AxisBinding {
    fn default() -> Self {
        AxisBinding { columns: vec![None] }
    }
}

impl AxisBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind slots in order, one per column (at most four).
    pub fn with_columns<I, S>(columns: I) -> Result<Self, AxisError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut binding = AxisBinding { columns: Vec::new() };
        for col in columns {
            if binding.columns.len() == MAX_AXES {
                return Err(AxisError::Capacity { max: MAX_AXES });
            }
            binding.columns.push(Some(col.into()));
        }
        if binding.columns.is_empty() {
            binding.columns.push(None);
        }
        Ok(binding)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no slot exists; a binding holds at least one.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Append the next canonical slot.  Returns its index.
    pub fn add_slot(&mut self) -> Result<usize, AxisError> {
        if self.columns.len() >= MAX_AXES {
            return Err(AxisError::Capacity { max: MAX_AXES });
        }
        self.columns.push(None);
        Ok(self.columns.len() - 1)
    }

    pub fn remove_slot(&mut self, index: usize) -> Result<(), AxisError> {
        if self.columns.len() <= 1 {
            return Err(AxisError::LastSlot);
        }
        self.check_index(index)?;
        self.columns.remove(index);
        Ok(())
    }

    /// Set or clear (`None` or `""`) the column of one slot.  The name is
    /// stored as given; headers are matched exactly, surrounding spaces
    /// included.
    pub fn bind(&mut self, index: usize, column: Option<&str>) -> Result<(), AxisError> {
        self.check_index(index)?;
        self.columns[index] = column.filter(|c| !c.is_empty()).map(str::to_string);
        Ok(())
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(|c| c.as_deref())
    }

    pub fn snapshot(&self) -> Vec<AxisSlot> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| AxisSlot {
                name: AXIS_NAMES[i],
                column: column.clone(),
            })
            .collect()
    }

    /// Bound columns in slot order, each listed once.
    pub fn bound_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for col in self.columns.iter().flatten() {
            if !out.contains(&col.as_str()) {
                out.push(col);
            }
        }
        out
    }

    /// Bind each empty slot `i` to `numeric[i]`, or to `numeric[0]` when
    /// there are fewer candidates than slots.
    pub fn fill_unbound(&mut self, numeric: &[String]) {
        let Some(first) = numeric.first() else {
            return;
        };
        for (i, slot) in self.columns.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(numeric.get(i).unwrap_or(first).clone());
            }
        }
    }

    fn check_index(&self, index: usize) -> Result<(), AxisError> {
        if index >= self.columns.len() {
            return Err(AxisError::IndexOutOfRange {
                index,
                len: self.columns.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_four() {
        let mut axes = AxisBinding::new();
        for _ in 0..3 {
            axes.add_slot().unwrap();
        }
        assert_eq!(axes.len(), 4);
        assert_eq!(axes.add_slot(), Err(AxisError::Capacity { max: 4 }));
        assert_eq!(axes.len(), 4);
    }

    #[test]
    fn last_slot_cannot_be_removed() {
        let mut axes = AxisBinding::new();
        assert_eq!(axes.remove_slot(0), Err(AxisError::LastSlot));
        assert_eq!(axes.len(), 1);
    }

    #[test]
    fn removal_renames_remaining_slots() {
        let mut axes = AxisBinding::with_columns(["RPM", "Temp", "Torque"]).unwrap();
        axes.remove_slot(0).unwrap();
        let snap = axes.snapshot();
        assert_eq!(snap[0], AxisSlot { name: "Primary Y", column: Some("Temp".into()) });
        assert_eq!(snap[1], AxisSlot { name: "Secondary Y", column: Some("Torque".into()) });
    }

    #[test]
    fn bind_and_clear() {
        let mut axes = AxisBinding::new();
        axes.bind(0, Some("RPM")).unwrap();
        assert_eq!(axes.column(0), Some("RPM"));
        axes.bind(0, Some("")).unwrap();
        assert_eq!(axes.column(0), None);
        axes.bind(0, Some("RPM")).unwrap();
        axes.bind(0, None).unwrap();
        assert_eq!(axes.column(0), None);
        assert!(matches!(axes.bind(2, Some("X")), Err(AxisError::IndexOutOfRange { index: 2, len: 1 })));
    }

    #[test]
    fn bind_keeps_padded_names() {
        let mut axes = AxisBinding::new();
        axes.bind(0, Some("RPM ")).unwrap();
        assert_eq!(axes.column(0), Some("RPM "));
        assert_eq!(axes.bound_columns(), vec!["RPM "]);
    }

    #[test]
    fn bound_columns_skip_empty_and_duplicates() {
        let mut axes = AxisBinding::with_columns(["RPM", "Temp", "RPM"]).unwrap();
        axes.add_slot().unwrap();
        assert_eq!(axes.bound_columns(), vec!["RPM", "Temp"]);
    }

    #[test]
    fn fill_unbound_uses_position() {
        let mut axes = AxisBinding::new();
        axes.add_slot().unwrap();
        axes.add_slot().unwrap();
        axes.bind(1, Some("Keep")).unwrap();
        axes.fill_unbound(&["A".to_string(), "B".to_string()]);
        assert_eq!(axes.column(0), Some("A"));
        assert_eq!(axes.column(1), Some("Keep"));
        assert_eq!(axes.column(2), Some("A"));
    }
}
