use super::time::parse_timestamp;

// ---------------------------------------------------------------------------
// Time window: which rows contribute to a summary
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` range in elapsed seconds.  A missing bound leaves
/// that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Parse one bound.  Only plain numbers are honored: blank text, garbage
/// and calendar timestamps all leave the bound open.
pub fn parse_bound(text: &str) -> Option<f64> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if !v.is_nan() => Some(v),
        _ => {
            if parse_timestamp(s).is_some() {
                log::debug!("Ignoring calendar timestamp '{s}' as a window bound");
            }
            None
        }
    }
}

impl TimeWindow {
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        TimeWindow { start, end }
    }

    /// Build a window from operator text, see [`parse_bound`].
    pub fn parse(start: &str, end: &str) -> Self {
        TimeWindow::new(parse_bound(start), parse_bound(end))
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A row with no elapsed value fails any bound that is set.
    pub fn contains(&self, elapsed: Option<f64>) -> bool {
        let after_start = match self.start {
            None => true,
            Some(s) => elapsed.is_some_and(|e| e >= s),
        };
        let before_end = match self.end {
            None => true,
            Some(end) => elapsed.is_some_and(|e| e <= end),
        };
        after_start && before_end
    }

    /// Inclusion mask over a whole elapsed series.
    pub fn mask(&self, elapsed: &[Option<f64>]) -> Vec<bool> {
        elapsed.iter().map(|e| self.contains(*e)).collect()
    }
}

/// Indices of rows inside `window`.
pub fn included_indices(elapsed: &[Option<f64>], window: &TimeWindow) -> Vec<usize> {
    elapsed
        .iter()
        .enumerate()
        .filter(|(_, e)| window.contains(**e))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let w = TimeWindow::new(Some(0.0), Some(1.0));
        let elapsed = [Some(0.0), Some(1.0), Some(2.0), None];
        assert_eq!(w.mask(&elapsed), vec![true, true, false, false]);
    }

    #[test]
    fn unbounded_window_keeps_missing_rows() {
        let w = TimeWindow::default();
        assert_eq!(included_indices(&[None, Some(3.0)], &w), vec![0, 1]);
    }

    #[test]
    fn open_sides() {
        let w = TimeWindow::new(None, Some(5.0));
        assert!(w.contains(Some(-100.0)));
        assert!(!w.contains(Some(5.5)));
        let w = TimeWindow::new(Some(5.0), None);
        assert!(w.contains(Some(1e9)));
        assert!(!w.contains(None));
    }

    #[test]
    fn only_numeric_bounds_are_honored() {
        let w = TimeWindow::parse(" 1.5 ", "2024-03-01 10:00:00");
        assert_eq!(w, TimeWindow::new(Some(1.5), None));
        assert!(TimeWindow::parse("", "abc").is_unbounded());
        assert_eq!(parse_bound("1e2"), Some(100.0));
        assert_eq!(parse_bound("nan"), None);
    }

    #[test]
    fn narrowing_never_adds_rows() {
        let elapsed: Vec<Option<f64>> = (0..20).map(|i| Some(i as f64 * 0.5)).collect();
        let mut last = usize::MAX;
        for k in 0..8 {
            let w = TimeWindow::new(Some(k as f64 * 0.5), Some(9.5 - k as f64 * 0.5));
            let n = included_indices(&elapsed, &w).len();
            assert!(n <= last);
            last = n;
        }
    }
}
