use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Separator between the tech-detail name and the scenario in a row label,
/// e.g. `Class1/Moderate`.
pub const LABEL_SEPARATOR: char = '/';

/// A numeric matrix with labelled rows and contiguous calendar-year columns.
///
/// Rows are usually `tech-detail/scenario` labels, but the same structure holds
/// per-scenario series (`PFF - Moderate`) and named assumption rows
/// (`Inflation Rate`). Values are stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    rows: Vec<String>,
    years: Vec<i32>,
    values: Vec<f64>,
}

impl MetricTable {
    /// Builds a table, checking that the value count matches the shape and that
    /// the years form a contiguous ascending range.
    pub fn new(rows: Vec<String>, years: Vec<i32>, values: Vec<f64>) -> Result<Self, CoreError> {
        if values.len() != rows.len() * years.len() {
            return Err(CoreError::shape(
                "table",
                format!(
                    "{} values cannot fill {} rows x {} years",
                    values.len(),
                    rows.len(),
                    years.len()
                ),
            ));
        }
        if let Some(w) = years.windows(2).find(|w| w[1] != w[0] + 1) {
            return Err(CoreError::shape(
                "table",
                format!("year columns are not contiguous: {} followed by {}", w[0], w[1]),
            ));
        }
        Ok(Self { rows, years, values })
    }

    /// Builds a table from `(label, values)` pairs.
    pub fn from_rows(years: Vec<i32>, rows: Vec<(String, Vec<f64>)>) -> Result<Self, CoreError> {
        let mut labels = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len() * years.len());
        for (label, row) in rows {
            if row.len() != years.len() {
                return Err(CoreError::shape(
                    label,
                    format!("row has {} values, expected {}", row.len(), years.len()),
                ));
            }
            labels.push(label);
            values.extend(row);
        }
        Self::new(labels, years, values)
    }

    /// A table with every cell set to `value`.
    pub fn filled(rows: Vec<String>, years: Vec<i32>, value: f64) -> Result<Self, CoreError> {
        let n = rows.len() * years.len();
        Self::new(rows, years, vec![value; n])
    }

    /// The years `base..=end` as a column vector.
    pub fn year_range(base: i32, end: i32) -> Vec<i32> {
        (base..=end).collect()
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_years(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.years.is_empty()
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.years.len() + col]
    }

    pub fn row_values(&self, row: usize) -> &[f64] {
        let n = self.years.len();
        &self.values[row * n..(row + 1) * n]
    }

    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|r| r == label)
    }

    /// Values of the row with the given label.
    pub fn row(&self, label: &str) -> Option<&[f64]> {
        self.row_index(label).map(|i| self.row_values(i))
    }

    pub fn year_index(&self, year: i32) -> Option<usize> {
        let first = *self.years.first()?;
        let idx = usize::try_from(year - first).ok()?;
        (idx < self.years.len()).then_some(idx)
    }

    pub fn get(&self, label: &str, year: i32) -> Option<f64> {
        let row = self.row_index(label)?;
        let col = self.year_index(year)?;
        Some(self.value(row, col))
    }

    /// Iterates `(label, values)` pairs in row order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        (0..self.rows.len()).map(move |i| (self.rows[i].as_str(), self.row_values(i)))
    }

    /// Fails with `MissingValue` on the first NaN or infinite cell.
    pub fn ensure_complete(&self, metric: &str) -> Result<(), CoreError> {
        for (i, label) in self.rows.iter().enumerate() {
            for (j, year) in self.years.iter().enumerate() {
                if !self.value(i, j).is_finite() {
                    return Err(CoreError::MissingValue {
                        metric: metric.to_string(),
                        row: label.clone(),
                        year: *year,
                    });
                }
            }
        }
        Ok(())
    }

    /// Fails unless the columns are exactly `base..=end`.
    pub fn ensure_year_range(&self, metric: &str, base: i32, end: i32) -> Result<(), CoreError> {
        match (self.years.first(), self.years.last()) {
            (Some(&first), Some(&last)) if first == base && last == end => Ok(()),
            (first, last) => Err(CoreError::shape(
                metric,
                format!(
                    "year columns should span {base}..={end}, found {:?}..={:?}",
                    first, last
                ),
            )),
        }
    }

    pub fn ensure_row_count(&self, metric: &str, expected: usize) -> Result<(), CoreError> {
        if self.rows.len() != expected {
            return Err(CoreError::shape(
                metric,
                format!("expected {expected} rows, found {}", self.rows.len()),
            ));
        }
        Ok(())
    }

    pub fn ensure_same_shape(&self, other: &MetricTable, metric: &str) -> Result<(), CoreError> {
        if self.rows.len() != other.rows.len() || self.years != other.years {
            return Err(CoreError::shape(
                metric,
                format!(
                    "shape mismatch: {}x{} ({:?}..) vs {}x{} ({:?}..)",
                    self.rows.len(),
                    self.years.len(),
                    self.years.first(),
                    other.rows.len(),
                    other.years.len(),
                    other.years.first()
                ),
            ));
        }
        Ok(())
    }

    /// Applies `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> MetricTable {
        MetricTable {
            rows: self.rows.clone(),
            years: self.years.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines two tables of identical shape cell by cell. Labels come from `self`.
    pub fn zip_with(
        &self,
        other: &MetricTable,
        metric: &str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<MetricTable, CoreError> {
        self.ensure_same_shape(other, metric)?;
        Ok(MetricTable {
            rows: self.rows.clone(),
            years: self.years.clone(),
            values: self.values.iter().zip(&other.values).map(|(&a, &b)| f(a, b)).collect(),
        })
    }

    /// Replaces the row labels, keeping values.
    pub fn relabel(self, rows: Vec<String>) -> Result<MetricTable, CoreError> {
        if rows.len() != self.rows.len() {
            return Err(CoreError::shape(
                "relabel",
                format!("{} labels for {} rows", rows.len(), self.rows.len()),
            ));
        }
        Ok(MetricTable { rows, ..self })
    }

    /// Builds a new table whose rows are copies of `self`'s rows picked by index.
    pub fn pick_rows(&self, picks: &[usize], labels: Vec<String>) -> Result<MetricTable, CoreError> {
        if picks.len() != labels.len() {
            return Err(CoreError::shape("pick_rows", "one label is required per picked row"));
        }
        let mut values = Vec::with_capacity(picks.len() * self.years.len());
        for &p in picks {
            if p >= self.rows.len() {
                return Err(CoreError::shape(
                    "pick_rows",
                    format!("row {p} out of range for {} rows", self.rows.len()),
                ));
            }
            values.extend_from_slice(self.row_values(p));
        }
        MetricTable::new(labels, self.years.clone(), values)
    }

    /// The last `n` rows (or all rows when fewer exist).
    pub fn tail(&self, n: usize) -> MetricTable {
        let start = self.rows.len().saturating_sub(n);
        let w = self.years.len();
        MetricTable {
            rows: self.rows[start..].to_vec(),
            years: self.years.clone(),
            values: self.values[start * w..].to_vec(),
        }
    }

    /// Restricts the columns to `base..=end`.
    pub fn restrict_years(&self, metric: &str, base: i32, end: i32) -> Result<MetricTable, CoreError> {
        let (Some(from), Some(to)) = (self.year_index(base), self.year_index(end)) else {
            return Err(CoreError::shape(
                metric,
                format!("cannot restrict {:?}..{:?} to {base}..={end}", self.years.first(), self.years.last()),
            ));
        };
        let mut values = Vec::with_capacity(self.rows.len() * (to + 1 - from));
        for i in 0..self.rows.len() {
            values.extend_from_slice(&self.row_values(i)[from..=to]);
        }
        MetricTable::new(self.rows.clone(), self.years[from..=to].to_vec(), values)
    }

    /// Drops rows in which every value is missing, e.g. blank separator rows.
    pub fn drop_blank_rows(self) -> MetricTable {
        let w = self.years.len();
        let mut rows = Vec::with_capacity(self.rows.len());
        let mut values = Vec::with_capacity(self.values.len());
        for (i, label) in self.rows.into_iter().enumerate() {
            let row = &self.values[i * w..(i + 1) * w];
            if row.iter().all(|v| v.is_nan()) {
                continue;
            }
            rows.push(label);
            values.extend_from_slice(row);
        }
        MetricTable { rows, years: self.years, values }
    }
}

/// Splits a `detail/scenario` label on its last separator into trimmed parts.
/// Labels without a separator yield the whole label and an empty scenario.
pub fn split_label(label: &str) -> (&str, &str) {
    match label.rsplit_once(LABEL_SEPARATOR) {
        Some((detail, scenario)) => (detail.trim(), scenario.trim()),
        None => (label.trim(), ""),
    }
}
