//! In-memory long-format dataset produced by the loader.

use chrono::NaiveDate;
use covidviz_common::{CovidVizError, Result};
use std::collections::BTreeSet;

/// One input row: a date, a category and one optional value per metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub category: String,
    /// Values in the order of [`Dataset::metrics`]; `None` is missing.
    pub values: Vec<Option<f64>>,
}

/// Immutable table of records sorted by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    metrics: Vec<String>,
    records: Vec<Record>,
    has_category_column: bool,
}

impl Dataset {
    /// Builds a dataset; records are stably sorted by date.
    pub fn new(metrics: Vec<String>, mut records: Vec<Record>, has_category_column: bool) -> Self {
        records.sort_by_key(|record| record.date);
        Self {
            metrics,
            records,
            has_category_column,
        }
    }

    /// Logical metric names exposed by this dataset.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Whether the source had a category column, as opposed to the fallback category.
    pub const fn has_category_column(&self) -> bool {
        self.has_category_column
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of `metric` within each record's values.
    pub fn metric_index(&self, metric: &str) -> Result<usize> {
        self.metrics.iter().position(|m| m == metric).ok_or_else(|| {
            CovidVizError::reshape(format!(
                "Metric '{metric}' is not available; dataset has [{}]",
                self.metrics.join(", ")
            ))
        })
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.category.as_str()).collect()
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.records.iter().any(|r| r.category == category)
    }

    /// First and last date, if any.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.records.first()?.date, self.records.last()?.date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covidviz_common::test_utils::date;

    fn record(day: u32, category: &str, value: f64) -> Record {
        Record {
            date: date(2021, 3, day),
            category: category.to_string(),
            values: vec![Some(value)],
        }
    }

    #[test]
    fn test_records_sorted_by_date() {
        let dataset = Dataset::new(
            vec!["new_cases".to_string()],
            vec![record(3, "SP", 1.0), record(1, "RJ", 2.0), record(2, "SP", 3.0)],
            true,
        );
        let days: Vec<_> = dataset.records().iter().map(|r| r.date).collect();
        assert_eq!(days, vec![date(2021, 3, 1), date(2021, 3, 2), date(2021, 3, 3)]);
        assert_eq!(dataset.date_span(), Some((date(2021, 3, 1), date(2021, 3, 3))));
    }

    #[test]
    fn test_metric_lookup() {
        let dataset = Dataset::new(vec!["new_cases".to_string()], Vec::new(), false);
        assert_eq!(dataset.metric_index("new_cases").unwrap(), 0);
        let err = dataset.metric_index("new_deaths").unwrap_err();
        assert!(err.to_string().contains("new_deaths"));
        assert!(dataset.is_empty());
        assert_eq!(dataset.date_span(), None);
    }

    #[test]
    fn test_categories() {
        let dataset = Dataset::new(
            vec!["new_cases".to_string()],
            vec![record(1, "SP", 1.0), record(1, "RJ", 2.0), record(2, "SP", 3.0)],
            true,
        );
        assert_eq!(dataset.categories().into_iter().collect::<Vec<_>>(), vec!["RJ", "SP"]);
        assert!(dataset.contains_category("RJ"));
        assert!(!dataset.contains_category("AM"));
    }
}
