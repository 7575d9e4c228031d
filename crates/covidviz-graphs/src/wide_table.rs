//! Date-indexed table with one column per category or metric.

use chrono::{Datelike, Days, Months, NaiveDate};
use covidviz_common::{Aggregation, CovidVizError, Frequency, Result};

/// One named column of a [`WideTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Present values only.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied()
    }
}

/// Ascending unique dates, each mapped to a value per column.
///
/// Missing values are `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    index: Vec<NaiveDate>,
    columns: Vec<Series>,
}

impl WideTable {
    /// Creates a table with no columns over `index`, which must be strictly ascending.
    pub fn new(index: Vec<NaiveDate>) -> Result<Self> {
        if index.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CovidVizError::reshape("Table index must be strictly ascending"));
        }
        Ok(Self {
            index,
            columns: Vec::new(),
        })
    }

    /// Creates a table and appends `columns` in order.
    pub fn from_columns(index: Vec<NaiveDate>, columns: Vec<Series>) -> Result<Self> {
        let mut table = Self::new(index)?;
        for series in columns {
            table.push_column(series)?;
        }
        Ok(table)
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|series| series.name == name)
    }

    /// Like [`WideTable::column`], failing with the available column names.
    pub fn get(&self, name: &str) -> Result<&Series> {
        self.column(name).ok_or_else(|| {
            let available: Vec<&str> = self.columns.iter().map(|s| s.name.as_str()).collect();
            CovidVizError::reshape(format!(
                "Column '{name}' not found; table has [{}]",
                available.join(", ")
            ))
        })
    }

    /// Appends a derived column.
    pub fn push_column(&mut self, series: Series) -> Result<()> {
        if series.values.len() != self.index.len() {
            return Err(CovidVizError::reshape(format!(
                "Column '{}' has {} values for {} dates",
                series.name,
                series.values.len(),
                self.index.len()
            )));
        }
        if self.column(&series.name).is_some() {
            return Err(CovidVizError::reshape(format!(
                "Column '{}' already exists",
                series.name
            )));
        }
        self.columns.push(series);
        Ok(())
    }

    /// Replaces every missing value with the last present one in its column.
    pub fn forward_fill(&self) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|series| Series::new(series.name.clone(), forward_fill(&series.values)))
                .collect(),
        }
    }

    /// Aggregates rows into calendar buckets.
    ///
    /// Buckets run contiguously from the first to the last observed bucket;
    /// a bucket without present values is missing.
    pub fn resample(&self, frequency: Frequency, aggregation: Aggregation) -> Self {
        let (Some(&first), Some(&last)) = (self.index.first(), self.index.last()) else {
            return self.clone();
        };

        let mut labels = vec![bucket_end(first, frequency)];
        let last_label = bucket_end(last, frequency);
        while let Some(next) = labels.last().and_then(|&label| next_bucket_end(label, frequency)) {
            if next > last_label {
                break;
            }
            labels.push(next);
        }

        let positions: Vec<usize> = self
            .index
            .iter()
            .map(|&date| {
                let label = bucket_end(date, frequency);
                labels.partition_point(|&l| l < label)
            })
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|series| {
                let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); labels.len()];
                for (&position, value) in positions.iter().zip(&series.values) {
                    if let Some(value) = value {
                        buckets[position].push(*value);
                    }
                }
                let values = buckets.iter().map(|bucket| aggregation.apply(bucket)).collect();
                Series::new(series.name.clone(), values)
            })
            .collect();

        Self {
            index: labels,
            columns,
        }
    }

    /// Smallest and largest present value across `names`.
    pub fn value_range(&self, names: &[&str]) -> Option<(f64, f64)> {
        names
            .iter()
            .filter_map(|name| self.column(name))
            .flat_map(Series::present)
            .fold(None, |range, value| match range {
                None => Some((value, value)),
                Some((min, max)) => Some((f64::min(min, value), f64::max(max, value))),
            })
    }
}

/// Replaces each missing value with the last present one; leading gaps stay missing.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|value| {
            if value.is_some() {
                last = *value;
            }
            last
        })
        .collect()
}

/// Label of the bucket containing `date`: the date itself, the Sunday ending
/// its week, or the last day of its month.
pub fn bucket_end(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date,
        Frequency::Weekly => {
            let until_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
            date.checked_add_days(Days::new(until_sunday)).unwrap_or(date)
        }
        Frequency::Monthly => date
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .and_then(|next| next.pred_opt())
            .unwrap_or(date),
    }
}

fn next_bucket_end(label: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => label.succ_opt(),
        Frequency::Weekly => label.checked_add_days(Days::new(7)),
        Frequency::Monthly => label.succ_opt().map(|first| bucket_end(first, frequency)),
    }
}
