//! Reshaping a long [`Dataset`] into [`WideTable`]s and deriving new series.

use crate::dataset::Dataset;
use crate::wide_table::{Series, WideTable};
use chrono::NaiveDate;
use covidviz_common::{CovidVizError, Result};
use covidviz_config::{ChartData, TransformConfig};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which categories feed a metric pivot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryScope {
    /// Rows of one category only.
    Single(String),
    /// Rows of every category except `exclude`, summed per date.
    All { exclude: Vec<String> },
}

impl CategoryScope {
    fn includes(&self, category: &str) -> bool {
        match self {
            Self::Single(name) => name == category,
            Self::All { exclude } => !exclude.iter().any(|e| e == category),
        }
    }
}

/// Per-date sums of one metric, for the rows accepted by `keep`.
///
/// A date where every accepted value is missing maps to `None`.
fn sum_by_date<F>(dataset: &Dataset, metric: usize, keep: F) -> BTreeMap<NaiveDate, Option<f64>>
where
    F: Fn(&str) -> bool,
{
    let mut sums: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for record in dataset.records().iter().filter(|r| keep(r.category.as_str())) {
        let slot = sums.entry(record.date).or_insert(None);
        if let Some(value) = record.values.get(metric).copied().flatten() {
            *slot = Some(slot.unwrap_or(0.0) + value);
        }
    }
    sums
}

/// Builds a table from per-column date maps; dates a column lacks stay missing.
fn assemble(columns: Vec<(String, BTreeMap<NaiveDate, Option<f64>>)>) -> Result<WideTable> {
    let index: Vec<NaiveDate> = columns
        .iter()
        .flat_map(|(_, values)| values.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let series = columns
        .into_iter()
        .map(|(name, values)| {
            let aligned = index
                .iter()
                .map(|date| values.get(date).copied().flatten())
                .collect();
            Series::new(name, aligned)
        })
        .collect();

    WideTable::from_columns(index, series)
}

/// One column per requested category for `metric`.
///
/// Duplicate (date, category) rows are summed and gaps are forward filled.
/// Requesting a category absent from the dataset is an error.
pub fn pivot_categories(dataset: &Dataset, metric: &str, categories: &[String]) -> Result<WideTable> {
    Ok(gather_categories(dataset, metric, categories)?.forward_fill())
}

fn gather_categories(dataset: &Dataset, metric: &str, categories: &[String]) -> Result<WideTable> {
    let metric_index = dataset.metric_index(metric)?;
    let mut columns = Vec::with_capacity(categories.len());
    for category in categories {
        if !dataset.contains_category(category) {
            return Err(CovidVizError::reshape(format!(
                "Category '{category}' is not present in the dataset"
            )));
        }
        let values = sum_by_date(dataset, metric_index, |c| c == category.as_str());
        columns.push((category.clone(), values));
    }
    assemble(columns)
}

/// One column per metric, restricted to `scope`, forward filled.
pub fn pivot_metrics(dataset: &Dataset, metrics: &[String], scope: &CategoryScope) -> Result<WideTable> {
    Ok(gather_metrics(dataset, metrics, scope)?.forward_fill())
}

fn gather_metrics(dataset: &Dataset, metrics: &[String], scope: &CategoryScope) -> Result<WideTable> {
    if let CategoryScope::Single(category) = scope {
        if !dataset.contains_category(category) {
            return Err(CovidVizError::reshape(format!(
                "Category '{category}' is not present in the dataset"
            )));
        }
    }

    let mut columns = Vec::with_capacity(metrics.len());
    for metric in metrics {
        let metric_index = dataset.metric_index(metric)?;
        let values = sum_by_date(dataset, metric_index, |c| scope.includes(c));
        columns.push((metric.clone(), values));
    }
    assemble(columns)
}

/// Trailing mean over `window` periods.
///
/// The output has the input's length; the first `window - 1` entries and any
/// window containing a missing value are missing.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(CovidVizError::reshape("Rolling window must be positive"));
    }
    Ok((0..values.len())
        .map(|end| {
            if end + 1 < window {
                return None;
            }
            let slice = &values[end + 1 - window..=end];
            let sum = slice.iter().copied().sum::<Option<f64>>()?;
            Some(sum / window as f64)
        })
        .collect())
}

/// `numerator / denominator × scale`; zero or missing denominators and missing
/// numerators yield missing.
pub fn ratio(numerator: &[Option<f64>], denominator: &[Option<f64>], scale: f64) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(num, den)| match (num, den) {
            (Some(num), Some(den)) if *den != 0.0 => Some(num / den * scale).filter(|v| v.is_finite()),
            _ => None,
        })
        .collect()
}

/// Categories ordered by the maximum of `metric`, largest first, truncated to `top`.
///
/// Ties are broken by category name; categories with no present value are skipped.
pub fn rank_categories(
    dataset: &Dataset,
    metric: &str,
    top: usize,
    exclude: &[String],
) -> Result<Vec<(String, f64)>> {
    let metric_index = dataset.metric_index(metric)?;
    let mut maxima: BTreeMap<&str, f64> = BTreeMap::new();
    for record in dataset.records() {
        if exclude.iter().any(|e| e == &record.category) {
            continue;
        }
        if let Some(value) = record.values.get(metric_index).copied().flatten() {
            maxima
                .entry(record.category.as_str())
                .and_modify(|max| *max = max.max(value))
                .or_insert(value);
        }
    }

    let mut ranking: Vec<(String, f64)> = maxima
        .into_iter()
        .map(|(category, value)| (category.to_string(), value))
        .collect();
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranking.truncate(top);
    Ok(ranking)
}

/// Builds the wide table a time-series chart selects, without forward filling.
///
/// [`apply_transforms`] fills the gaps once any resampling is done, so a
/// missing day adds nothing to a weekly sum.
pub fn select(dataset: &Dataset, data: &ChartData) -> Result<WideTable> {
    match data {
        ChartData::Metrics {
            metrics,
            category,
            exclude,
        } => {
            let scope = match category {
                Some(category) => CategoryScope::Single(category.clone()),
                None => CategoryScope::All {
                    exclude: exclude.clone(),
                },
            };
            gather_metrics(dataset, metrics, &scope)
        }
        ChartData::Categories { metric, categories } => gather_categories(dataset, metric, categories),
        ChartData::Ranking { .. } => Err(CovidVizError::reshape(
            "Ranking charts do not produce a time-series table",
        )),
    }
}

/// Applies resampling, forward filling, rolling means, then the ratio column.
pub fn apply_transforms(table: WideTable, transform: &TransformConfig) -> Result<WideTable> {
    let mut table = match transform.resample {
        Some(resample) => {
            debug!(frequency = %resample.frequency, "Resampling table");
            table.resample(resample.frequency, resample.aggregation)
        }
        None => table,
    }
    .forward_fill();

    for rolling in &transform.rolling {
        let values = rolling_mean(&table.get(&rolling.column)?.values, rolling.window)?;
        table.push_column(Series::new(rolling.output_name(), values))?;
    }

    if let Some(config) = &transform.ratio {
        let values = ratio(
            &table.get(&config.numerator)?.values,
            &table.get(&config.denominator)?.values,
            config.scale,
        );
        table.push_column(Series::new(config.name.clone(), values))?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use covidviz_common::test_utils::{assert_approx_eq, daily_dates, date};
    use covidviz_common::{Aggregation, Frequency};
    use covidviz_config::{RatioConfig, ResampleConfig, RollingConfig};
    use proptest::prelude::*;

    fn record(day: u32, category: &str, cases: Option<f64>, per_100k: Option<f64>) -> Record {
        Record {
            date: date(2021, 3, day),
            category: category.to_string(),
            values: vec![cases, per_100k],
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec!["new_cases".to_string(), "deaths_per_100k".to_string()],
            vec![
                record(1, "SP", Some(10.0), Some(1.0)),
                record(1, "RJ", Some(5.0), Some(2.0)),
                record(1, "TOTAL", Some(15.0), Some(1.5)),
                record(2, "SP", Some(20.0), Some(3.0)),
                record(2, "SP", Some(1.0), None),
                record(3, "RJ", None, Some(4.0)),
                record(3, "AM", Some(7.0), Some(9.0)),
            ],
            true,
        )
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_rolling_mean_window_three() {
        let values: Vec<Option<f64>> = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0].into_iter().map(Some).collect();
        let mean = rolling_mean(&values, 3).unwrap();

        assert_eq!(mean.len(), 7);
        assert_eq!(mean[0], None);
        assert_eq!(mean[1], None);
        assert_approx_eq(mean[2].unwrap(), 20.0, 1e-9);
        assert_approx_eq(mean[6].unwrap(), 60.0, 1e-9);
    }

    #[test]
    fn test_rolling_mean_gap_and_zero_window() {
        let mean = rolling_mean(&[Some(1.0), None, Some(3.0), Some(5.0)], 2).unwrap();
        assert_eq!(mean, vec![None, None, None, Some(4.0)]);
        assert!(rolling_mean(&[Some(1.0)], 0).is_err());
    }

    #[test]
    fn test_ratio_zero_denominator_is_missing() {
        let result = ratio(&[Some(1.0), Some(2.0), None, Some(3.0)], &[Some(0.0), Some(4.0), Some(1.0), None], 100.0);
        assert_eq!(result, vec![None, Some(50.0), None, None]);
    }

    #[test]
    fn test_pivot_categories_sums_duplicates_and_fills() {
        let table = pivot_categories(&dataset(), "new_cases", &names(&["SP", "RJ"])).unwrap();

        assert_eq!(table.index(), [date(2021, 3, 1), date(2021, 3, 2), date(2021, 3, 3)]);
        assert_eq!(table.get("SP").unwrap().values, vec![Some(10.0), Some(21.0), Some(21.0)]);
        // 03-03 has an RJ row whose value is missing; 03-02 has no RJ row at all
        assert_eq!(table.get("RJ").unwrap().values, vec![Some(5.0), Some(5.0), Some(5.0)]);
    }

    #[test]
    fn test_pivot_categories_unknown_category() {
        let err = pivot_categories(&dataset(), "new_cases", &names(&["SP", "XX"])).unwrap_err();
        assert!(err.to_string().contains("XX"));
    }

    #[test]
    fn test_pivot_metrics_excludes_total() {
        let scope = CategoryScope::All {
            exclude: names(&["TOTAL"]),
        };
        let table = pivot_metrics(&dataset(), &names(&["new_cases"]), &scope).unwrap();
        assert_eq!(table.get("new_cases").unwrap().values, vec![Some(15.0), Some(21.0), Some(7.0)]);

        let single = pivot_metrics(&dataset(), &names(&["new_cases"]), &CategoryScope::Single("AM".into())).unwrap();
        assert_eq!(single.index(), [date(2021, 3, 3)]);
    }

    #[test]
    fn test_rank_categories() {
        let ranking = rank_categories(&dataset(), "deaths_per_100k", 2, &names(&["TOTAL"])).unwrap();
        assert_eq!(ranking, vec![("AM".to_string(), 9.0), ("RJ".to_string(), 4.0)]);
        assert!(rank_categories(&dataset(), "unknown", 2, &[]).is_err());
    }

    #[test]
    fn test_apply_transforms_order() {
        let table = WideTable::from_columns(
            daily_dates(date(2021, 3, 1), 14),
            vec![
                Series::new("new_cases", vec![Some(10.0); 14]),
                Series::new("new_deaths", vec![Some(1.0); 14]),
            ],
        )
        .unwrap();
        let transform = TransformConfig {
            resample: Some(ResampleConfig {
                frequency: Frequency::Weekly,
                aggregation: Aggregation::Sum,
            }),
            rolling: vec![RollingConfig {
                column: "new_cases".to_string(),
                window: 2,
                name: None,
            }],
            ratio: Some(RatioConfig {
                numerator: "new_deaths".to_string(),
                denominator: "new_cases".to_string(),
                name: "letalidade".to_string(),
                scale: 100.0,
            }),
        };

        let result = apply_transforms(table, &transform).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("new_cases_rolling_2").unwrap().values, vec![None, Some(70.0)]);
        assert_eq!(result.get("letalidade").unwrap().values, vec![Some(10.0), Some(10.0)]);
    }

    #[test]
    fn test_missing_day_adds_nothing_to_weekly_sum() {
        // 2021-03-01 is a Monday; RJ has no row on 03-03
        let mut records = Vec::new();
        for day in 1..=7 {
            records.push(record(day, "SP", Some(10.0), None));
            if day != 3 {
                records.push(record(day, "RJ", Some(1.0), None));
            }
        }
        let dataset = Dataset::new(vec!["new_cases".to_string(), "deaths_per_100k".to_string()], records, true);
        let data = ChartData::Categories {
            metric: "new_cases".to_string(),
            categories: names(&["SP", "RJ"]),
        };
        let transform = TransformConfig {
            resample: Some(ResampleConfig {
                frequency: Frequency::Weekly,
                aggregation: Aggregation::Sum,
            }),
            ..TransformConfig::default()
        };

        let selected = select(&dataset, &data).unwrap();
        assert_eq!(selected.get("RJ").unwrap().values[2], None);

        let weekly = apply_transforms(selected, &transform).unwrap();
        assert_eq!(weekly.index(), [date(2021, 3, 7)]);
        assert_eq!(weekly.get("SP").unwrap().values, vec![Some(70.0)]);
        assert_eq!(weekly.get("RJ").unwrap().values, vec![Some(6.0)]);
    }

    #[test]
    fn test_daily_gaps_are_filled_without_resampling() {
        let data = ChartData::Categories {
            metric: "new_cases".to_string(),
            categories: names(&["RJ"]),
        };
        let table = apply_transforms(select(&dataset(), &data).unwrap(), &TransformConfig::default()).unwrap();
        assert_eq!(table.get("RJ").unwrap().values, vec![Some(5.0), Some(5.0), Some(5.0)]);
    }

    #[test]
    fn test_apply_transforms_missing_column() {
        let table = WideTable::from_columns(vec![date(2021, 3, 1)], vec![Series::new("a", vec![Some(1.0)])]).unwrap();
        let transform = TransformConfig {
            rolling: vec![RollingConfig {
                column: "b".to_string(),
                window: 2,
                name: None,
            }],
            ..TransformConfig::default()
        };
        assert!(apply_transforms(table, &transform).is_err());
    }

    proptest! {
        #[test]
        fn prop_rolling_mean_length_and_leading_gaps(
            values in proptest::collection::vec(-1e6f64..1e6, 0..50),
            window in 1usize..10,
        ) {
            let values: Vec<Option<f64>> = values.into_iter().map(Some).collect();
            let mean = rolling_mean(&values, window).unwrap();
            prop_assert_eq!(mean.len(), values.len());
            let leading = mean.iter().take_while(|v| v.is_none()).count();
            prop_assert_eq!(leading, (window - 1).min(values.len()));
        }

        #[test]
        fn prop_ratio_is_never_infinite(
            pairs in proptest::collection::vec((proptest::option::of(-1e9f64..1e9), proptest::option::of(-1e3f64..1e3)), 0..50),
        ) {
            let (num, den): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
            for value in ratio(&num, &den, 100.0).into_iter().flatten() {
                prop_assert!(value.is_finite());
            }
        }
    }
}
