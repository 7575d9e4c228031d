//! CSV parsing into a [`Dataset`], resolving column aliases.

use crate::data_fetcher::DataFetcher;
use crate::dataset::{Dataset, Record};
use chrono::NaiveDate;
use covidviz_common::{CovidVizError, Result};
use covidviz_config::SourceConfig;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

/// Date layouts accepted in the date column.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parses a date in one of [`DATE_FORMATS`], also accepting datetimes whose
/// first ten characters form such a date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parse = |text: &str| {
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    };
    parse(raw).or_else(|| raw.get(..10).and_then(parse))
}

/// Parses a numeric cell; empty, unparseable and non-finite cells are missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Maps logical column names to header positions.
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    headers: Vec<String>,
}

impl ColumnResolver {
    /// Builds a resolver over a header row, ignoring a leading UTF-8 BOM.
    pub fn new(headers: &StringRecord) -> Self {
        let headers = headers
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let name = if index == 0 {
                    name.trim_start_matches('\u{feff}')
                } else {
                    name
                };
                name.trim().to_string()
            })
            .collect();
        Self { headers }
    }

    /// Position of the first alias present in the header.
    ///
    /// Every alias is tried for an exact match before any case-insensitive one.
    pub fn resolve(&self, aliases: &[String]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.headers.iter().position(|h| h == alias))
            .or_else(|| {
                aliases.iter().find_map(|alias| {
                    self.headers.iter().position(|h| h.eq_ignore_ascii_case(alias))
                })
            })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

/// Loads the dataset described by a [`SourceConfig`].
pub struct DatasetLoader<'a> {
    source: &'a SourceConfig,
}

impl<'a> DatasetLoader<'a> {
    pub const fn new(source: &'a SourceConfig) -> Self {
        Self { source }
    }

    /// Fetches the source text and parses it.
    pub fn load(&self, fetcher: &DataFetcher) -> Result<Dataset> {
        let location = self.source.location();
        info!(source = %self.source.name, location = %location, "Loading dataset");
        let text = fetcher.fetch(&location)?;
        self.parse(&text)
    }

    /// Parses CSV text, keeping rows that pass the category and date filters.
    pub fn parse(&self, text: &str) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let resolver = ColumnResolver::new(reader.headers()?);
        let columns = &self.source.columns;

        let date_index = resolver
            .resolve(&columns.date)
            .ok_or_else(|| CovidVizError::missing_column("date", &columns.date))?;

        let category_index = resolver.resolve(&columns.category);
        if category_index.is_none() && !columns.category.is_empty() {
            debug!(
                fallback = %self.source.default_category,
                "No category column found, using fallback category"
            );
        }

        let mut metrics = Vec::new();
        let mut metric_indices = Vec::new();
        for (logical, aliases) in &columns.metrics {
            match resolver.resolve(aliases) {
                Some(index) => {
                    metrics.push(logical.clone());
                    metric_indices.push(index);
                }
                None => debug!(metric = %logical, tried = ?aliases, "Metric column not found"),
            }
        }

        let required: Vec<usize> = self
            .source
            .required_metrics
            .iter()
            .filter_map(|name| metrics.iter().position(|m| m == name))
            .collect();

        let filter = &self.source.category_filter;
        let mut records = Vec::new();
        let mut skipped_dates = 0usize;
        let mut incomplete = 0usize;

        for row in reader.records() {
            let row = row?;
            let category = match category_index {
                Some(index) => {
                    let category = row.get(index).unwrap_or_default();
                    if !filter.is_empty() && !filter.iter().any(|f| f == category) {
                        continue;
                    }
                    category.to_string()
                }
                None => self.source.default_category.clone(),
            };

            let Some(date) = row.get(date_index).and_then(parse_date) else {
                skipped_dates += 1;
                continue;
            };
            if let Some(range) = &self.source.date_range {
                if !range.contains(date) {
                    continue;
                }
            }

            let values: Vec<Option<f64>> = metric_indices
                .iter()
                .map(|&index| row.get(index).and_then(parse_number))
                .collect();
            if required.iter().any(|&index| values[index].is_none()) {
                incomplete += 1;
                continue;
            }
            records.push(Record {
                date,
                category,
                values,
            });
        }

        if skipped_dates > 0 {
            warn!(rows = skipped_dates, "Skipped rows with unparseable dates");
        }
        if incomplete > 0 {
            debug!(
                rows = incomplete,
                required = ?self.source.required_metrics,
                "Dropped rows missing required metrics"
            );
        }

        let dataset = Dataset::new(metrics, records, category_index.is_some());
        info!(
            rows = dataset.len(),
            metrics = ?dataset.metrics(),
            categories = dataset.categories().len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }
}
