//! Configuration schema definitions.
//!
//! A [`PipelineConfig`] describes one run: where the dataset lives and how its
//! columns are named, where images go, and the ordered list of charts.

use chrono::NaiveDate;
use covidviz_common::{Aggregation, AxisFormat, Frequency, SeriesKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Dataset source.
    pub source: SourceConfig,
    /// Output settings shared by all charts.
    #[serde(default)]
    pub output: OutputConfig,
    /// Charts, rendered in order.
    pub charts: Vec<ChartDefinition>,
}

/// Where and how to read the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Short name used in logs.
    pub name: String,
    /// Local path or `http(s)` URL.
    pub location: String,
    /// User-Agent sent with remote requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Optional request timeout; no timeout when absent.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Alias table mapping logical column names to physical header names.
    pub columns: ColumnAliases,
    /// Categories to keep; empty keeps every row.
    #[serde(default)]
    pub category_filter: Vec<String>,
    /// Category assigned to rows when the dataset has no category column.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Logical metrics every kept row must have; rows missing one are dropped.
    #[serde(default)]
    pub required_metrics: Vec<String>,
    /// Optional inclusive date range.
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

/// Resolved form of [`SourceConfig::location`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// File on the local filesystem.
    Path(PathBuf),
    /// Remote resource fetched over HTTP.
    Url(String),
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

impl SourceConfig {
    /// Classifies the configured location as a URL or a local path.
    pub fn location(&self) -> SourceLocation {
        let trimmed = self.location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceLocation::Url(trimmed.to_string())
        } else {
            SourceLocation::Path(PathBuf::from(trimmed))
        }
    }
}

/// Ordered alias lists per logical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAliases {
    /// Aliases for the date column (required in the data).
    pub date: Vec<String>,
    /// Aliases for the category column (optional in the data).
    #[serde(default)]
    pub category: Vec<String>,
    /// Aliases for each logical metric.
    #[serde(default)]
    pub metrics: BTreeMap<String, Vec<String>>,
}

/// Inclusive date bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// First date kept.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last date kept.
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Output settings shared by all charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory images are written to; created when absent.
    pub dir: PathBuf,
    /// Default image width in pixels.
    pub width: u32,
    /// Default image height in pixels.
    pub height: u32,
    /// Background color as `#rrggbb`.
    pub background: String,
    /// Default strftime pattern for x-axis ticks.
    pub date_format: String,
    /// Candidate TrueType fonts, first readable one wins.
    pub font_paths: Vec<PathBuf>,
}

/// Pixel dimensions overriding the output defaults for one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One chart: what data it selects, how it is transformed and how it looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    /// Identifier used in logs and reports.
    pub name: String,
    /// File name inside the output directory.
    pub file_name: String,
    /// Chart caption.
    pub title: String,
    /// X-axis description.
    #[serde(default)]
    pub x_label: String,
    /// Y-axis description.
    #[serde(default)]
    pub y_label: String,
    /// Data selection.
    pub data: ChartData,
    /// Derived series and resampling.
    #[serde(default)]
    pub transform: TransformConfig,
    /// Series drawn, in order. Unused for ranking charts.
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    /// Value axis labelling.
    #[serde(default)]
    pub axis: AxisFormat,
    /// Legend heading.
    #[serde(default)]
    pub legend_title: Option<String>,
    /// Overrides the output date format.
    #[serde(default)]
    pub date_format: Option<String>,
    /// Overrides the output image size.
    #[serde(default)]
    pub size: Option<ImageSize>,
}

/// Which rows and columns feed a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    /// One column per metric, for a single category or summed across categories.
    Metrics {
        /// Logical metric names.
        metrics: Vec<String>,
        /// Category to select; all categories are summed when absent.
        #[serde(default)]
        category: Option<String>,
        /// Categories left out of the sum.
        #[serde(default)]
        exclude: Vec<String>,
    },
    /// One column per category for a single metric.
    Categories {
        /// Logical metric name.
        metric: String,
        /// Categories, one column each.
        categories: Vec<String>,
    },
    /// Top categories by the maximum of a metric, drawn as bars.
    Ranking {
        /// Logical metric name.
        metric: String,
        /// Number of categories kept.
        top: usize,
        /// Categories never ranked.
        #[serde(default)]
        exclude: Vec<String>,
        /// Bar colors, cycled when shorter than `top`.
        #[serde(default)]
        palette: Vec<String>,
    },
}

impl ChartData {
    /// Logical metrics the selection reads.
    pub fn metrics(&self) -> Vec<&str> {
        match self {
            Self::Metrics { metrics, .. } => metrics.iter().map(String::as_str).collect(),
            Self::Categories { metric, .. } | Self::Ranking { metric, .. } => vec![metric.as_str()],
        }
    }

    /// Whether the chart is a categorical ranking rather than a time series.
    pub const fn is_ranking(&self) -> bool {
        matches!(self, Self::Ranking { .. })
    }
}

/// Transform pipeline applied to the wide table, in field order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Resample to a coarser frequency.
    pub resample: Option<ResampleConfig>,
    /// Trailing rolling means appended as new columns.
    pub rolling: Vec<RollingConfig>,
    /// Ratio column appended after resampling.
    pub ratio: Option<RatioConfig>,
}

/// Resampling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResampleConfig {
    /// Bucket size.
    pub frequency: Frequency,
    /// Bucket aggregation.
    #[serde(default)]
    pub aggregation: Aggregation,
}

/// A trailing rolling mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingConfig {
    /// Source column.
    pub column: String,
    /// Window length in periods.
    pub window: usize,
    /// Name of the new column; defaults to `<column>_rolling_<window>`.
    #[serde(default)]
    pub name: Option<String>,
}

impl RollingConfig {
    /// Name of the appended column.
    pub fn output_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_rolling_{}", self.column, self.window))
    }
}

/// `numerator / denominator × scale` appended as a new column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioConfig {
    /// Numerator column.
    pub numerator: String,
    /// Denominator column.
    pub denominator: String,
    /// Name of the new column.
    pub name: String,
    /// Multiplier, `100` for percentages.
    #[serde(default = "default_ratio_scale")]
    pub scale: f64,
}

/// Styling of one drawn series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Wide-table column drawn.
    pub column: String,
    /// Legend label; the column name when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Color as `#rrggbb`.
    pub color: String,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Line or bar.
    #[serde(default)]
    pub kind: SeriesKind,
    /// Stroke width in pixels for lines.
    #[serde(default = "default_line_width")]
    pub line_width: u32,
}

impl SeriesConfig {
    /// Label shown in the legend.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.column)
    }
}

pub(crate) fn default_user_agent() -> String {
    concat!("covidviz/", env!("CARGO_PKG_VERSION")).to_string()
}

pub(crate) fn default_category() -> String {
    "all".to_string()
}

const fn default_ratio_scale() -> f64 {
    1.0
}

const fn default_opacity() -> f64 {
    1.0
}

const fn default_line_width() -> u32 {
    2
}
