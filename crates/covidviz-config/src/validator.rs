//! Runtime validation of a loaded configuration.

use crate::schema::{ChartData, ChartDefinition, PipelineConfig, SourceConfig, SourceLocation};
use covidviz_common::{is_valid_date_format, parse_hex_color, CovidVizError, Result};
use std::collections::HashSet;
use tracing::debug;

/// One rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field, e.g. `charts[2].series[0].color`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting every issue at once.
    pub fn validate(config: &PipelineConfig) -> Result<()> {
        let issues = Self::collect_issues(config);
        if issues.is_empty() {
            debug!(charts = config.charts.len(), "Configuration validated");
            return Ok(());
        }

        let message = issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(CovidVizError::validation_field(message, issues[0].field.clone()))
    }

    /// Lists every issue found in `config`.
    pub fn collect_issues(config: &PipelineConfig) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        Self::check_source(&config.source, &mut issues);

        let output = &config.output;
        if output.width == 0 || output.height == 0 {
            push(&mut issues, "output", "image size must be non-zero");
        }
        check_color(&output.background, "output.background", &mut issues);
        if !is_valid_date_format(&output.date_format) {
            push(&mut issues, "output.date_format", format!("invalid date format '{}'", output.date_format));
        }

        if config.charts.is_empty() {
            push(&mut issues, "charts", "at least one chart is required");
        }

        let mut names = HashSet::new();
        let mut files = HashSet::new();
        for (index, chart) in config.charts.iter().enumerate() {
            let prefix = format!("charts[{index}]");
            if !names.insert(chart.name.as_str()) {
                push(&mut issues, format!("{prefix}.name"), format!("duplicate chart name '{}'", chart.name));
            }
            if !files.insert(chart.file_name.as_str()) {
                push(
                    &mut issues,
                    format!("{prefix}.file_name"),
                    format!("duplicate output file '{}'", chart.file_name),
                );
            }
            Self::check_chart(chart, &prefix, &mut issues);
            for metric in chart.data.metrics() {
                if !config.source.columns.metrics.contains_key(metric) {
                    push(&mut issues, format!("{prefix}.data"), format!("unknown metric '{metric}'"));
                }
            }
        }

        issues
    }

    fn check_source(source: &SourceConfig, issues: &mut Vec<ValidationIssue>) {
        if source.location.trim().is_empty() {
            push(issues, "source.location", "location cannot be empty");
        } else if let SourceLocation::Url(raw) = source.location() {
            if let Err(err) = url::Url::parse(&raw) {
                push(issues, "source.location", format!("invalid URL '{raw}': {err}"));
            }
        }
        if source.columns.date.is_empty() {
            push(issues, "source.columns.date", "at least one date alias is required");
        }
        for (index, metric) in source.required_metrics.iter().enumerate() {
            if !source.columns.metrics.contains_key(metric) {
                push(
                    issues,
                    format!("source.required_metrics[{index}]"),
                    format!("unknown metric '{metric}'"),
                );
            }
        }
        if source.timeout_seconds == Some(0) {
            push(issues, "source.timeout_seconds", "timeout must be positive");
        }
        if let Some(range) = source.date_range {
            if let (Some(start), Some(end)) = (range.start, range.end) {
                if start > end {
                    push(issues, "source.date_range", format!("start {start} is after end {end}"));
                }
            }
        }
    }

    fn check_chart(chart: &ChartDefinition, prefix: &str, issues: &mut Vec<ValidationIssue>) {
        if chart.name.trim().is_empty() {
            push(issues, format!("{prefix}.name"), "name cannot be empty");
        }
        if !chart.file_name.to_ascii_lowercase().ends_with(".png") {
            push(
                issues,
                format!("{prefix}.file_name"),
                format!("'{}' must end with .png", chart.file_name),
            );
        }
        if chart.file_name.contains(['/', '\\']) {
            push(issues, format!("{prefix}.file_name"), "file name cannot contain a path separator");
        }
        if let Some(format) = &chart.date_format {
            if !is_valid_date_format(format) {
                push(issues, format!("{prefix}.date_format"), format!("invalid date format '{format}'"));
            }
        }
        if let Some(size) = chart.size {
            if size.width == 0 || size.height == 0 {
                push(issues, format!("{prefix}.size"), "image size must be non-zero");
            }
        }

        match &chart.data {
            ChartData::Metrics { metrics, .. } if metrics.is_empty() => {
                push(issues, format!("{prefix}.data.metrics"), "at least one metric is required");
            }
            ChartData::Categories { categories, .. } if categories.is_empty() => {
                push(issues, format!("{prefix}.data.categories"), "at least one category is required");
            }
            ChartData::Ranking { top, palette, .. } => {
                if *top == 0 {
                    push(issues, format!("{prefix}.data.top"), "top must be positive");
                }
                for (index, color) in palette.iter().enumerate() {
                    check_color(color, &format!("{prefix}.data.palette[{index}]"), issues);
                }
            }
            _ => {}
        }

        if !chart.data.is_ranking() && chart.series.is_empty() {
            push(issues, format!("{prefix}.series"), "at least one series is required");
        }
        for (index, series) in chart.series.iter().enumerate() {
            let field = format!("{prefix}.series[{index}]");
            check_color(&series.color, &format!("{field}.color"), issues);
            if !(0.0..=1.0).contains(&series.opacity) {
                push(issues, format!("{field}.opacity"), format!("{} is outside [0, 1]", series.opacity));
            }
        }

        for (index, rolling) in chart.transform.rolling.iter().enumerate() {
            if rolling.window == 0 {
                push(issues, format!("{prefix}.transform.rolling[{index}].window"), "window must be positive");
            }
        }
        if let Some(ratio) = &chart.transform.ratio {
            if !ratio.scale.is_finite() {
                push(issues, format!("{prefix}.transform.ratio.scale"), "scale must be finite");
            }
        }
    }
}

fn push(issues: &mut Vec<ValidationIssue>, field: impl Into<String>, message: impl Into<String>) {
    issues.push(ValidationIssue {
        field: field.into(),
        message: message.into(),
    });
}

fn check_color(color: &str, field: &str, issues: &mut Vec<ValidationIssue>) {
    if parse_hex_color(color).is_none() {
        push(issues, field, format!("invalid color '{color}', expected #rrggbb"));
    }
}
