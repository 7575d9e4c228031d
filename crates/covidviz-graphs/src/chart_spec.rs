//! Fully resolved drawing instructions for one chart.

use covidviz_common::{parse_hex_color, AxisFormat, CovidVizError, Result, SeriesKind};
use covidviz_config::{ChartData, ChartDefinition, OutputConfig};
use plotters::style::RGBColor;
use std::path::PathBuf;

/// Styling of one drawn column.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    pub column: String,
    pub label: String,
    pub color: RGBColor,
    pub opacity: f64,
    pub kind: SeriesKind,
    pub line_width: u32,
}

/// Everything a renderer needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub output_path: PathBuf,
    pub series: Vec<SeriesStyle>,
    pub axis: AxisFormat,
    pub date_format: String,
    pub legend_title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    /// Bar colors for ranking charts.
    pub palette: Vec<RGBColor>,
}

fn color(value: &str, field: &str) -> Result<RGBColor> {
    parse_hex_color(value)
        .map(|(r, g, b)| RGBColor(r, g, b))
        .ok_or_else(|| CovidVizError::validation_field(format!("Invalid color '{value}'"), field))
}

impl ChartSpec {
    /// Resolves a chart definition against the shared output settings.
    pub fn from_definition(definition: &ChartDefinition, output: &OutputConfig) -> Result<Self> {
        let series = definition
            .series
            .iter()
            .map(|series| {
                Ok(SeriesStyle {
                    column: series.column.clone(),
                    label: series.display_label().to_string(),
                    color: color(&series.color, "series.color")?,
                    opacity: series.opacity.clamp(0.0, 1.0),
                    kind: series.kind,
                    line_width: series.line_width.max(1),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let palette = match &definition.data {
            ChartData::Ranking { palette, .. } => palette
                .iter()
                .map(|value| color(value, "data.palette"))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        let (width, height) = definition
            .size
            .map_or((output.width, output.height), |size| (size.width, size.height));

        Ok(Self {
            name: definition.name.clone(),
            title: definition.title.clone(),
            x_label: definition.x_label.clone(),
            y_label: definition.y_label.clone(),
            output_path: output.dir.join(&definition.file_name),
            series,
            axis: definition.axis,
            date_format: definition
                .date_format
                .clone()
                .unwrap_or_else(|| output.date_format.clone()),
            legend_title: definition.legend_title.clone(),
            width,
            height,
            background: color(&output.background, "output.background")?,
            palette,
        })
    }

    /// Columns in drawing order: bars first, lines on top.
    pub fn drawing_order(&self) -> impl Iterator<Item = &SeriesStyle> {
        let bars = self.series.iter().filter(|s| s.kind == SeriesKind::Bar);
        let lines = self.series.iter().filter(|s| s.kind == SeriesKind::Line);
        bars.chain(lines)
    }

    /// Formats a value-axis tick according to [`ChartSpec::axis`].
    pub fn format_value(&self, value: f64) -> String {
        match self.axis {
            AxisFormat::Count => covidviz_common::format_compact(value),
            AxisFormat::Percent => covidviz_common::format_percent(value),
        }
    }
}
