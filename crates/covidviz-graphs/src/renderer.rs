//! Chart rendering with plotters' bitmap backend.

use crate::chart_spec::{ChartSpec, SeriesStyle};
use crate::fonts::{self, FONT_FAMILY};
use crate::traits::ChartRenderer;
use crate::wide_table::{Series, WideTable};
use covidviz_common::{format_date_tick, CovidVizError, Result, SeriesKind};
use plotters::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

const DEFAULT_BAR_COLOR: RGBColor = RGBColor(31, 119, 180);
const GRID_LIGHT: RGBColor = RGBColor(235, 235, 235);
const GRID_BOLD: RGBColor = RGBColor(210, 210, 210);

/// Renders PNG charts; draws no text at all when no font could be registered.
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    text: bool,
}

impl PlottersRenderer {
    /// Creates a renderer, registering the first usable font in `font_paths`.
    pub fn new(font_paths: &[PathBuf]) -> Self {
        Self {
            text: fonts::ensure_font(font_paths),
        }
    }

    /// Creates a renderer that never draws captions, tick labels or legends.
    pub const fn without_text() -> Self {
        Self { text: false }
    }
}

/// Value-axis bounds that always include zero, with headroom above the data.
fn value_bounds(min: f64, max: f64) -> (f64, f64) {
    let low = min.min(0.0);
    let mut high = max.max(0.0);
    if high - low < f64::EPSILON {
        high = low + 1.0;
    }
    let pad = (high - low) * 0.05;
    let low = if low < 0.0 { low - pad } else { low };
    (low, high + pad)
}

/// Smallest gap between consecutive x positions, 1 when there is none.
fn min_spacing(offsets: &[f64]) -> f64 {
    offsets
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold(None, |min: Option<f64>, gap| Some(min.map_or(gap, |m| m.min(gap))))
        .unwrap_or(1.0)
}

/// Splits a column into runs of present values so gaps are not bridged.
fn segments(offsets: &[f64], values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for (&x, value) in offsets.iter().zip(values) {
        match value {
            Some(y) => current.push((x, *y)),
            None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

impl ChartRenderer for PlottersRenderer {
    fn render_time_series(&self, table: &WideTable, spec: &ChartSpec) -> Result<()> {
        let Some(&origin) = table.index().first() else {
            return Err(CovidVizError::graph(format!("No rows to plot for '{}'", spec.name)));
        };
        if spec.series.is_empty() {
            return Err(CovidVizError::graph(format!("No series configured for '{}'", spec.name)));
        }

        // Resolve every column before the output file is touched
        let columns: Vec<(&SeriesStyle, &Series)> = spec
            .drawing_order()
            .map(|style| table.get(&style.column).map(|series| (style, series)))
            .collect::<Result<_>>()?;

        let names: Vec<&str> = spec.series.iter().map(|s| s.column.as_str()).collect();
        let (min, max) = table.value_range(&names).ok_or_else(|| {
            CovidVizError::graph(format!("Every value is missing in chart '{}'", spec.name))
        })?;
        let (y_start, y_end) = value_bounds(min, max);

        let offsets: Vec<f64> = table
            .index()
            .iter()
            .map(|date| (*date - origin).num_days() as f64)
            .collect();
        let bar_width = 0.8 * min_spacing(&offsets);
        let has_bars = spec.series.iter().any(|s| s.kind == SeriesKind::Bar);
        let last = offsets.last().copied().unwrap_or(0.0);
        let x_pad = if has_bars { bar_width } else { 0.0 };
        let (x_start, x_end) = if last > 0.0 {
            (-x_pad, last + x_pad)
        } else {
            (-1.0, 1.0)
        };

        let root = BitMapBackend::new(&spec.output_path, (spec.width, spec.height)).into_drawing_area();
        root.fill(&spec.background)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.text {
            builder
                .caption(&spec.title, (FONT_FAMILY, 24))
                .x_label_area_size(50)
                .y_label_area_size(80);
        }
        let mut chart = builder.build_cartesian_2d(x_start..x_end, y_start..y_end)?;

        if self.text {
            let date_format = spec.date_format.as_str();
            let x_formatter = |x: &f64| format_date_tick(origin, *x, date_format);
            let y_formatter = |y: &f64| spec.format_value(*y);
            chart
                .configure_mesh()
                .x_labels(8)
                .y_labels(8)
                .x_label_formatter(&x_formatter)
                .y_label_formatter(&y_formatter)
                .x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .label_style((FONT_FAMILY, 14))
                .axis_desc_style((FONT_FAMILY, 16))
                .light_line_style(GRID_LIGHT)
                .bold_line_style(GRID_BOLD)
                .draw()?;

            if let Some(title) = &spec.legend_title {
                // an empty series gives the legend a heading row
                chart
                    .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                    .label(title.as_str());
            }
        }

        for (style, series) in &columns {
            let color = style.color.mix(style.opacity);
            match style.kind {
                SeriesKind::Bar => {
                    let half = bar_width / 2.0;
                    let bars = offsets.iter().zip(&series.values).filter_map(|(&x, value)| {
                        value.map(|y| Rectangle::new([(x - half, 0.0), (x + half, y)], color.filled()))
                    });
                    let annotation = chart.draw_series(bars)?;
                    if self.text {
                        annotation
                            .label(style.label.as_str())
                            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 16, y + 5)], color.filled()));
                    }
                }
                SeriesKind::Line => {
                    let width = style.line_width;
                    let mut labelled = false;
                    for segment in segments(&offsets, &series.values) {
                        let annotation = chart.draw_series(LineSeries::new(segment, color.stroke_width(width)))?;
                        if self.text && !labelled {
                            annotation.label(style.label.as_str()).legend(move |(x, y)| {
                                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width))
                            });
                            labelled = true;
                        }
                    }
                }
            }
        }

        if self.text && (spec.series.len() > 1 || spec.legend_title.is_some()) {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .label_font((FONT_FAMILY, 14))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK.mix(0.4))
                .draw()?;
        }

        root.present()?;
        if !self.text {
            debug!(chart = %spec.name, "Rendered without text");
        }
        info!("Successfully rendered chart to {}", spec.output_path.display());
        Ok(())
    }

    fn render_ranking(&self, ranking: &[(String, f64)], spec: &ChartSpec) -> Result<()> {
        if ranking.is_empty() {
            return Err(CovidVizError::graph(format!("Nothing to rank for '{}'", spec.name)));
        }

        let min = ranking.iter().map(|(_, value)| *value).fold(0.0, f64::min);
        let max = ranking.iter().map(|(_, value)| *value).fold(0.0, f64::max);
        let (y_start, y_end) = value_bounds(min, max);

        let root = BitMapBackend::new(&spec.output_path, (spec.width, spec.height)).into_drawing_area();
        root.fill(&spec.background)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.text {
            builder
                .caption(&spec.title, (FONT_FAMILY, 24))
                .x_label_area_size(50)
                .y_label_area_size(80);
        }
        let mut chart = builder.build_cartesian_2d((0..ranking.len()).into_segmented(), y_start..y_end)?;

        if self.text {
            let x_formatter = |segment: &SegmentValue<usize>| match segment {
                SegmentValue::CenterOf(index) | SegmentValue::Exact(index) => ranking
                    .get(*index)
                    .map(|(category, _)| category.clone())
                    .unwrap_or_default(),
                SegmentValue::Last => String::new(),
            };
            let y_formatter = |y: &f64| spec.format_value(*y);
            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(ranking.len())
                .x_label_formatter(&x_formatter)
                .y_label_formatter(&y_formatter)
                .x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .label_style((FONT_FAMILY, 14))
                .axis_desc_style((FONT_FAMILY, 16))
                .light_line_style(GRID_LIGHT)
                .bold_line_style(GRID_BOLD)
                .draw()?;
        }

        chart.draw_series(ranking.iter().enumerate().map(|(index, (_, value))| {
            let color = if spec.palette.is_empty() {
                DEFAULT_BAR_COLOR
            } else {
                spec.palette[index % spec.palette.len()]
            };
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(index), 0.0), (SegmentValue::Exact(index + 1), *value)],
                color.filled(),
            );
            bar.set_margin(0, 0, 12, 12);
            bar
        }))?;

        root.present()?;
        info!("Successfully rendered ranking chart to {}", spec.output_path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "plotters"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covidviz_common::test_utils::{daily_dates, date};
    use covidviz_config::{default_font_paths, Preset};
    use std::path::Path;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn assert_png(path: &Path) {
        let bytes = std::fs::read(path).expect("image written");
        assert!(bytes.starts_with(&PNG_SIGNATURE), "{} is not a PNG", path.display());
    }

    fn spec_for(preset: Preset, chart: usize, dir: &Path) -> ChartSpec {
        let mut config = preset.config();
        config.output.dir = dir.to_path_buf();
        ChartSpec::from_definition(&config.charts[chart], &config.output).unwrap()
    }

    fn daily_table(columns: &[&str]) -> WideTable {
        let index = daily_dates(date(2021, 1, 1), 30);
        let series = columns
            .iter()
            .map(|name| {
                let values = (0..30)
                    .map(|i| if i % 9 == 4 { None } else { Some(f64::from(i) * 100.0) })
                    .collect();
                Series::new(*name, values)
            })
            .collect();
        WideTable::from_columns(index, series).unwrap()
    }

    #[test]
    fn test_helpers() {
        assert_eq!(value_bounds(10.0, 100.0), (0.0, 105.0));
        assert_eq!(value_bounds(0.0, 0.0), (0.0, 1.05));
        assert_eq!(min_spacing(&[0.0, 7.0, 14.0]), 7.0);
        assert_eq!(min_spacing(&[3.0]), 1.0);
        let runs = segments(&[0.0, 1.0, 2.0, 3.0], &[Some(1.0), None, Some(2.0), Some(3.0)]);
        assert_eq!(runs, vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
    }

    #[test]
    fn test_plain_line_chart() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_for(Preset::Kaggle, 0, dir.path());
        let table = daily_table(&["total_cases", "total_deaths"]);

        PlottersRenderer::without_text().render_time_series(&table, &spec).unwrap();
        assert_png(&spec.output_path);
    }

    #[test]
    fn test_bars_with_mean_and_text_if_available() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_for(Preset::Owid, 1, dir.path());
        let table = daily_table(&["new_cases", "new_cases_7d"]);

        let renderer = PlottersRenderer::new(&default_font_paths());
        renderer.render_time_series(&table, &spec).unwrap();
        assert_png(&spec.output_path);
    }

    #[test]
    fn test_missing_column_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_for(Preset::Kaggle, 0, dir.path());
        let table = daily_table(&["total_cases"]);

        let err = PlottersRenderer::without_text().render_time_series(&table, &spec).unwrap_err();
        assert!(err.to_string().contains("total_deaths"));
        assert!(!spec.output_path.exists());
    }

    #[test]
    fn test_single_row_table() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_for(Preset::Kaggle, 1, dir.path());
        let table =
            WideTable::from_columns(vec![date(2021, 1, 1)], vec![Series::new("new_cases", vec![Some(5.0)])]).unwrap();

        PlottersRenderer::without_text().render_time_series(&table, &spec).unwrap();
        assert_png(&spec.output_path);
    }

    #[test]
    fn test_ranking_chart() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_for(Preset::Wcota, 5, dir.path());
        let ranking = vec![
            ("AM".to_string(), 9.5),
            ("RJ".to_string(), 8.0),
            ("SP".to_string(), 4.25),
        ];

        PlottersRenderer::without_text().render_ranking(&ranking, &spec).unwrap();
        assert_png(&spec.output_path);
        assert!(PlottersRenderer::without_text().render_ranking(&[], &spec).is_err());
    }
}
