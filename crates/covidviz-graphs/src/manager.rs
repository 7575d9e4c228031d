//! Chart manager orchestrating one pipeline run.

use crate::chart_spec::ChartSpec;
use crate::data_fetcher::DataFetcher;
use crate::dataset::Dataset;
use crate::loader::DatasetLoader;
use crate::traits::ChartRenderer;
use crate::transform::{apply_transforms, rank_categories, select};
use covidviz_common::{CovidVizError, Result};
use covidviz_config::{ChartData, ChartDefinition, PipelineConfig};
use tracing::{error, info, info_span, warn};

/// Outcome of a run: charts written and charts that failed with their error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub rendered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.rendered.len() + self.failed.len()
    }
}

/// Loads the dataset once, then renders every configured chart in order.
///
/// A failing chart is logged and skipped; only loading failures abort the run.
pub struct ChartManager<R: ChartRenderer> {
    config: PipelineConfig,
    renderer: R,
}

impl<R: ChartRenderer> ChartManager<R> {
    pub const fn new(config: PipelineConfig, renderer: R) -> Self {
        Self { config, renderer }
    }

    /// Fetches and parses the source, then renders all charts.
    pub fn run(&self, fetcher: &DataFetcher) -> Result<RunReport> {
        let dataset = DatasetLoader::new(&self.config.source).load(fetcher)?;
        if dataset.is_empty() {
            warn!(source = %self.config.source.name, "Dataset has no rows after filtering");
        }
        self.run_with_dataset(&dataset)
    }

    /// Renders all charts from an already loaded dataset.
    pub fn run_with_dataset(&self, dataset: &Dataset) -> Result<RunReport> {
        let dir = &self.config.output.dir;
        std::fs::create_dir_all(dir).map_err(|e| {
            CovidVizError::config_with_source(
                format!("Failed to create output directory '{}'", dir.display()),
                e,
            )
        })?;

        let mut report = RunReport::default();
        for chart in &self.config.charts {
            let span = info_span!("chart", chart = %chart.name);
            let _guard = span.enter();
            match self.process_chart(chart, dataset) {
                Ok(()) => report.rendered.push(chart.name.clone()),
                Err(err) => {
                    error!(error = %err, "Failed to generate chart");
                    report.failed.push((chart.name.clone(), err.to_string()));
                }
            }
        }

        info!(
            renderer = self.renderer.name(),
            rendered = report.rendered.len(),
            failed = report.failed.len(),
            "Chart generation finished"
        );
        Ok(report)
    }

    /// Selects, transforms and renders a single chart.
    pub fn process_chart(&self, chart: &ChartDefinition, dataset: &Dataset) -> Result<()> {
        let spec = ChartSpec::from_definition(chart, &self.config.output)?;
        match &chart.data {
            ChartData::Ranking {
                metric,
                top,
                exclude,
                ..
            } => {
                let ranking = rank_categories(dataset, metric, *top, exclude)?;
                if ranking.is_empty() {
                    return Err(CovidVizError::graph(format!("No category has values for '{metric}'")));
                }
                self.renderer.render_ranking(&ranking, &spec)
            }
            data => {
                let table = apply_transforms(select(dataset, data)?, &chart.transform)?;
                self.renderer.render_time_series(&table, &spec)
            }
        }
    }
}
