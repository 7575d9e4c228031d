//! Chart renderer trait, the seam between reshaping and drawing.

use crate::chart_spec::ChartSpec;
use crate::wide_table::WideTable;
use covidviz_common::Result;

/// Draws charts and persists them at [`ChartSpec::output_path`].
#[cfg_attr(test, mockall::automock)]
pub trait ChartRenderer {
    /// Draws one series per [`ChartSpec::series`] entry over the table's dates.
    fn render_time_series(&self, table: &WideTable, spec: &ChartSpec) -> Result<()>;

    /// Draws one bar per `(category, value)` pair, in order.
    fn render_ranking(&self, ranking: &[(String, f64)], spec: &ChartSpec) -> Result<()>;

    /// Gets the name of this renderer.
    fn name(&self) -> &'static str;
}
