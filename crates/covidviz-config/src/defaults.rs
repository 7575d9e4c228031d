//! Default values and the built-in chart lists of the three supported sources.

use crate::schema::default_user_agent;
use crate::schema::*;
use covidviz_common::{Aggregation, AxisFormat, Frequency, SeriesKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// User-Agent the wcota source is downloaded with.
pub const WCOTA_USER_AGENT: &str = "Mozilla/5.0 (GitHub Actions - COVID Bot)";

/// Brazilian state-level dataset maintained by wcota.
pub const WCOTA_URL: &str =
    "https://raw.githubusercontent.com/wcota/covid19br/master/cases-brazil-states.csv";

/// States compared in the per-state charts.
pub const WCOTA_STATES: [&str; 8] = ["SP", "RJ", "RS", "BA", "MG", "CE", "PE", "PR"];

// husl palette with eight hues
const STATE_COLORS: [&str; 8] = [
    "#f77189", "#d58c32", "#a4a031", "#50b131", "#34ae91", "#37abb5", "#3ba3ec", "#bb83f4",
];

// Reds, darkest first
const REDS_REVERSED: [&str; 5] = ["#a50f15", "#de2d26", "#fb6a4a", "#fcae91", "#fee5d9"];

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("imgs"),
            width: 1000,
            height: 500,
            background: "#ffffff".to_string(),
            date_format: "%m/%Y".to_string(),
            font_paths: default_font_paths(),
        }
    }
}

/// Usual locations of a sans-serif TrueType font on Linux, macOS and Windows.
pub fn default_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

/// The built-in pipelines, one per binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Ministry-of-Health style CSV published on Kaggle.
    Kaggle,
    /// Our World in Data aggregated dataset.
    Owid,
    /// wcota/covid19br state-level dataset.
    Wcota,
}

impl Preset {
    /// Returns the string representation of the preset.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kaggle => "kaggle",
            Self::Owid => "owid",
            Self::Wcota => "wcota",
        }
    }

    /// Builds the preset's full configuration.
    pub fn config(self) -> PipelineConfig {
        match self {
            Self::Kaggle => kaggle_config(),
            Self::Owid => owid_config(),
            Self::Wcota => wcota_config(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn aliases(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(logical, physical)| ((*logical).to_string(), strings(physical)))
        .collect()
}

fn line(column: &str, label: &str, color: &str) -> SeriesConfig {
    SeriesConfig {
        column: column.to_string(),
        label: Some(label.to_string()),
        color: color.to_string(),
        opacity: 1.0,
        kind: SeriesKind::Line,
        line_width: 2,
    }
}

fn bar(column: &str, label: &str, color: &str, opacity: f64) -> SeriesConfig {
    SeriesConfig {
        kind: SeriesKind::Bar,
        opacity,
        ..line(column, label, color)
    }
}

fn chart(name: &str, title: &str, x_label: &str, y_label: &str, data: ChartData) -> ChartDefinition {
    ChartDefinition {
        name: name.to_string(),
        file_name: format!("{name}.png"),
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        data,
        transform: TransformConfig::default(),
        series: Vec::new(),
        axis: AxisFormat::Count,
        legend_title: None,
        date_format: None,
        size: None,
    }
}

fn metrics_of(category: Option<&str>, metrics: &[&str]) -> ChartData {
    ChartData::Metrics {
        metrics: strings(metrics),
        category: category.map(ToString::to_string),
        exclude: Vec::new(),
    }
}

fn kaggle_config() -> PipelineConfig {
    let source = SourceConfig {
        name: "kaggle".to_string(),
        location: "brazil_covid19.csv".to_string(),
        user_agent: default_user_agent(),
        timeout_seconds: None,
        columns: ColumnAliases {
            date: strings(&["data", "date"]),
            category: strings(&["regiao"]),
            metrics: aliases(&[
                ("total_cases", &["casosAcumulado", "cases"]),
                ("total_deaths", &["obitosAcumulado", "deaths"]),
                ("new_cases", &["casosNovos", "new_cases"]),
                ("new_deaths", &["obitosNovos", "new_deaths"]),
            ]),
        },
        category_filter: strings(&["Brasil"]),
        default_category: "Brasil".to_string(),
        required_metrics: Vec::new(),
        date_range: None,
    };

    let mut accumulated = chart(
        "acumulados_kaggle",
        "COVID-19 no Brasil (Kaggle): Casos e Mortes Acumuladas",
        "Data",
        "Total",
        metrics_of(None, &["total_cases", "total_deaths"]),
    );
    accumulated.series = vec![
        line("total_cases", "Casos Acumulados", "#1f77b4"),
        line("total_deaths", "Mortes Acumuladas", "#ff7f0e"),
    ];

    let mut new_cases = chart(
        "novos_casos_kaggle",
        "Novos Casos Diários (Kaggle)",
        "Data",
        "Casos por dia",
        metrics_of(None, &["new_cases"]),
    );
    new_cases.series = vec![line("new_cases", "Novos casos", "#ffa500")];

    let mut new_deaths = chart(
        "novas_mortes_kaggle",
        "Novas Mortes Diárias (Kaggle)",
        "Data",
        "Mortes por dia",
        metrics_of(None, &["new_deaths"]),
    );
    new_deaths.series = vec![line("new_deaths", "Novas mortes", "#ff0000")];

    PipelineConfig {
        source,
        output: OutputConfig::default(),
        charts: vec![accumulated, new_cases, new_deaths],
    }
}

/// Raw daily values as translucent bars with their 7-day mean on top.
fn daily_with_mean(
    name: &str,
    title: &str,
    y_label: &str,
    category: &str,
    metric: &str,
    color: &str,
) -> ChartDefinition {
    let mean = format!("{metric}_7d");
    let mut definition = chart(name, title, "Data", y_label, metrics_of(Some(category), &[metric]));
    definition.transform.rolling = vec![RollingConfig {
        column: metric.to_string(),
        window: 7,
        name: Some(mean.clone()),
    }];
    definition.series = vec![
        bar(metric, "Valor diário", color, 0.35),
        line(&mean, "Média móvel (7 dias)", color),
    ];
    definition
}

fn owid_config() -> PipelineConfig {
    let source = SourceConfig {
        name: "owid".to_string(),
        location: "owid-covid-data.csv".to_string(),
        user_agent: default_user_agent(),
        timeout_seconds: None,
        columns: ColumnAliases {
            date: strings(&["date"]),
            category: strings(&["location", "country"]),
            metrics: aliases(&[
                ("total_cases", &["total_cases"]),
                ("new_cases", &["new_cases"]),
                ("total_deaths", &["total_deaths"]),
                ("new_deaths", &["new_deaths"]),
                ("total_vaccinations", &["total_vaccinations"]),
            ]),
        },
        category_filter: strings(&["Brazil", "World"]),
        default_category: "Brazil".to_string(),
        required_metrics: Vec::new(),
        date_range: None,
    };

    let mut accumulated = chart(
        "acumulados",
        "COVID-19 no Brasil: Casos e Mortes Acumuladas",
        "Data",
        "Total",
        metrics_of(Some("Brazil"), &["total_cases", "total_deaths"]),
    );
    accumulated.series = vec![
        line("total_cases", "Casos Acumulados", "#1f77b4"),
        line("total_deaths", "Mortes Acumuladas", "#ff7f0e"),
    ];

    let mut vaccination = chart(
        "vacinacao",
        "Total de Doses de Vacina Aplicadas no Brasil",
        "Data",
        "Doses acumuladas",
        metrics_of(Some("Brazil"), &["total_vaccinations"]),
    );
    vaccination.series = vec![line("total_vaccinations", "Doses aplicadas", "#008000")];

    PipelineConfig {
        source,
        output: OutputConfig::default(),
        charts: vec![
            accumulated,
            daily_with_mean(
                "novos_casos",
                "Novos Casos Diários de COVID-19 no Brasil",
                "Casos por dia",
                "Brazil",
                "new_cases",
                "#ffa500",
            ),
            daily_with_mean(
                "novas_mortes",
                "Novas Mortes Diárias de COVID-19 no Brasil",
                "Mortes por dia",
                "Brazil",
                "new_deaths",
                "#ff0000",
            ),
            vaccination,
            daily_with_mean(
                "world_deaths",
                "Novas Mortes Diárias de COVID-19 no Mundo",
                "Mortes por dia",
                "World",
                "new_deaths",
                "#d62728",
            ),
        ],
    }
}

fn weekly_sum() -> Option<ResampleConfig> {
    Some(ResampleConfig {
        frequency: Frequency::Weekly,
        aggregation: Aggregation::Sum,
    })
}

fn national(metrics: &[&str]) -> ChartData {
    ChartData::Metrics {
        metrics: strings(metrics),
        category: None,
        exclude: strings(&["TOTAL"]),
    }
}

fn per_state(name: &str, title: &str, y_label: &str, metric: &str) -> ChartDefinition {
    let mut definition = chart(
        name,
        title,
        "",
        y_label,
        ChartData::Categories {
            metric: metric.to_string(),
            categories: strings(&WCOTA_STATES),
        },
    );
    definition.transform.resample = weekly_sum();
    definition.series = WCOTA_STATES
        .iter()
        .zip(STATE_COLORS)
        .map(|(state, color)| SeriesConfig {
            opacity: 0.8,
            ..line(state, state, color)
        })
        .collect();
    definition.legend_title = Some("Estado".to_string());
    definition.date_format = Some("%m/%Y".to_string());
    definition.size = Some(ImageSize {
        width: 1400,
        height: 700,
    });
    definition
}

fn wcota_config() -> PipelineConfig {
    let source = SourceConfig {
        name: "wcota".to_string(),
        location: WCOTA_URL.to_string(),
        user_agent: WCOTA_USER_AGENT.to_string(),
        timeout_seconds: None,
        columns: ColumnAliases {
            date: strings(&["date"]),
            category: strings(&["state"]),
            metrics: aliases(&[
                ("new_cases", &["newCases"]),
                ("new_deaths", &["newDeaths"]),
                ("deaths_per_100k", &["deaths_per_100k_inhabitants"]),
            ]),
        },
        category_filter: Vec::new(),
        default_category: "Brasil".to_string(),
        required_metrics: strings(&["new_cases", "new_deaths", "deaths_per_100k"]),
        date_range: None,
    };

    let mut weekly_cases = chart(
        "brasil_casos_semanais",
        "Casos Semanais de COVID-19 no Brasil",
        "",
        "Casos por semana",
        national(&["new_cases"]),
    );
    weekly_cases.transform.resample = weekly_sum();
    weekly_cases.series = vec![line("new_cases", "Casos", "#1f77b4")];

    let mut weekly_deaths = chart(
        "brasil_mortes_semanais",
        "Óbitos Semanais de COVID-19 no Brasil",
        "",
        "Óbitos por semana",
        national(&["new_deaths"]),
    );
    weekly_deaths.transform.resample = weekly_sum();
    weekly_deaths.series = vec![line("new_deaths", "Óbitos", "#d62728")];

    let mut lethality = chart(
        "brasil_letalidade_semanal",
        "Taxa de Letalidade Semanal (%)",
        "",
        "Porcentagem",
        national(&["new_cases", "new_deaths"]),
    );
    lethality.transform.resample = weekly_sum();
    lethality.transform.ratio = Some(RatioConfig {
        numerator: "new_deaths".to_string(),
        denominator: "new_cases".to_string(),
        name: "letalidade".to_string(),
        scale: 100.0,
    });
    lethality.series = vec![line("letalidade", "Letalidade", "#2ca02c")];
    lethality.axis = AxisFormat::Percent;

    let ranking = chart(
        "top5_obitos_per_capita",
        "Top 5 Estados - Óbitos por 100 mil habitantes",
        "",
        "Óbitos por 100 mil hab.",
        ChartData::Ranking {
            metric: "deaths_per_100k".to_string(),
            top: 5,
            exclude: strings(&["TOTAL"]),
            palette: strings(&REDS_REVERSED),
        },
    );

    PipelineConfig {
        source,
        output: OutputConfig {
            width: 1200,
            height: 600,
            ..OutputConfig::default()
        },
        charts: vec![
            weekly_cases,
            weekly_deaths,
            lethality,
            per_state("estados_casos", "Casos Semanais por Estado", "Casos por semana", "new_cases"),
            per_state("estados_mortes", "Óbitos Semanais por Estado", "Óbitos por semana", "new_deaths"),
            ranking,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_names(preset: Preset) -> Vec<String> {
        preset.config().charts.into_iter().map(|c| c.file_name).collect()
    }

    #[test]
    fn test_kaggle_charts() {
        assert_eq!(
            file_names(Preset::Kaggle),
            vec!["acumulados_kaggle.png", "novos_casos_kaggle.png", "novas_mortes_kaggle.png"]
        );
    }

    #[test]
    fn test_owid_charts() {
        assert_eq!(
            file_names(Preset::Owid),
            vec![
                "acumulados.png",
                "novos_casos.png",
                "novas_mortes.png",
                "vacinacao.png",
                "world_deaths.png"
            ]
        );
        let config = Preset::Owid.config();
        let daily = &config.charts[1];
        assert_eq!(daily.series[0].kind, SeriesKind::Bar);
        assert_eq!(daily.series[1].column, "new_cases_7d");
    }

    #[test]
    fn test_wcota_source() {
        let config = Preset::Wcota.config();
        assert_eq!(config.source.user_agent, WCOTA_USER_AGENT);
        assert_eq!(config.source.location(), SourceLocation::Url(WCOTA_URL.to_string()));
        assert_eq!(config.charts.len(), 6);
        assert!(config.charts[5].data.is_ranking());
        assert_eq!(config.charts[3].series.len(), WCOTA_STATES.len());
    }

    #[test]
    fn test_wcota_keeps_only_complete_rows() {
        let source = Preset::Wcota.config().source;
        assert_eq!(source.default_category, "Brasil");
        assert_eq!(source.required_metrics, vec!["new_cases", "new_deaths", "deaths_per_100k"]);
        assert!(Preset::Kaggle.config().source.required_metrics.is_empty());
    }

    #[test]
    fn test_output_defaults() {
        let output = OutputConfig::default();
        assert_eq!(output.dir, PathBuf::from("imgs"));
        assert_eq!(output.date_format, "%m/%Y");
        assert!(!output.font_paths.is_empty());
    }

    #[test]
    fn test_preset_display() {
        assert_eq!(Preset::Owid.to_string(), "owid");
    }
}
