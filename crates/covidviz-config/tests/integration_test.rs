//! Integration tests for covidviz-config crate.

use covidviz_common::{AxisFormat, Frequency};
use covidviz_config::{
    ChartData, ConfigLoader, ConfigValidator, Preset, SourceLocation, WCOTA_STATES, WCOTA_URL,
};
use std::path::PathBuf;

#[test]
fn test_every_preset_validates() {
    for preset in [Preset::Kaggle, Preset::Owid, Preset::Wcota] {
        let config = preset.config();
        assert!(ConfigValidator::validate(&config).is_ok(), "{preset} should validate");
    }
}

#[test]
fn test_wcota_lethality_chart() {
    let config = Preset::Wcota.config();
    let chart = config
        .charts
        .iter()
        .find(|c| c.file_name == "brasil_letalidade_semanal.png")
        .expect("lethality chart");

    assert_eq!(chart.axis, AxisFormat::Percent);
    let resample = chart.transform.resample.expect("weekly resample");
    assert_eq!(resample.frequency, Frequency::Weekly);
    let ratio = chart.transform.ratio.as_ref().expect("ratio");
    assert_eq!(ratio.numerator, "new_deaths");
    assert_eq!(ratio.denominator, "new_cases");
    assert!((ratio.scale - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_wcota_state_charts_cover_all_states() {
    let config = Preset::Wcota.config();
    let chart = &config.charts[3];
    match &chart.data {
        ChartData::Categories { categories, .. } => assert_eq!(categories.len(), WCOTA_STATES.len()),
        other => panic!("unexpected data selection: {other:?}"),
    }
    assert_eq!(chart.legend_title.as_deref(), Some("Estado"));
}

#[test]
fn test_preset_round_trips_through_yaml() {
    let config = Preset::Wcota.config();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed = ConfigLoader::from_yaml_str(&yaml).unwrap();
    assert_eq!(parsed, config);
    assert_eq!(parsed.source.location(), SourceLocation::Url(WCOTA_URL.to_string()));
}

#[test]
fn test_output_dir_override() {
    let config = ConfigLoader::load_with(Preset::Kaggle, |name| {
        (name == "COVIDVIZ_OUTPUT_DIR").then(|| "charts".to_string())
    })
    .unwrap();
    assert_eq!(config.output.dir, PathBuf::from("charts"));
}
