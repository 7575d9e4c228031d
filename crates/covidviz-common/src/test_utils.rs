//! Test utilities and fixtures shared by the covidviz crates.
//!
//! Enabled for downstream crates through the `testing` feature.

use chrono::NaiveDate;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Shorthand for a calendar date in tests.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Consecutive daily dates starting at `start`.
pub fn daily_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    start.iter_days().take(count).collect()
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "tempfile")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// CSV fixtures in the shapes of the three supported sources.
pub mod csv_fixtures {
    /// Smallest useful dataset: a `data` date alias and two metric columns.
    pub fn minimal_csv() -> &'static str {
        "data,casosAcumulado,obitosAcumulado\n\
         2020-03-01,10,1\n\
         2020-03-02,15,1\n\
         2020-03-03,25,2\n"
    }

    /// OWID-style long table with two locations and gaps.
    pub fn owid_csv() -> &'static str {
        concat!(
            "iso_code,location,date,total_cases,new_cases,total_deaths,new_deaths,total_vaccinations\n",
            "BRA,Brazil,2021-01-04,100,10,5,1,\n",
            "BRA,Brazil,2021-01-05,120,20,6,1,50\n",
            "BRA,Brazil,2021-01-06,150,30,8,2,\n",
            "BRA,Brazil,2021-01-07,190,40,10,2,90\n",
            "OWID_WRL,World,2021-01-04,1000,100,50,10,\n",
            "OWID_WRL,World,2021-01-05,1100,100,60,10,\n",
            "OWID_WRL,World,2021-01-06,1250,150,75,15,\n",
            "OWID_WRL,World,2021-01-07,1400,150,90,15,\n",
            "ARG,Argentina,2021-01-04,80,8,4,0,\n",
        )
    }

    /// wcota-style state table covering two full weeks for three states plus TOTAL.
    pub fn wcota_csv() -> String {
        let mut csv = String::from(
            "epi_week,date,country,state,city,newDeaths,deaths,newCases,totalCases,deaths_per_100k_inhabitants\n",
        );
        let states = [("SP", 10.0, 1.0), ("RJ", 5.0, 1.0), ("AM", 2.0, 0.0)];
        for day in 0..14u32 {
            let date = super::date(2021, 3, 1) + chrono::Duration::days(i64::from(day));
            let mut total_cases = 0.0;
            let mut total_deaths = 0.0;
            for (index, (state, cases, deaths)) in states.iter().enumerate() {
                let per_100k = f64::from(day + 1) * (index as f64 + 1.0);
                csv.push_str(&format!(
                    "9,{date},Brazil,{state},TOTAL,{deaths},0,{cases},0,{per_100k}\n"
                ));
                total_cases += cases;
                total_deaths += deaths;
            }
            csv.push_str(&format!(
                "9,{date},Brazil,TOTAL,TOTAL,{total_deaths},0,{total_cases},0,999\n"
            ));
        }
        csv
    }
}
