//! Per-participant document assembly: discovery → load → normalize →
//! metrics, driven uniformly by the category registry.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error};

use crate::category::{CategorySpec, OutputShape, REGISTRY};
use crate::discover::discover_input_files;
use crate::loader::load_file;
use crate::metrics::{compute_metrics, compute_rolling_average, MetricSummary};
use crate::normalize::meals::group_by_date;
use crate::normalize::NormalizedSeries;

/// One category's slot in the participant document. Fields not produced for
/// the category are absent from the serialized output, not null.
#[derive(Debug, Default, Serialize)]
pub struct CategoryBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series: Option<NormalizedSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, MetricSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_averages: Option<NormalizedSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_date: Option<BTreeMap<String, Vec<String>>>,
}

/// Category name → bundle. Categories without input data are absent keys;
/// consumers must treat absence as "no data of this type".
pub type ParticipantDocument = BTreeMap<String, CategoryBundle>;

/// Runs the full pipeline for one participant directory.
///
/// Failures are isolated per category: a file that loads or normalizes badly
/// is logged and dropped from the document while the remaining categories
/// still go through. Only discovery of the directory itself is fatal.
pub fn process_participant(
    input_dir: &Path,
    rolling_windows: &[usize],
) -> Result<ParticipantDocument> {
    let files = discover_input_files(input_dir)?;
    let mut document = ParticipantDocument::new();

    for spec in REGISTRY {
        let Some(path) = files.get(&spec.category) else {
            continue;
        };
        debug!(category = %spec.category, path = %path.display(), "Processing category file");

        let bundle = match build_bundle(spec, path, rolling_windows) {
            Ok(bundle) => bundle,
            Err(e) => {
                error!(category = %spec.category, path = %path.display(), error = %e,
                    "Category processing failed, omitting from document");
                continue;
            }
        };
        document.insert(spec.category.as_str().to_string(), bundle);
    }

    Ok(document)
}

fn build_bundle(
    spec: &CategorySpec,
    path: &Path,
    rolling_windows: &[usize],
) -> Result<CategoryBundle> {
    let raw = load_file(path, spec.format)?;
    let series = (spec.normalize)(&raw)?;

    let bundle = match spec.shape {
        OutputShape::MetricsOnly => CategoryBundle {
            metrics: Some(compute_metrics(&series, spec.metric_columns)),
            ..Default::default()
        },
        OutputShape::MealsLog => CategoryBundle {
            by_date: Some(group_by_date(&series)),
            time_series: Some(series),
            ..Default::default()
        },
        OutputShape::TimeSeries => {
            let metrics = compute_metrics(&series, spec.metric_columns);
            let moving_averages = if spec.rolling_columns.is_empty() {
                None
            } else {
                Some(compute_rolling_average(
                    &series,
                    spec.rolling_columns,
                    rolling_windows,
                ))
            };
            CategoryBundle {
                time_series: Some(series),
                metrics: Some(metrics),
                moving_averages,
                ..Default::default()
            }
        }
    };
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_steps_only_participant() {
        let base = fixture_dir("health_hub_aggregate_steps");
        let physio = base.join("physio_data");
        fs::create_dir_all(&physio).unwrap();
        fs::write(
            physio.join("steps_2024.csv"),
            "logDate,steps\n1700000000,4200\n1700086400,5100\n1700172800,3900\n",
        )
        .unwrap();

        let document = process_participant(&base, &[7, 30]).unwrap();

        assert_eq!(document.len(), 1);
        let steps = &document["steps"];
        assert_eq!(steps.time_series.as_ref().unwrap().len(), 3);
        assert!(steps.metrics.as_ref().unwrap().contains_key("steps"));
        let ma = steps.moving_averages.as_ref().unwrap();
        assert_eq!(ma.rows[0].number("steps_ma7"), Some(4200.0));
        assert_eq!(ma.rows[2].number("steps_ma7"), Some(4400.0));

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_bad_category_is_omitted_not_fatal() {
        let base = fixture_dir("health_hub_aggregate_isolation");
        let physio = base.join("physio_data");
        let lungs = base.join("lungs_data");
        fs::create_dir_all(&physio).unwrap();
        fs::create_dir_all(&lungs).unwrap();
        fs::write(physio.join("steps.csv"), "logDate,steps\n1700000000,4200\n").unwrap();
        // lung csv missing the FEV1/FVC column: normalization must fail
        fs::write(lungs.join("spirometry.csv"), "FEV1\n3.1\n").unwrap();

        let document = process_participant(&base, &[7]).unwrap();

        assert!(document.contains_key("steps"));
        assert!(!document.contains_key("lung_function"));

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_meals_bundle_has_by_date_and_no_metrics() {
        let base = fixture_dir("health_hub_aggregate_meals");
        let meals = base.join("meals_data");
        fs::create_dir_all(&meals).unwrap();
        fs::write(
            meals.join("meals.csv"),
            "time,dish\n1700000000,soup\n1700003600,bread\n",
        )
        .unwrap();

        let document = process_participant(&base, &[7, 30]).unwrap();
        let bundle = &document["meals"];

        assert!(bundle.metrics.is_none());
        assert!(bundle.moving_averages.is_none());
        let by_date = bundle.by_date.as_ref().unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date["2023-11-14"], vec!["soup", "bread"]);

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_lung_function_bundle_is_metrics_only() {
        let base = fixture_dir("health_hub_aggregate_lungs");
        let lungs = base.join("lungs_data");
        fs::create_dir_all(&lungs).unwrap();
        fs::write(lungs.join("spirometry.csv"), "FEV1,FEV1/FVC\n3.2,0.81\n").unwrap();

        let document = process_participant(&base, &[7, 30]).unwrap();
        let bundle = &document["lung_function"];

        assert!(bundle.time_series.is_none());
        let metrics = bundle.metrics.as_ref().unwrap();
        assert_eq!(metrics["fev1"].mean, 3.2);
        assert_eq!(metrics["fev1_fvc"].count, 1);

        fs::remove_dir_all(&base).unwrap();
    }
}
