#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Month registry and per-month hotspot classification.
//!
//! [`HotspotAnalyzer`] owns the immutable location table and the loaded
//! model. Historical months are labeled by thresholding a stored density
//! column; the result is memoized per month so repeated requests reuse
//! it. Predicted months run the model on every request. Nothing is ever
//! written back into the shared table, so concurrent requests for
//! different months cannot see each other's labels.

pub mod config;
pub mod registry;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use hotspot_map_analysis_models::{
    AnalysisConfig, Classification, ClassificationSource, ClassifiedLocation, ForecastOutput,
    MonthDefinition, MonthPlan,
};
use hotspot_map_dataset::{Dataset, DatasetError};
use hotspot_map_predictor::{PredictError, Predictor};
use hotspot_map_severity_models::{LabelPolicy, ThresholdError};
use thiserror::Error;

/// Errors from configuration loading and classification.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The requested month is not registered.
    #[error("Unknown month '{0}'")]
    UnknownMonth(String),

    /// A density column needed by a historical month is not in the table.
    #[error("Month '{month}' needs column '{column}', which is not in the location table")]
    MissingColumn {
        /// Month name.
        month: String,
        /// Missing column.
        column: String,
    },

    /// Reading the location table failed.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Model inference failed.
    #[error("Inference failed: {0}")]
    Inference(#[from] PredictError),

    /// A threshold is invalid.
    #[error("Invalid thresholds: {0}")]
    Threshold(#[from] ThresholdError),

    /// The configuration file is not valid TOML for [`AnalysisConfig`].
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Config path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Classifies the location table per month.
#[derive(Debug)]
pub struct HotspotAnalyzer {
    dataset: Arc<Dataset>,
    predictor: Arc<dyn Predictor>,
    config: AnalysisConfig,
    months: Vec<MonthDefinition>,
    cache: Mutex<BTreeMap<String, Arc<Classification>>>,
    threshold_runs: AtomicUsize,
}

impl HotspotAnalyzer {
    /// Creates an analyzer over a loaded table and model.
    ///
    /// Historical months whose density column is absent or not numeric are
    /// logged and fail only when requested.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if a threshold is invalid or the model's
    /// features differ from a predicted month's feature list.
    pub fn new(
        dataset: Arc<Dataset>,
        predictor: Arc<dyn Predictor>,
        config: AnalysisConfig,
        months: Vec<MonthDefinition>,
    ) -> Result<Self, AnalysisError> {
        config.labels.validate()?;
        config::validate_months(&months)?;

        for month in &months {
            match &month.plan {
                MonthPlan::Historical { column, .. } => {
                    if let Err(e) = dataset.column(column) {
                        log::warn!("Month '{}' cannot be labeled: {e}", month.name);
                    }
                }
                MonthPlan::Predicted { features, .. } => {
                    hotspot_map_predictor::ensure_features(predictor.as_ref(), features)?;
                }
            }
        }

        Ok(Self {
            dataset,
            predictor,
            config,
            months,
            cache: Mutex::new(BTreeMap::new()),
            threshold_runs: AtomicUsize::new(0),
        })
    }

    /// Registered months in selector order.
    #[must_use]
    pub fn months(&self) -> &[MonthDefinition] {
        &self.months
    }

    /// The shared location table.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Looks up a month by name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownMonth`] if no month matches.
    pub fn month(&self, name: &str) -> Result<&MonthDefinition, AnalysisError> {
        self.months
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| AnalysisError::UnknownMonth(name.to_string()))
    }

    /// Number of times a historical month was actually thresholded (cache
    /// misses).
    #[must_use]
    pub fn threshold_runs(&self) -> usize {
        self.threshold_runs.load(Ordering::Relaxed)
    }

    /// Labels every location for `month`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownMonth`] for unregistered months,
    /// [`AnalysisError::MissingColumn`] if a historical density column is
    /// absent, and [`AnalysisError::Inference`] if the model fails.
    pub fn classify(&self, month: &str) -> Result<Arc<Classification>, AnalysisError> {
        let definition = self.month(month)?;

        match &definition.plan {
            MonthPlan::Historical { column, policy } => {
                let policy = policy.unwrap_or(self.config.labels);
                // Held across the computation so a month is thresholded at
                // most once even under concurrent requests.
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(cached) = cache.get(&definition.name) {
                    log::debug!("Using cached labels for {}", definition.name);
                    return Ok(Arc::clone(cached));
                }
                let classification =
                    Arc::new(self.threshold(&definition.name, column, &policy)?);
                self.threshold_runs.fetch_add(1, Ordering::Relaxed);
                cache.insert(definition.name.clone(), Arc::clone(&classification));
                drop(cache);
                Ok(classification)
            }
            MonthPlan::Predicted { features, output } => {
                let output = output.unwrap_or(self.config.forecast.output);
                Ok(Arc::new(self.predict(&definition.name, features, output)?))
            }
        }
    }

    fn threshold(
        &self,
        month: &str,
        column: &str,
        policy: &LabelPolicy,
    ) -> Result<Classification, AnalysisError> {
        if !self.dataset.has_column(column) {
            return Err(AnalysisError::MissingColumn {
                month: month.to_string(),
                column: column.to_string(),
            });
        }
        let values = self.dataset.column(column)?;

        log::info!("Labeling {} locations for {month} from {column}", values.len());

        let locations = self
            .dataset
            .records()
            .iter()
            .zip(values)
            // Missing densities (empty, NA, non-finite) stay unlabeled.
            .map(|(record, density)| ClassifiedLocation {
                barangay: record.barangay.clone(),
                coordinates: record.coordinates,
                label: density.map(|d| policy.label(d)),
                density,
            })
            .collect();

        Ok(Classification {
            month: month.to_string(),
            source: ClassificationSource::Thresholds,
            locations,
        })
    }

    fn predict(
        &self,
        month: &str,
        features: &[String],
        output: ForecastOutput,
    ) -> Result<Classification, AnalysisError> {
        hotspot_map_predictor::ensure_features(self.predictor.as_ref(), features)?;
        let predictions =
            hotspot_map_predictor::predict_dataset(self.predictor.as_ref(), &self.dataset)?;

        log::info!(
            "Predicted {} locations for {month} ({output})",
            predictions.len()
        );

        let locations = self
            .dataset
            .records()
            .iter()
            .zip(predictions)
            .map(|(record, value)| {
                let (label, density) = output.interpret(value, &self.config.labels);
                ClassifiedLocation {
                    barangay: record.barangay.clone(),
                    coordinates: record.coordinates,
                    label,
                    density,
                }
            })
            .collect();

        Ok(Classification {
            month: month.to_string(),
            source: ClassificationSource::Model,
            locations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_map_predictor::FeatureMatrix;
    use hotspot_map_severity_models::{Hotspot, HotspotThreshold, Label, Severity};
    use std::thread;

    const FEATURES: &[&str] = hotspot_map_predictor::DEFAULT_FEATURES;

    #[derive(Debug)]
    struct Constant {
        features: Vec<String>,
        value: f64,
    }

    impl Predictor for Constant {
        fn features(&self) -> &[String] {
            &self.features
        }

        fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
            Ok(vec![self.value; matrix.rows()])
        }
    }

    fn constant(value: f64) -> Arc<dyn Predictor> {
        Arc::new(Constant {
            features: FEATURES.iter().map(ToString::to_string).collect(),
            value,
        })
    }

    fn table() -> Arc<Dataset> {
        Arc::new(
            Dataset::from_reader(
                "barangay,latitude,longitude,population,land_area_km2,jun_density,jul_density,\
                 aug_density,sep_density,oct_density,nov_density\n\
                 Carmen,8.4772,124.6459,74000,6.6,2500,4300,3000,3100,3200,3300\n\
                 Lapasan,8.4811,124.6621,45000,3.1,4200,4300.01,2800,2900,3000,\n"
                    .as_bytes(),
            )
            .unwrap(),
        )
    }

    fn analyzer(config: AnalysisConfig, value: f64) -> HotspotAnalyzer {
        HotspotAnalyzer::new(table(), constant(value), config, registry::all_months()).unwrap()
    }

    fn labels(classification: &Classification) -> Vec<Option<Label>> {
        classification.locations.iter().map(|l| l.label).collect()
    }

    #[test]
    fn historical_month_uses_thresholds() {
        let analyzer = analyzer(config::default_config(), 0.0);
        let june = analyzer.classify("June").unwrap();
        assert_eq!(june.source, ClassificationSource::Thresholds);
        assert_eq!(
            labels(&june),
            vec![
                Some(Label::Severity(Severity::Low)),
                Some(Label::Severity(Severity::Severe)),
            ]
        );
        assert_eq!(june.locations[0].density, Some(2500.0));
    }

    #[test]
    fn repeated_month_is_computed_once() {
        let analyzer = analyzer(config::default_config(), 0.0);
        let first = analyzer.classify("July").unwrap();
        let second = analyzer.classify("july").unwrap();
        assert_eq!(analyzer.threshold_runs(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.as_ref(), second.as_ref());
    }

    #[test]
    fn hotspot_scheme_applies_strict_cutoff() {
        let config = AnalysisConfig {
            labels: LabelPolicy::Hotspot(HotspotThreshold::default()),
            ..AnalysisConfig::default()
        };
        let july = analyzer(config, 0.0).classify("July").unwrap();
        assert_eq!(
            labels(&july),
            vec![
                Some(Label::Hotspot(Hotspot::Normal)),
                Some(Label::Hotspot(Hotspot::Hotspot)),
            ]
        );
    }

    #[test]
    fn empty_density_cell_is_unlabeled() {
        let analyzer = analyzer(config::default_config(), 0.0);
        let november = analyzer.classify("November").unwrap();
        assert_eq!(november.locations[1].label, None);
        assert_eq!(november.locations[1].density, None);
    }

    #[test]
    fn nan_and_na_densities_are_unlabeled_like_empty_cells() {
        let dataset = Arc::new(
            Dataset::from_reader(
                "barangay,latitude,longitude,population,land_area_km2,jun_density\n\
                 A,8.48,124.64,1,1,\n\
                 B,8.49,124.65,1,1,NaN\n\
                 C,8.50,124.66,1,1,NA\n\
                 D,8.51,124.67,1,1,4300\n"
                    .as_bytes(),
            )
            .unwrap(),
        );
        let analyzer = HotspotAnalyzer::new(
            dataset,
            constant(1.0),
            config::default_config(),
            registry::all_months(),
        )
        .unwrap();
        let june = analyzer.classify("June").unwrap();
        let observed: Vec<(Option<Label>, Option<f64>)> =
            june.locations.iter().map(|l| (l.label, l.density)).collect();
        assert_eq!(
            observed,
            vec![
                (None, None),
                (None, None),
                (None, None),
                (Some(Label::Severity(Severity::Severe)), Some(4300.0)),
            ]
        );
    }

    #[test]
    fn text_density_column_fails_on_request() {
        let dataset = Arc::new(
            Dataset::from_reader(
                "barangay,latitude,longitude,population,land_area_km2,jun_density\n\
                 A,8.48,124.64,1,1,flooded\n"
                    .as_bytes(),
            )
            .unwrap(),
        );
        let analyzer = HotspotAnalyzer::new(
            dataset,
            constant(1.0),
            config::default_config(),
            registry::all_months(),
        )
        .unwrap();
        assert!(matches!(
            analyzer.classify("June"),
            Err(AnalysisError::Dataset(DatasetError::InvalidNumber { ref value, .. }))
                if value == "flooded"
        ));
        assert_eq!(analyzer.threshold_runs(), 0);
    }

    #[test]
    fn missing_month_column_fails_on_request() {
        let dataset = Arc::new(
            Dataset::from_reader(
                "barangay,latitude,longitude,population,land_area_km2,jun_density\n\
                 A,8.48,124.64,1,1,2500\n"
                    .as_bytes(),
            )
            .unwrap(),
        );
        let analyzer = HotspotAnalyzer::new(
            dataset,
            constant(1.0),
            config::default_config(),
            registry::all_months(),
        )
        .unwrap();
        assert!(matches!(
            analyzer.classify("August"),
            Err(AnalysisError::MissingColumn { column, .. }) if column == "aug_density"
        ));
    }

    #[test]
    fn unknown_month_is_rejected() {
        let analyzer = analyzer(config::default_config(), 0.0);
        assert!(matches!(
            analyzer.classify("Smarch"),
            Err(AnalysisError::UnknownMonth(name)) if name == "Smarch"
        ));
    }

    #[test]
    fn december_density_forecast_is_thresholded() {
        let analyzer = analyzer(config::default_config(), 4500.0);
        let december = analyzer.classify("December").unwrap();
        assert_eq!(december.source, ClassificationSource::Model);
        assert!(
            december
                .locations
                .iter()
                .all(|l| l.label == Some(Label::Severity(Severity::Severe))
                    && l.density == Some(4500.0))
        );
    }

    #[test]
    fn december_hotspot_flag_forecast() {
        let mut config = config::default_config();
        config.forecast.output = ForecastOutput::HotspotFlag;
        let december = analyzer(config, 1.0).classify("December").unwrap();
        assert!(
            december
                .locations
                .iter()
                .all(|l| l.label == Some(Label::Hotspot(Hotspot::Hotspot)) && l.density.is_none())
        );
    }

    #[test]
    fn december_fails_on_missing_feature() {
        let dataset = Arc::new(
            Dataset::from_reader(
                "barangay,latitude,longitude,population,land_area_km2,aug_density,sep_density,oct_density\n\
                 A,8.48,124.64,100,,1,2,3\n"
                    .as_bytes(),
            )
            .unwrap(),
        );
        let analyzer = HotspotAnalyzer::new(
            dataset,
            constant(1.0),
            config::default_config(),
            registry::all_months(),
        )
        .unwrap();
        assert!(matches!(
            analyzer.classify("December"),
            Err(AnalysisError::Inference(PredictError::MissingValue { .. }))
        ));
    }

    #[test]
    fn model_with_other_features_fails_startup() {
        let predictor: Arc<dyn Predictor> = Arc::new(Constant {
            features: vec!["population".to_string()],
            value: 1.0,
        });
        assert!(matches!(
            HotspotAnalyzer::new(
                table(),
                predictor,
                config::default_config(),
                registry::all_months()
            ),
            Err(AnalysisError::Inference(PredictError::FeatureMismatch { .. }))
        ));
    }

    #[test]
    fn concurrent_months_do_not_interfere() {
        let analyzer = Arc::new(analyzer(config::default_config(), 0.0));
        let handles: Vec<_> = ["June", "July", "June", "July"]
            .into_iter()
            .map(|month| {
                let analyzer = Arc::clone(&analyzer);
                thread::spawn(move || analyzer.classify(month).unwrap())
            })
            .collect();
        let results: Vec<Arc<Classification>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(analyzer.threshold_runs(), 2);
        for result in &results {
            let column = if result.month == "June" {
                "jun_density"
            } else {
                "jul_density"
            };
            let expected = analyzer.dataset().column(column).unwrap();
            let actual: Vec<Option<f64>> = result.locations.iter().map(|l| l.density).collect();
            assert_eq!(actual, expected);
        }
    }
}
