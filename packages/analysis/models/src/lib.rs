#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Month plan, configuration, and classification result types.
//!
//! Every selectable month is described by a [`MonthDefinition`] whose
//! [`MonthPlan`] says how its labels are produced: thresholding a stored
//! density column, or running the pre-fitted model. Month definitions are
//! deserialized from TOML so adding a month is a data change.

use hotspot_map_location_models::Coordinates;
use hotspot_map_severity_models::{Hotspot, Label, LabelPolicy, Severity};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A selectable month, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthDefinition {
    /// Display name and form value (e.g. `"June"`).
    pub name: String,
    /// Position in the selector, ascending.
    pub order: u32,
    /// How labels for this month are produced.
    pub plan: MonthPlan,
}

impl MonthDefinition {
    /// Returns `true` if this month is produced by the model.
    #[must_use]
    pub const fn is_predicted(&self) -> bool {
        matches!(self.plan, MonthPlan::Predicted { .. })
    }
}

/// How a month's labels are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonthPlan {
    /// Threshold a density column stored in the location table.
    Historical {
        /// Density column (e.g. `"jun_density"`).
        column: String,
        /// Overrides the configured label policy for this month only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<LabelPolicy>,
    },
    /// Run the model over the given feature columns.
    Predicted {
        /// Feature columns, in model order.
        features: Vec<String>,
        /// Overrides the configured forecast output for this month only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<ForecastOutput>,
    },
}

/// What the model's scalar output means.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ForecastOutput {
    /// A density estimate, labeled with the configured policy.
    #[default]
    Density,
    /// A severity class index: 0 Low, 1 Moderate, 2 Severe.
    SeverityClass,
    /// A binary flag: non-zero is a hotspot.
    HotspotFlag,
}

impl ForecastOutput {
    /// Converts one model output to a label and, for density models, the
    /// density shown in the popup.
    ///
    /// Class outputs are rounded to the nearest integer; indices outside
    /// 0..=2 produce no label.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn interpret(self, value: f64, policy: &LabelPolicy) -> (Option<Label>, Option<f64>) {
        match self {
            Self::Density => (Some(policy.label(value)), Some(value)),
            Self::SeverityClass => (
                Severity::from_class(value.round() as i64).map(Label::Severity),
                None,
            ),
            Self::HotspotFlag => {
                let flag = if value.round() == 0.0 {
                    Hotspot::Normal
                } else {
                    Hotspot::Hotspot
                };
                (Some(Label::Hotspot(flag)), None)
            }
        }
    }
}

/// Classification settings, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Label policy for densities (historical and density forecasts).
    #[serde(default)]
    pub labels: LabelPolicy,
    /// Forecast settings.
    #[serde(default)]
    pub forecast: ForecastConfig,
}

/// Forecast settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Interpretation of the model output.
    #[serde(default)]
    pub output: ForecastOutput,
}

/// Where a classification's labels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    /// Thresholds over a stored density column.
    Thresholds,
    /// Model inference.
    Model,
}

/// One labeled location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedLocation {
    /// Barangay name.
    pub barangay: String,
    /// Marker position.
    pub coordinates: Coordinates,
    /// Label, or `None` if the value could not be labeled.
    pub label: Option<Label>,
    /// Density behind the label, when there is one.
    pub density: Option<f64>,
}

/// All labeled locations for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Month name.
    pub month: String,
    /// Label origin.
    pub source: ClassificationSource,
    /// One entry per location, in table order.
    pub locations: Vec<ClassifiedLocation>,
}
