#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Severity and hotspot labels and the threshold policies that produce them.
//!
//! Classification is a pure, total function of a density value. Severity
//! brackets are half-open: a value equal to a cutoff belongs to the upper
//! bracket. The hotspot cutoff is strict: a value equal to the cutoff is
//! still [`Hotspot::Normal`].
//!
//! `NaN` is not ordered, so it is treated as the lowest label of either
//! scheme rather than falling through to the highest. The location table
//! stores `NaN` cells as missing, and missing densities are left unlabeled
//! before they reach a classifier.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Default lower bound of [`Severity::Moderate`], in kg/km².
pub const DEFAULT_MODERATE_FROM: f64 = 3000.0;
/// Default lower bound of [`Severity::Severe`], in kg/km².
pub const DEFAULT_SEVERE_FROM: f64 = 4200.0;
/// Default hotspot cutoff, in kg/km². Values strictly above are hotspots.
pub const DEFAULT_HOTSPOT_CUTOFF: f64 = 4300.0;

/// Three-level severity bucket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum Severity {
    /// Below the moderate cutoff.
    Low,
    /// Between the moderate and severe cutoffs.
    Moderate,
    /// At or above the severe cutoff.
    Severe,
}

impl Severity {
    /// Maps a model class index (0, 1, 2) to a severity.
    #[must_use]
    pub const fn from_class(class: i64) -> Option<Self> {
        match class {
            0 => Some(Self::Low),
            1 => Some(Self::Moderate),
            2 => Some(Self::Severe),
            _ => None,
        }
    }
}

/// Binary hotspot flag.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
pub enum Hotspot {
    /// At or below the cutoff.
    Normal,
    /// Strictly above the cutoff.
    #[strum(serialize = "HOTSPOT")]
    #[serde(rename = "HOTSPOT")]
    Hotspot,
}

/// A classified location label, from either scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Three-level severity.
    Severity(Severity),
    /// Binary hotspot flag.
    Hotspot(Hotspot),
}

impl Label {
    /// Marker color for this label.
    #[must_use]
    pub const fn color(self) -> MarkerColor {
        match self {
            Self::Severity(Severity::Low) | Self::Hotspot(Hotspot::Normal) => MarkerColor::Green,
            Self::Severity(Severity::Moderate) => MarkerColor::Orange,
            Self::Severity(Severity::Severe) | Self::Hotspot(Hotspot::Hotspot) => MarkerColor::Red,
        }
    }

    /// Text shown in marker popups (`Low`, `Moderate`, `Severe`, `Normal`,
    /// `HOTSPOT`).
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Severity(s) => s.into(),
            Self::Hotspot(h) => h.into(),
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Marker color names understood by the map page.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerColor {
    /// Low severity or normal.
    Green,
    /// Moderate severity.
    Orange,
    /// Severe or hotspot.
    Red,
    /// No label could be assigned.
    Gray,
}

impl MarkerColor {
    /// Color for an optional label; unlabeled rows are gray.
    #[must_use]
    pub const fn for_label(label: Option<Label>) -> Self {
        match label {
            Some(label) => label.color(),
            None => Self::Gray,
        }
    }
}

/// Error returned when threshold values are inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ThresholdError {
    /// A cutoff is `NaN` or infinite.
    #[error("threshold {0} is not finite")]
    NotFinite(f64),
    /// The moderate cutoff is not below the severe cutoff.
    #[error("moderate cutoff {moderate_from} must be below severe cutoff {severe_from}")]
    Unordered {
        /// Lower bound of moderate.
        moderate_from: f64,
        /// Lower bound of severe.
        severe_from: f64,
    },
}

/// Cut points for the three-level severity scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    /// Lower bound (inclusive) of [`Severity::Moderate`].
    pub moderate_from: f64,
    /// Lower bound (inclusive) of [`Severity::Severe`].
    pub severe_from: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            moderate_from: DEFAULT_MODERATE_FROM,
            severe_from: DEFAULT_SEVERE_FROM,
        }
    }
}

impl SeverityThresholds {
    /// Creates validated thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] if either cutoff is not finite or the
    /// cutoffs are not strictly increasing.
    pub fn new(moderate_from: f64, severe_from: f64) -> Result<Self, ThresholdError> {
        let thresholds = Self {
            moderate_from,
            severe_from,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Checks the cutoffs are finite and strictly increasing.
    ///
    /// # Errors
    ///
    /// See [`SeverityThresholds::new`].
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for value in [self.moderate_from, self.severe_from] {
            if !value.is_finite() {
                return Err(ThresholdError::NotFinite(value));
            }
        }
        if self.moderate_from >= self.severe_from {
            return Err(ThresholdError::Unordered {
                moderate_from: self.moderate_from,
                severe_from: self.severe_from,
            });
        }
        Ok(())
    }

    /// Classifies a density value.
    #[must_use]
    pub fn classify(&self, density: f64) -> Severity {
        if density.is_nan() || density < self.moderate_from {
            Severity::Low
        } else if density < self.severe_from {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }
}

/// Cutoff for the binary hotspot scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotspotThreshold {
    /// Values strictly above this are hotspots.
    pub cutoff: f64,
}

impl Default for HotspotThreshold {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_HOTSPOT_CUTOFF,
        }
    }
}

impl HotspotThreshold {
    /// Checks the cutoff is finite.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::NotFinite`] otherwise.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.cutoff.is_finite() {
            Ok(())
        } else {
            Err(ThresholdError::NotFinite(self.cutoff))
        }
    }

    /// Classifies a density value.
    #[must_use]
    pub fn classify(&self, density: f64) -> Hotspot {
        if density > self.cutoff {
            Hotspot::Hotspot
        } else {
            Hotspot::Normal
        }
    }
}

/// Which labeling scheme to apply to density values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Low / Moderate / Severe.
    Severity(SeverityThresholds),
    /// Normal / HOTSPOT.
    Hotspot(HotspotThreshold),
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self::Severity(SeverityThresholds::default())
    }
}

impl LabelPolicy {
    /// Labels a density value under this policy.
    #[must_use]
    pub fn label(&self, density: f64) -> Label {
        match self {
            Self::Severity(t) => Label::Severity(t.classify(density)),
            Self::Hotspot(t) => Label::Hotspot(t.classify(density)),
        }
    }

    /// Validates the underlying thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError`] if the thresholds are invalid.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        match self {
            Self::Severity(t) => t.validate(),
            Self::Hotspot(t) => t.validate(),
        }
    }
}

/// Classifies a density with the default 3000/4200 severity cutoffs.
#[must_use]
pub fn classify_severity(density: f64) -> Severity {
    SeverityThresholds::default().classify(density)
}

/// Returns `true` if a density exceeds the default 4300 hotspot cutoff.
#[must_use]
pub fn is_hotspot(density: f64) -> bool {
    HotspotThreshold::default().classify(density) == Hotspot::Hotspot
}
