//! Compile-time registry of selectable months.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a month requires creating a TOML file in `months/` and adding a
//! corresponding entry here.

use hotspot_map_analysis_models::MonthDefinition;

/// Number of registered months. Enforced by a test.
#[cfg(test)]
const EXPECTED_MONTH_COUNT: usize = 7;

/// Embedded TOML month definitions.
const MONTH_TOMLS: &[(&str, &str)] = &[
    ("june", include_str!("../months/june.toml")),
    ("july", include_str!("../months/july.toml")),
    ("august", include_str!("../months/august.toml")),
    ("september", include_str!("../months/september.toml")),
    ("october", include_str!("../months/october.toml")),
    ("november", include_str!("../months/november.toml")),
    ("december", include_str!("../months/december.toml")),
];

/// Returns all registered months, sorted by `order`.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_months() -> Vec<MonthDefinition> {
    let mut months: Vec<MonthDefinition> = MONTH_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse month definition '{name}': {e}"))
        })
        .collect();
    months.sort_by_key(|m| m.order);
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_map_analysis_models::MonthPlan;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_months() {
        let months = all_months();
        assert_eq!(
            months.len(),
            EXPECTED_MONTH_COUNT,
            "Expected {EXPECTED_MONTH_COUNT} months, found {}. \
             Update EXPECTED_MONTH_COUNT after adding/removing months.",
            months.len()
        );
        let names: Vec<&str> = months.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December"
            ]
        );
    }

    #[test]
    fn month_names_and_orders_are_unique() {
        let months = all_months();
        let mut names = BTreeSet::new();
        let mut orders = BTreeSet::new();
        for month in &months {
            assert!(names.insert(&month.name), "Duplicate month: {}", month.name);
            assert!(orders.insert(month.order), "Duplicate order: {}", month.order);
        }
    }

    #[test]
    fn only_december_is_predicted() {
        for month in all_months() {
            match &month.plan {
                MonthPlan::Historical { column, .. } => {
                    assert!(column.ends_with("_density"), "{}: {column}", month.name);
                    assert_ne!(month.name, "December");
                }
                MonthPlan::Predicted { features, .. } => {
                    assert_eq!(month.name, "December");
                    assert_eq!(features, hotspot_map_predictor::DEFAULT_FEATURES);
                }
            }
        }
    }
}
