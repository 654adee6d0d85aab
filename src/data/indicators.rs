//! Which numeric columns are offered as disease measures and as drivers.

use super::model::Dataset;

pub const DEFAULT_DISEASES: [&str; 3] = ["hiv_incidence", "malaria_incidence", "tb_incidence"];

pub const DEFAULT_DRIVERS: [&str; 5] = [
    "education_access_index",
    "condom_use_rate",
    "urbanization_level",
    "hiv_awareness_index",
    "youth_unemployment_rate",
];

/// Indicator columns available in a loaded dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Indicators {
    pub diseases: Vec<String>,
    pub drivers: Vec<String>,
}

impl Indicators {
    /// Keep the configured columns that are numeric in `dataset`.
    ///
    /// If none of the configured disease columns exist every numeric column
    /// is offered, and the same for drivers, so an unfamiliar file still
    /// renders something.
    pub fn resolve(dataset: &Dataset, diseases: &[String], drivers: &[String]) -> Self {
        let pick = |wanted: &[String]| -> Vec<String> {
            let found: Vec<String> = wanted
                .iter()
                .filter(|c| dataset.is_numeric(c))
                .cloned()
                .collect();
            if found.is_empty() {
                dataset.numeric_columns().to_vec()
            } else {
                found
            }
        };
        Self {
            diseases: pick(diseases),
            drivers: pick(drivers),
        }
    }
}

/// `hiv_incidence` → `Hiv Incidence`.
pub fn pretty_label(column: &str) -> String {
    column
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
