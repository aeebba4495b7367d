use crate::data::DatasetFeature;
use crate::schema::{CATEGORY_FIELD, WWA_FIELDS};
use geo::Contains;

#[derive(Debug, Clone, PartialEq)]
pub struct InspectReport {
    pub features: usize,
    pub categories: Vec<String>,
    /// 0-based positions whose ring does not contain the previous ring
    pub nesting_violations: Vec<usize>,
    /// Fields other than the category field whose values differ between features
    pub varying_fields: Vec<String>,
}

impl InspectReport {
    pub fn is_valid(&self) -> bool {
        self.features > 0 && self.nesting_violations.is_empty() && self.varying_fields.is_empty()
    }
}

/// Checks that each ring contains its predecessor and that only the category
/// field changes between features.
pub fn inspect(features: &[DatasetFeature]) -> InspectReport {
    let categories = features
        .iter()
        .map(|f| f.attribute(CATEGORY_FIELD).unwrap_or_default().to_string())
        .collect();

    let nesting_violations = features
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| !pair[1].geometry.contains(&pair[0].geometry))
        .map(|(i, _)| i + 1)
        .collect();

    let varying_fields = match features.first() {
        Some(first) => WWA_FIELDS
            .iter()
            .map(|f| f.name)
            .filter(|name| *name != CATEGORY_FIELD)
            .filter(|name| {
                features
                    .iter()
                    .any(|f| f.attribute(name) != first.attribute(name))
            })
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    InspectReport {
        features: features.len(),
        categories,
        nesting_violations,
        varying_fields,
    }
}
