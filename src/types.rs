use geo::{Point, Polygon};

/// Attribute values for one output feature, in schema field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    values: Vec<(&'static str, String)>,
}

impl AttributeRecord {
    pub fn new(values: Vec<(&'static str, String)>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a copy with `field` set to `value`. Unknown fields are ignored.
    pub fn with_value(&self, field: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let values = self
            .values
            .iter()
            .map(|(name, current)| {
                if *name == field {
                    (*name, value.clone())
                } else {
                    (*name, current.clone())
                }
            })
            .collect();
        Self { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values.iter().map(|(name, value)| (*name, value.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct RingFeature {
    pub category: String,
    pub radius: f64,
    pub polygon: Polygon<f64>,
    pub record: AttributeRecord,
}

#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub records: usize,
    pub centroid: Point<f64>,
    pub innermost_radius: f64,
    pub outermost_radius: f64,
    pub output: std::path::PathBuf,
}
