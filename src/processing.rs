use crate::error::{GenerateError, GenerateResult};
use crate::schema;
use crate::types::{AttributeRecord, RingFeature};
use geo::{Coord, LineString, Point, Polygon};
use std::f64::consts::TAU;

/// Regular polygon approximating the disk of `radius` around `center`.
///
/// Vertices start due east and run clockwise, the ring is closed, and the
/// vertex angles depend only on `segments`, so disks sharing a center and
/// segment count nest exactly.
pub fn disk(center: Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let mut coords: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let angle = -TAU * i as f64 / segments as f64;
            Coord {
                x: center.x() + radius * angle.cos(),
                y: center.y() + radius * angle.sin(),
            }
        })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Polygon::new(LineString::from(coords), vec![])
}

/// Lazily yields one ring per category, innermost (highest priority) first.
#[derive(Debug)]
pub struct RingGenerator<'a> {
    categories: std::iter::Enumerate<std::slice::Iter<'a, String>>,
    centroid: Point<f64>,
    increment: f64,
    segments: usize,
    defaults: AttributeRecord,
}

impl<'a> RingGenerator<'a> {
    pub fn new(
        categories: &'a [String],
        centroid: Point<f64>,
        increment: f64,
        segments: usize,
    ) -> GenerateResult<Self> {
        if categories.is_empty() {
            return Err(GenerateError::EmptyInput {
                origin: "category list".to_string(),
            });
        }
        // The outermost radius must stay finite too
        if !increment.is_finite()
            || increment <= 0.0
            || !(increment * categories.len() as f64).is_finite()
        {
            return Err(GenerateError::InvalidIncrement { increment });
        }
        if segments < 3 {
            return Err(GenerateError::InvalidSegments { segments });
        }

        Ok(Self {
            categories: categories.iter().enumerate(),
            centroid,
            increment,
            segments,
            defaults: schema::default_record(),
        })
    }

    /// Radius of the ring at 1-based `position`.
    pub fn radius_at(&self, position: usize) -> f64 {
        self.increment * position as f64
    }
}

impl Iterator for RingGenerator<'_> {
    type Item = RingFeature;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, category) = self.categories.next()?;
        let radius = self.radius_at(index + 1);

        Some(RingFeature {
            category: category.clone(),
            radius,
            polygon: disk(self.centroid, radius, self.segments),
            record: schema::record_for_category(&self.defaults, category),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.categories.size_hint()
    }
}

impl ExactSizeIterator for RingGenerator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CATEGORY_FIELD;
    use geo::{Contains, Winding};

    fn centroid() -> Point<f64> {
        Point::new(-98.5833, 39.8333)
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn disk_is_closed_and_clockwise() {
        let polygon = disk(centroid(), 0.1, 64);
        let ring = polygon.exterior();

        assert_eq!(ring.0.len(), 65);
        assert_eq!(ring.0.first(), ring.0.last());
        assert!(ring.is_cw());
    }

    #[test]
    fn disk_vertices_lie_on_the_circle() {
        let center = centroid();
        for coord in disk(center, 0.3, 32).exterior().coords() {
            let distance = ((coord.x - center.x()).powi(2) + (coord.y - center.y()).powi(2)).sqrt();
            assert!((distance - 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn two_category_example() {
        let categories = labels(&["Tornado Warning", "Flood Watch"]);
        let rings: Vec<RingFeature> = RingGenerator::new(&categories, centroid(), 0.1, 64)
            .unwrap()
            .collect();

        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].record.get(CATEGORY_FIELD), Some("Tornado Warning"));
        assert_eq!(rings[1].record.get(CATEGORY_FIELD), Some("Flood Watch"));
        assert!((rings[0].radius - 0.1).abs() < 1e-12);
        assert!((rings[1].radius - 0.2).abs() < 1e-12);
        assert!(rings[1].polygon.contains(&rings[0].polygon));
        assert!(!rings[0].polygon.contains(&rings[1].polygon));
    }

    #[test]
    fn radii_are_multiples_of_increment() {
        let categories = labels(&["A", "B", "C", "D", "E", "F", "G"]);
        let generator = RingGenerator::new(&categories, centroid(), 0.35, 16).unwrap();
        assert_eq!(generator.len(), 7);

        for (index, ring) in generator.enumerate() {
            let expected = 0.35 * (index + 1) as f64;
            assert_eq!(ring.radius, expected);
        }
    }

    #[test]
    fn every_ring_contains_its_predecessor() {
        let categories: Vec<String> = (0..40).map(|i| format!("Category {}", i)).collect();
        let rings: Vec<RingFeature> = RingGenerator::new(&categories, centroid(), 0.1, 64)
            .unwrap()
            .collect();

        for pair in rings.windows(2) {
            assert!(pair[1].radius > pair[0].radius);
            assert!(pair[1].polygon.contains(&pair[0].polygon));
        }
    }

    #[test]
    fn only_category_field_varies() {
        let categories = labels(&["Tsunami Warning", "Tornado Warning", "Tsunami Warning"]);
        let rings: Vec<RingFeature> = RingGenerator::new(&categories, centroid(), 0.1, 64)
            .unwrap()
            .collect();

        let first = &rings[0].record;
        for ring in &rings {
            for (name, value) in ring.record.iter() {
                if name == CATEGORY_FIELD {
                    assert_eq!(value, ring.category);
                } else {
                    assert_eq!(Some(value), first.get(name));
                }
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let categories = labels(&["Tornado Warning", "Flood Watch", "Heat Advisory"]);
        let first: Vec<RingFeature> = RingGenerator::new(&categories, centroid(), 0.1, 64)
            .unwrap()
            .collect();
        let second: Vec<RingFeature> = RingGenerator::new(&categories, centroid(), 0.1, 64)
            .unwrap()
            .collect();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.polygon, b.polygon);
            assert_eq!(a.record, b.record);
        }
    }

    #[test]
    fn overflowing_outer_radius_rejected() {
        let categories = labels(&["Tornado Warning", "Flood Watch", "Heat Advisory"]);
        let result = RingGenerator::new(&categories, centroid(), 1e308, 64);
        assert!(matches!(result, Err(GenerateError::InvalidIncrement { .. })));

        let single = labels(&["Tornado Warning"]);
        assert!(RingGenerator::new(&single, centroid(), 1e308, 64).is_ok());
    }

    #[test]
    fn empty_categories_rejected() {
        let result = RingGenerator::new(&[], centroid(), 0.1, 64);
        assert!(matches!(result, Err(GenerateError::EmptyInput { .. })));
    }

    #[test]
    fn non_positive_increment_rejected() {
        let categories = labels(&["Tornado Warning"]);
        for increment in [0.0, -0.1] {
            let result = RingGenerator::new(&categories, centroid(), increment, 64);
            assert!(matches!(result, Err(GenerateError::InvalidIncrement { .. })));
        }
    }
}
