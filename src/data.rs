use crate::error::{GenerateError, GenerateResult};
use crate::schema::WWA_FIELDS;
use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use shapefile::Reader;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Reads the category list: one label per line, highest priority first.
/// Blank lines are skipped, duplicates are kept.
pub fn load_categories(path: &Path) -> GenerateResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| GenerateError::MissingInputFile {
        path: path.to_path_buf(),
        source,
    })?;

    let categories = parse_categories(&content);
    if categories.is_empty() {
        return Err(GenerateError::EmptyInput {
            origin: path.display().to_string(),
        });
    }

    info!("Loaded {} categories from {:?}", categories.len(), path);
    Ok(categories)
}

pub fn parse_categories(content: &str) -> Vec<String> {
    // Leading UTF-8 BOM is not whitespace, trim() keeps it
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// A feature read back from a generated dataset. Only WWA schema fields are kept,
/// in schema order.
#[derive(Debug, Clone)]
pub struct DatasetFeature {
    pub attributes: Vec<(String, String)>,
    pub geometry: MultiPolygon<f64>,
}

impl DatasetFeature {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Loads a generated `.shp` or GeoJSON dataset in file order.
pub fn load_dataset(path: &Path) -> Result<Vec<DatasetFeature>> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Dataset {:?} has no extension", path))?;

    let features = match extension.as_str() {
        "shp" => load_shapefile(path)?,
        "json" | "geojson" => load_geojson(path)?,
        _ => return Err(anyhow!("Unsupported dataset format: {}", extension)),
    };

    debug!("Read {} features from {:?}", features.len(), path);
    Ok(features)
}

fn load_shapefile(path: &Path) -> Result<Vec<DatasetFeature>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut features = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            other => return Err(anyhow!("Expected polygon shapes, found {:?}", other.shapetype())),
        };

        let attributes = WWA_FIELDS
            .iter()
            .filter_map(|field| {
                let value = match record.get(field.name)? {
                    shapefile::dbase::FieldValue::Character(Some(s)) => s.clone(),
                    shapefile::dbase::FieldValue::Character(None) => String::new(),
                    other => format!("{:?}", other),
                };
                Some((field.name.to_string(), value))
            })
            .collect();

        features.push(DatasetFeature { attributes, geometry });
    }

    Ok(features)
}

fn load_geojson(path: &Path) -> Result<Vec<DatasetFeature>> {
    use geojson::GeoJson;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::new();

    for feature in collection.features {
        let geometry = match feature.geometry {
            Some(geom) => {
                let value: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geojson geometry: {:?}", e))?;
                match value {
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    geo::Geometry::MultiPolygon(mp) => mp,
                    _ => return Err(anyhow!("Expected polygon features")),
                }
            }
            None => return Err(anyhow!("Feature without geometry")),
        };

        let properties = feature.properties.unwrap_or_default();
        let attributes = WWA_FIELDS
            .iter()
            .filter_map(|field| {
                let value = match properties.get(field.name)? {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                Some((field.name.to_string(), value))
            })
            .collect();

        features.push(DatasetFeature { attributes, geometry });
    }

    Ok(features)
}
