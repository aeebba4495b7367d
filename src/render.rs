//! Output drivers for generated rings.
//!
//! The driver is picked from the output extension: `.shp` writes an ESRI
//! Shapefile with a WGS 84 `.prj` sidecar, `.json`/`.geojson` streams a
//! FeatureCollection.

use crate::error::{GenerateError, GenerateResult};
use crate::schema::WWA_FIELDS;
use crate::types::RingFeature;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// Receives features in order and persists them.
pub trait FeatureSink {
    fn write(&mut self, feature: &RingFeature) -> GenerateResult<()>;

    /// Flushes everything to disk. Must be called once after the last write.
    fn finish(self: Box<Self>) -> GenerateResult<()>;
}

pub struct ShapefileSink {
    path: PathBuf,
    writer: shapefile::Writer<BufWriter<File>>,
    records: usize,
}

impl ShapefileSink {
    pub fn create(path: &Path) -> GenerateResult<Self> {
        let mut table = TableWriterBuilder::new();
        for field in WWA_FIELDS.iter() {
            let name = FieldName::try_from(field.name)
                .map_err(|e| GenerateError::output(path, format!("bad field name {}: {:?}", field.name, e)))?;
            table = table.add_character_field(name, field.width);
        }

        let writer = shapefile::Writer::from_path(path, table)
            .map_err(|e| GenerateError::output(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            records: 0,
        })
    }
}

/// Checks the `.shp` and `.shx` headers on disk against `records` polygons.
///
/// The shapefile writer finalizes both headers in its `Drop` impl and throws
/// away any error from doing so, so the files are re-read here instead.
pub fn verify_shapefile(path: &Path, records: usize) -> GenerateResult<()> {
    let shp_len = fs::metadata(path).map_err(|e| GenerateError::output(path, e))?.len();

    let mut header = [0u8; 100];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut header))
        .map_err(|e| GenerateError::output(path, format!("unreadable header: {}", e)))?;

    // File length is stored big-endian, in 16-bit words
    let declared = u32::from_be_bytes([header[24], header[25], header[26], header[27]]) as u64 * 2;
    if declared != shp_len {
        return Err(GenerateError::output(
            path,
            format!("header declares {} bytes, file has {}", declared, shp_len),
        ));
    }

    // One 8-byte index entry per record after the 100-byte header
    let shx = path.with_extension("shx");
    let shx_len = fs::metadata(&shx).map_err(|e| GenerateError::output(&shx, e))?.len();
    let expected = 100 + 8 * records as u64;
    if shx_len != expected {
        return Err(GenerateError::output(
            &shx,
            format!("index holds {} bytes, expected {}", shx_len, expected),
        ));
    }

    Ok(())
}

impl FeatureSink for ShapefileSink {
    fn write(&mut self, feature: &RingFeature) -> GenerateResult<()> {
        let points: Vec<shapefile::Point> = feature
            .polygon
            .exterior()
            .coords()
            .map(|c| shapefile::Point::new(c.x, c.y))
            .collect();
        let shape = shapefile::Polygon::new(shapefile::PolygonRing::Outer(points));

        let mut record = Record::default();
        for (name, value) in feature.record.iter() {
            record.insert(name.to_string(), FieldValue::Character(Some(value.to_string())));
        }

        self.writer
            .write_shape_and_record(&shape, &record)
            .map_err(|e| GenerateError::output(&self.path, e))?;
        self.records += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> GenerateResult<()> {
        let ShapefileSink { path, writer, records } = *self;
        // Drop finalizes the headers but discards its error
        drop(writer);
        verify_shapefile(&path, records)?;

        let prj = path.with_extension("prj");
        fs::write(&prj, WGS84_PRJ).map_err(|e| GenerateError::output(&prj, e))?;
        debug!("Wrote projection sidecar {:?}", prj);
        Ok(())
    }
}

pub struct GeoJsonSink {
    path: PathBuf,
    writer: geojson::FeatureWriter<BufWriter<File>>,
}

impl GeoJsonSink {
    pub fn create(path: &Path) -> GenerateResult<Self> {
        let file = File::create(path).map_err(|e| GenerateError::output(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: geojson::FeatureWriter::from_writer(BufWriter::new(file)),
        })
    }
}

impl FeatureSink for GeoJsonSink {
    fn write(&mut self, feature: &RingFeature) -> GenerateResult<()> {
        let properties: geojson::JsonObject = feature
            .record
            .iter()
            .map(|(name, value)| (name.to_string(), serde_json::Value::String(value.to_string())))
            .collect();

        let feature = geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&feature.polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        };

        self.writer
            .write_feature(&feature)
            .map_err(|e| GenerateError::output(&self.path, e))
    }

    fn finish(mut self: Box<Self>) -> GenerateResult<()> {
        self.writer
            .finish()
            .map_err(|e| GenerateError::output(&self.path, e))?;
        self.writer
            .flush()
            .map_err(|e| GenerateError::output(&self.path, e))
    }
}

/// Opens the sink matching the extension of `path`, creating parent directories.
pub fn open_sink(path: &Path) -> GenerateResult<Box<dyn FeatureSink>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| GenerateError::InvalidConfig {
            message: format!("output {:?} has no extension", path),
        })?;

    let sink: Box<dyn FeatureSink> = match extension.as_str() {
        "shp" => {
            ensure_parent(path)?;
            Box::new(ShapefileSink::create(path)?)
        }
        "json" | "geojson" => {
            ensure_parent(path)?;
            Box::new(GeoJsonSink::create(path)?)
        }
        _ => {
            return Err(GenerateError::InvalidConfig {
                message: format!("unsupported output format: {}", extension),
            })
        }
    };

    Ok(sink)
}

fn ensure_parent(path: &Path) -> GenerateResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| GenerateError::output(parent, e))
        }
        _ => Ok(()),
    }
}

/// Writes every ring in iteration order and finalizes the dataset.
pub fn write_rings<I>(path: &Path, rings: I) -> GenerateResult<usize>
where
    I: IntoIterator<Item = RingFeature>,
{
    let mut sink = open_sink(path)?;
    let mut written = 0;

    for ring in rings {
        debug!(category = %ring.category, radius = ring.radius, "Writing ring");
        sink.write(&ring)?;
        written += 1;
    }

    sink.finish()?;
    info!("Wrote {} rings to {:?}", written, path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load_dataset;
    use crate::processing::RingGenerator;
    use crate::schema::CATEGORY_FIELD;
    use geo::{Contains, Point};
    use tempfile::tempdir;

    fn categories() -> Vec<String> {
        vec!["Tornado Warning".to_string(), "Flood Watch".to_string()]
    }

    fn rings(categories: &[String]) -> RingGenerator<'_> {
        RingGenerator::new(categories, Point::new(-98.5833, 39.8333), 0.1, 64).unwrap()
    }

    #[test]
    fn shapefile_output_reads_back_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wwa_priority_sample.shp");
        let categories = categories();

        let written = write_rings(&path, rings(&categories)).unwrap();
        assert_eq!(written, 2);
        assert!(path.with_extension("shx").exists());
        assert!(path.with_extension("dbf").exists());
        assert!(path.with_extension("prj").exists());

        let features = load_dataset(&path).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].attribute(CATEGORY_FIELD), Some("Tornado Warning"));
        assert_eq!(features[1].attribute(CATEGORY_FIELD), Some("Flood Watch"));
        assert_eq!(features[0].attribute("WFO"), Some("KGYX"));
        assert!(features[1].geometry.contains(&features[0].geometry));
    }

    #[test]
    fn geojson_output_reads_back_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("rings.geojson");
        let categories = categories();

        write_rings(&path, rings(&categories)).unwrap();

        let features = load_dataset(&path).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].attribute(CATEGORY_FIELD), Some("Tornado Warning"));
        assert_eq!(
            features[1].attribute("URL"),
            Some("https://alerts-v2.weather.gov/products/NWS-IDP-PROD-3891376-3315413")
        );
        assert!(features[1].geometry.contains(&features[0].geometry));
    }

    #[test]
    fn shapefile_into_blocked_directory_is_write_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file.txt");
        fs::write(&blocker, "not a directory").unwrap();

        let result = write_rings(&blocker.join("out.shp"), rings(&categories()));
        assert!(matches!(result, Err(GenerateError::OutputWrite { .. })));
    }

    #[test]
    fn geojson_into_blocked_directory_is_write_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file.txt");
        fs::write(&blocker, "not a directory").unwrap();

        let result = write_rings(&blocker.join("out.geojson"), rings(&categories()));
        assert!(matches!(result, Err(GenerateError::OutputWrite { .. })));
    }

    #[test]
    fn finished_shapefile_headers_check_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rings.shp");

        let written = write_rings(&path, rings(&categories())).unwrap();
        assert!(verify_shapefile(&path, written).is_ok());
        assert!(matches!(
            verify_shapefile(&path, written + 1),
            Err(GenerateError::OutputWrite { .. })
        ));
    }

    #[test]
    fn truncated_shapefile_fails_verification() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rings.shp");
        write_rings(&path, rings(&categories())).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 16]).unwrap();

        let result = verify_shapefile(&path, 2);
        assert!(matches!(result, Err(GenerateError::OutputWrite { .. })));
    }

    #[test]
    fn missing_shapefile_fails_verification() {
        let dir = tempdir().unwrap();
        let result = verify_shapefile(&dir.path().join("absent.shp"), 0);
        assert!(matches!(result, Err(GenerateError::OutputWrite { .. })));
    }

    #[test]
    fn unsupported_extension_creates_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rings.kml");

        let result = write_rings(&path, rings(&categories()));
        assert!(matches!(result, Err(GenerateError::InvalidConfig { .. })));
        assert!(!path.exists());
    }
}
