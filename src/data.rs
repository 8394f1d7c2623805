use crate::config::AppConfig;
use crate::types::{Boundary, SamplePoint};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::{Geometry, MultiPolygon};
use serde::Deserialize;
use shapefile::ShapeReader;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Dataset problems that abort the render.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("{path:?} contains no usable records")]
    Empty { path: PathBuf },
    #[error("{path:?} line {line}: {message}")]
    InvalidRow { path: PathBuf, line: u64, message: String },
    #[error("unsupported boundary format {extension:?} for {path:?}")]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("{path:?} must be a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
}

#[derive(Debug, Deserialize)]
struct PointRow {
    geo_code: String,
    average: String,
    x: String,
    y: String,
}

/// Load the points table and the boundary outlines side by side.
/// Either failure aborts the whole load; nothing is returned partially.
pub async fn load_inputs(config: &AppConfig) -> Result<(Vec<SamplePoint>, Vec<Boundary>)> {
    let points_path = config.input.points_csv.clone();
    let boundaries_path = config.input.boundaries.clone();

    let (points, boundaries) = tokio::try_join!(
        run_blocking(move || load_points(&points_path)),
        run_blocking(move || load_boundaries(&boundaries_path)),
    )?;

    Ok((points, boundaries))
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .context("Loader task did not complete")?
}

pub fn load_points(path: &Path) -> Result<Vec<SamplePoint>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers = rdr.headers()
        .with_context(|| format!("Failed to read CSV header: {:?}", path))?
        .clone();

    let mut points = Vec::new();
    let mut seen = HashSet::new();

    for result in rdr.records() {
        let record = result.with_context(|| format!("Failed to read CSV record: {:?}", path))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let invalid = |message: String| DataError::InvalidRow { path: path.to_path_buf(), line, message };

        let row: PointRow = record.deserialize(Some(&headers))
            .map_err(|e| invalid(e.to_string()))?;

        let average = parse_number("average", &row.average).map_err(invalid)?;
        let x = parse_number("x", &row.x).map_err(invalid)?;
        let y = parse_number("y", &row.y).map_err(invalid)?;

        if !seen.insert(row.geo_code.clone()) {
            warn!("Duplicate geo_code {} at line {} of {:?}", row.geo_code, line, path);
        }
        points.push(SamplePoint::new(row.geo_code, average, x, y));
    }

    if points.is_empty() {
        return Err(DataError::Empty { path: path.to_path_buf() }.into());
    }

    info!("Loaded {} sample points from {:?}", points.len(), path);
    Ok(points)
}

fn parse_number(field: &str, raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw.parse()
        .map_err(|_| format!("field '{}' is not a number: {:?}", field, raw))?;
    if !value.is_finite() {
        return Err(format!("field '{}' is not finite: {:?}", field, raw));
    }
    Ok(value)
}

pub fn load_boundaries(path: &Path) -> Result<Vec<Boundary>> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Boundary file has no extension: {:?}", path))?;

    let boundaries = match extension.as_str() {
        "shp" => load_shapefile(path)?,
        "json" | "geojson" => load_geojson(path)?,
        _ => {
            return Err(DataError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }.into())
        }
    };

    if boundaries.is_empty() {
        return Err(DataError::Empty { path: path.to_path_buf() }.into());
    }

    info!("Loaded {} boundary outlines from {:?}", boundaries.len(), path);
    Ok(boundaries)
}

fn load_geojson(path: &Path) -> Result<Vec<Boundary>> {
    use geojson::GeoJson;

    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(DataError::NotFeatureCollection { path: path.to_path_buf() }.into()),
    };

    let mut boundaries = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!("Feature {} has no geometry, skipping", index);
            continue;
        };

        let geometry: Geometry<f64> = geometry.value.try_into()
            .map_err(|e| anyhow!("Failed to convert geojson geometry of feature {}: {:?}", index, e))?;

        if is_outline(&geometry) {
            boundaries.push(Boundary { geometry });
        } else {
            warn!("Feature {} has no outline to draw, skipping", index);
        }
    }

    Ok(boundaries)
}

fn is_outline(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => false,
        Geometry::GeometryCollection(gc) => gc.iter().any(is_outline),
        _ => true,
    }
}

fn load_shapefile(path: &Path) -> Result<Vec<Boundary>> {
    // Outlines only, so the .dbf attribute table is never opened.
    let mut reader = ShapeReader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut boundaries = Vec::new();

    for result in reader.iter_shapes() {
        let shape = result.with_context(|| format!("Failed to read shape from {:?}", path))?;

        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?,
            shapefile::Shape::PolygonM(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon.try_into()
                .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?,
            _ => continue, // only polygon outlines are drawn
        };

        boundaries.push(Boundary { geometry: Geometry::MultiPolygon(geometry) });
    }

    Ok(boundaries)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    pub(crate) const POINTS_CSV: &str = "geo_code,average,x,y\n\
        0101,0.10,20.5,39.5\n\
        0102,0.20,21.0,40.0\n\
        0103,0.30,22.5,38.0\n";

    pub(crate) const BOUNDARIES_GEOJSON: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "A"},
             "geometry": {"type": "Polygon", "coordinates": [[[20.5,38.0],[22.5,38.0],[22.5,40.0],[20.5,38.0]]]}},
            {"type": "Feature", "properties": {"name": "pin"},
             "geometry": {"type": "Point", "coordinates": [21.0, 39.0]}}
        ]
    }"#;

    pub(crate) fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::{write_file, BOUNDARIES_GEOJSON, POINTS_CSV};

    #[test]
    fn loads_points_with_numeric_coercion() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "points.csv", POINTS_CSV);

        let points = load_points(&path).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].geo_code, "0101");
        assert_eq!(points[1].average, 0.20);
        assert_eq!(points[2].x, 22.5);
        assert!(points[2].px.is_nan());
    }

    #[test]
    fn malformed_average_fails_with_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "points.csv", "geo_code,average,x,y\n0101,0.1,1,2\n0102,,3,4\n");

        let err = load_points(&path).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::InvalidRow { line, message, .. }) => {
                assert_eq!(*line, 3);
                assert!(message.contains("average"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_column_is_invalid_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "points.csv", "geo_code,x,y\n0101,1,2\n");

        let err = load_points(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::InvalidRow { .. })));
    }

    #[test]
    fn header_only_csv_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "points.csv", "geo_code,average,x,y\n");

        let err = load_points(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::Empty { .. })));
    }

    #[test]
    fn geojson_skips_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "b.geojson", BOUNDARIES_GEOJSON);

        let boundaries = load_boundaries(&path).unwrap();
        assert_eq!(boundaries.len(), 1);
        assert!(matches!(boundaries[0].geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn geojson_without_features_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "b.geojson", r#"{"type":"FeatureCollection","features":[]}"#);

        let err = load_boundaries(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::Empty { .. })));
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "b.json", r#"{"type":"Point","coordinates":[1.0,2.0]}"#);

        let err = load_boundaries(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::NotFeatureCollection { .. })));
    }

    #[test]
    fn shapefile_loads_without_attribute_table() {
        use shapefile::{Point, Polygon, PolygonRing, ShapeWriter};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outlines.shp");
        {
            let mut writer = ShapeWriter::from_path(&path).unwrap();
            let square = Polygon::new(PolygonRing::Outer(vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 1.0),
                Point::new(1.0, 1.0),
                Point::new(1.0, 0.0),
                Point::new(0.0, 0.0),
            ]));
            writer.write_shape(&square).unwrap();
        }
        assert!(!path.with_extension("dbf").exists());

        let boundaries = load_boundaries(&path).unwrap();
        assert_eq!(boundaries.len(), 1);
        match &boundaries[0].geometry {
            Geometry::MultiPolygon(mp) => assert_eq!(mp.0.len(), 1),
            other => panic!("unexpected geometry: {:?}", other),
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_boundaries(Path::new("boundaries.kml")).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::UnsupportedFormat { .. })));
    }

    #[tokio::test]
    async fn join_fails_when_either_input_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.input.points_csv = write_file(dir.path(), "points.csv", POINTS_CSV);
        config.input.boundaries = dir.path().join("missing.geojson");

        assert!(load_inputs(&config).await.is_err());

        config.input.boundaries = write_file(dir.path(), "b.geojson", BOUNDARIES_GEOJSON);
        let (points, boundaries) = load_inputs(&config).await.unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(boundaries.len(), 1);
    }
}
