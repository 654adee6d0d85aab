//! Administrative boundaries for the choropleth map.

use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson, Value as GeometryValue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("boundary file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("no polygon features with a '{0}' property")]
    NoRegions(String),
}

/// One region outline. Rings are `[lon, lat]` outer boundaries; holes are
/// dropped since ADM1 shapes of Ghana have none worth drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub name: String,
    pub rings: Vec<Vec<[f64; 2]>>,
    /// Fill triangles per ring, as indices into that ring.
    pub triangles: Vec<Vec<[usize; 3]>>,
}

impl RegionShape {
    /// Ray-casting point-in-polygon test over all rings.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.rings.iter().any(|ring| ring_contains(ring, lon, lat))
    }
}

fn ring_contains(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// All region shapes from an ADM1 GeoJSON file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Boundaries {
    pub regions: Vec<RegionShape>,
}

impl Boundaries {
    pub fn load(path: &Path, name_property: &str) -> Result<Self, BoundaryError> {
        if !path.is_file() {
            return Err(BoundaryError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, name_property)
    }

    /// Parse a FeatureCollection (or single Feature). Features without the
    /// name property or without polygon geometry are skipped.
    pub fn parse(text: &str, name_property: &str) -> Result<Self, BoundaryError> {
        let features = match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => Vec::new(),
        };

        let regions: Vec<RegionShape> = features
            .iter()
            .filter_map(|f| region_from_feature(f, name_property))
            .collect();

        if regions.is_empty() {
            return Err(BoundaryError::NoRegions(name_property.to_string()));
        }
        log::debug!("parsed {} region boundaries", regions.len());
        Ok(Self { regions })
    }

    /// Region under a map coordinate.
    pub fn region_at(&self, lon: f64, lat: f64) -> Option<&RegionShape> {
        self.regions.iter().find(|r| r.contains(lon, lat))
    }
}

fn region_from_feature(feature: &Feature, name_property: &str) -> Option<RegionShape> {
    let name = feature.property(name_property)?.as_str()?.to_string();
    let geometry = feature.geometry.as_ref()?;

    let to_ring = |ring: &Vec<Vec<f64>>| -> Vec<[f64; 2]> {
        ring.iter()
            .filter(|p| p.len() >= 2)
            .map(|p| [p[0], p[1]])
            .collect()
    };

    let rings: Vec<Vec<[f64; 2]>> = match &geometry.value {
        GeometryValue::Polygon(poly) => poly.first().map(to_ring).into_iter().collect(),
        GeometryValue::MultiPolygon(polys) => polys
            .iter()
            .filter_map(|poly| poly.first().map(to_ring))
            .collect(),
        _ => return None,
    };

    let triangles = rings.iter().map(|r| triangulate(r)).collect();
    Some(RegionShape {
        name,
        rings,
        triangles,
    })
}

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

fn in_triangle(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear-clipping triangulation of a simple ring (closing vertex optional).
/// The painter can only fill convex shapes, so region outlines are cut
/// into triangles once at load time.
pub fn triangulate(ring: &[[f64; 2]]) -> Vec<[usize; 3]> {
    let mut n = ring.len();
    if n >= 2 && ring[0] == ring[n - 1] {
        n -= 1;
    }
    if n < 3 {
        return Vec::new();
    }

    let twice_area: f64 = (0..n).map(|i| cross([0.0, 0.0], ring[i], ring[(i + 1) % n])).sum();
    let mut idx: Vec<usize> = (0..n).collect();
    if twice_area < 0.0 {
        idx.reverse();
    }

    let mut tris = Vec::with_capacity(n - 2);
    let mut i = 0;
    let mut misses = 0;
    while idx.len() > 3 {
        let m = idx.len();
        let (a, b, c) = (idx[(i + m - 1) % m], idx[i], idx[(i + 1) % m]);
        let (pa, pb, pc) = (ring[a], ring[b], ring[c]);

        let is_ear = cross(pa, pb, pc) > 0.0
            && idx.iter().all(|&k| {
                let pk = ring[k];
                pk == pa || pk == pb || pk == pc || !in_triangle(pk, pa, pb, pc)
            });

        if is_ear {
            tris.push([a, b, c]);
            idx.remove(i);
            i %= idx.len();
            misses = 0;
        } else {
            i = (i + 1) % m;
            misses += 1;
            if misses > m {
                // Self-intersecting or degenerate input: fan the rest.
                break;
            }
        }
    }
    for k in 1..idx.len().saturating_sub(1) {
        tris.push([idx[0], idx[k], idx[k + 1]]);
    }
    tris
}

/// Normalize a region name for matching between the dataset and the
/// boundary file: `"Greater Accra Region"`, `"greater-accra"` and
/// `"Greater Accra"` compare equal.
pub fn normalize_region(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let stem = lower.strip_suffix("region").unwrap_or(&lower);
    stem.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "properties": { "shapeName": "Greater Accra Region" },
          "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 5.5], [0.5, 5.5], [0.5, 6.0], [0.0, 6.0], [0.0, 5.5]]]
          }
        },
        {
          "type": "Feature",
          "properties": { "shapeName": "Volta" },
          "geometry": {
            "type": "MultiPolygon",
            "coordinates": [
              [[[0.5, 6.0], [1.0, 6.0], [1.0, 7.0], [0.5, 7.0], [0.5, 6.0]]],
              [[[1.1, 6.0], [1.2, 6.0], [1.2, 6.1], [1.1, 6.0]]]
            ]
          }
        },
        {
          "type": "Feature",
          "properties": { "other": "x" },
          "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
        }
      ]
    }"#;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let b = Boundaries::parse(SAMPLE, "shapeName").unwrap();
        assert_eq!(b.regions.len(), 2);
        assert_eq!(b.regions[0].rings.len(), 1);
        assert_eq!(b.regions[1].rings.len(), 2);
        assert_eq!(b.regions[0].rings[0][1], [0.5, 5.5]);
    }

    #[test]
    fn shape_names_normalize_like_dataset_regions() {
        let b = Boundaries::parse(SAMPLE, "shapeName").unwrap();
        assert_eq!(normalize_region(&b.regions[0].name), normalize_region("Greater Accra"));
        assert_eq!(normalize_region(&b.regions[1].name), normalize_region("VOLTA"));
    }

    #[test]
    fn point_lookup() {
        let b = Boundaries::parse(SAMPLE, "shapeName").unwrap();
        assert_eq!(b.region_at(0.25, 5.75).unwrap().name, "Greater Accra Region");
        assert_eq!(b.region_at(0.75, 6.5).unwrap().name, "Volta");
        assert!(b.region_at(-3.0, 9.0).is_none());
    }

    #[test]
    fn wrong_property_yields_no_regions() {
        assert!(matches!(
            Boundaries::parse(SAMPLE, "ADM1_EN"),
            Err(BoundaryError::NoRegions(_))
        ));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            Boundaries::parse("{ nope", "shapeName"),
            Err(BoundaryError::GeoJson(_))
        ));
    }

    fn area(ring: &[[f64; 2]], tris: &[[usize; 3]]) -> f64 {
        tris.iter()
            .map(|t| cross(ring[t[0]], ring[t[1]], ring[t[2]]).abs() / 2.0)
            .sum()
    }

    #[test]
    fn triangulates_square_either_orientation() {
        let ccw = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        let tris = triangulate(&ccw);
        assert_eq!(tris.len(), 2);
        assert!((area(&ccw, &tris) - 1.0).abs() < 1e-12);

        let mut cw = ccw;
        cw.reverse();
        assert!((area(&cw, &triangulate(&cw)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn triangulates_concave_ring() {
        // L-shape with area 3.
        let ring = [[0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0]];
        let tris = triangulate(&ring);
        assert_eq!(tris.len(), 4);
        assert!((area(&ring, &tris) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_rings_have_no_triangles() {
        assert!(triangulate(&[[0.0, 0.0], [1.0, 1.0]]).is_empty());
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_region("Greater Accra Region"), "greateraccra");
        assert_eq!(normalize_region("greater-accra"), "greateraccra");
        assert_eq!(normalize_region(" Bono East "), "bonoeast");
    }
}
