//! Country boundary polygons and point hit-testing
//!
//! Boundaries come from a Natural Earth style GeoJSON FeatureCollection. Each
//! feature is a Polygon or MultiPolygon with the country name in `NAME`
//! (falling back to `ADMIN`, then `name`). Coordinates are `[lng, lat]`.

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson};
use std::path::Path;

const NAME_KEYS: &[&str] = &["NAME", "ADMIN", "name"];

/// A closed ring of `[lng, lat]` positions
pub type Ring = Vec<[f64; 2]>;

/// Exterior ring followed by holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        ring_contains(&self.exterior, lng, lat)
            && !self.holes.iter().any(|hole| ring_contains(hole, lng, lat))
    }

    fn bbox(&self) -> [f64; 4] {
        let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
        for [lng, lat] in &self.exterior {
            bbox[0] = bbox[0].min(*lng);
            bbox[1] = bbox[1].min(*lat);
            bbox[2] = bbox[2].max(*lng);
            bbox[3] = bbox[3].max(*lat);
        }
        bbox
    }
}

/// Even-odd ray casting
fn ring_contains(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
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

/// One country with all of its polygons
#[derive(Debug, Clone, PartialEq)]
pub struct CountryShape {
    pub name: String,
    pub polygons: Vec<Polygon>,
    bbox: [f64; 4],
}

impl CountryShape {
    pub fn new(name: String, polygons: Vec<Polygon>) -> Self {
        let bbox = polygons.iter().map(Polygon::bbox).fold(
            [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY],
            |acc, b| [acc[0].min(b[0]), acc[1].min(b[1]), acc[2].max(b[2]), acc[3].max(b[3])],
        );
        CountryShape {
            name,
            polygons,
            bbox,
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        let [min_lng, min_lat, max_lng, max_lat] = self.bbox;
        if lng < min_lng || lng > max_lng || lat < min_lat || lat > max_lat {
            return false;
        }
        self.polygons.iter().any(|p| p.contains(lng, lat))
    }
}

/// All country shapes from a boundary dataset
#[derive(Debug, Clone, Default)]
pub struct CountryBoundaries {
    countries: Vec<CountryShape>,
}

fn feature_name(feature: &Feature) -> Option<String> {
    NAME_KEYS
        .iter()
        .find_map(|key| feature.property(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| [p[0], p[1]])
        .collect()
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon> {
    let (exterior, holes) = rings.split_first()?;
    Some(Polygon {
        exterior: to_ring(exterior),
        holes: holes.iter().map(|h| to_ring(h)).collect(),
    })
}

fn feature_polygons(feature: &Feature) -> Vec<Polygon> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Polygon(rings)) => to_polygon(rings).into_iter().collect(),
        Some(geojson::Value::MultiPolygon(polys)) => {
            polys.iter().filter_map(|rings| to_polygon(rings)).collect()
        }
        _ => Vec::new(),
    }
}

impl CountryBoundaries {
    pub fn from_shapes(countries: Vec<CountryShape>) -> Self {
        CountryBoundaries { countries }
    }

    /// Parse a boundary FeatureCollection
    pub fn from_geojson(text: &str) -> Result<Self> {
        let geojson: GeoJson = text.parse().context("failed to parse boundary GeoJSON")?;
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => anyhow::bail!("expected a GeoJSON FeatureCollection of country boundaries"),
        };

        let mut countries = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.iter().enumerate() {
            let Some(name) = feature_name(feature) else {
                tracing::warn!(index, "boundary feature has no name, skipping");
                continue;
            };
            let polygons = feature_polygons(feature);
            if polygons.is_empty() {
                tracing::warn!(country = %name, "boundary feature has no polygon geometry");
                continue;
            }
            countries.push(CountryShape::new(name, polygons));
        }

        tracing::debug!(count = countries.len(), "loaded country boundaries");
        Ok(CountryBoundaries { countries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read boundaries: {}", path.display()))?;
        Self::from_geojson(&text).with_context(|| format!("invalid boundaries: {}", path.display()))
    }

    pub fn countries(&self) -> &[CountryShape] {
        &self.countries
    }

    /// Case-insensitive lookup by name
    pub fn find(&self, name: &str) -> Option<&CountryShape> {
        let wanted = name.trim();
        self.countries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(wanted))
    }

    /// First country whose polygons contain the point
    pub fn country_at(&self, lat: f64, lng: f64) -> Option<&CountryShape> {
        self.countries.iter().find(|c| c.contains(lat, lng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NAME": "Squareland"},
             "geometry": {"type": "Polygon", "coordinates": [
                [[0,0],[10,0],[10,10],[0,10],[0,0]],
                [[4,4],[6,4],[6,6],[4,6],[4,4]]
             ]}},
            {"type": "Feature", "properties": {"ADMIN": "Islands"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[20,0],[22,0],[22,2],[20,2],[20,0]]],
                [[[30,0],[32,0],[32,2],[30,2],[30,0]]]
             ]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[50,50],[51,50],[51,51],[50,50]]]}}
        ]
    }"#;

    #[test]
    fn test_load_skips_unnamed() {
        let b = CountryBoundaries::from_geojson(BOUNDARIES).unwrap();
        assert_eq!(b.countries().len(), 2);
        assert_eq!(b.countries()[1].name, "Islands");
    }

    #[test]
    fn test_point_inside_polygon() {
        let b = CountryBoundaries::from_geojson(BOUNDARIES).unwrap();
        assert_eq!(b.country_at(2.0, 2.0).map(|c| c.name.as_str()), Some("Squareland"));
        assert!(b.country_at(-1.0, 2.0).is_none());
    }

    #[test]
    fn test_hole_is_excluded() {
        let b = CountryBoundaries::from_geojson(BOUNDARIES).unwrap();
        assert!(b.country_at(5.0, 5.0).is_none());
    }

    #[test]
    fn test_multipolygon_parts() {
        let b = CountryBoundaries::from_geojson(BOUNDARIES).unwrap();
        assert_eq!(b.country_at(1.0, 31.0).map(|c| c.name.as_str()), Some("Islands"));
        assert_eq!(b.country_at(1.0, 21.0).map(|c| c.name.as_str()), Some("Islands"));
        assert!(b.country_at(1.0, 25.0).is_none());
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let b = CountryBoundaries::from_geojson(BOUNDARIES).unwrap();
        assert!(b.find("squareland").is_some());
        assert!(b.find("Atlantis").is_none());
    }
}
