//! Location masking for public search results.
//!
//! A feature whose properties carry
//! `"mask": {"centroid": [lng, lat], "radius": metres}` is published as a
//! circle around the centroid instead of its real geometry.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

const EARTH_RADIUS_M: f64 = 6_371_008.8;
const CIRCLE_STEPS: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum MaskError {
    #[error("Malformed mask: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Mask {
    pub centroid: [f64; 2],
    pub radius: f64,
}

impl Mask {
    pub fn from_value(value: &Value) -> Result<Self, MaskError> {
        let mask: Mask = serde_json::from_value(value.clone()).map_err(|e| MaskError::Malformed(e.to_string()))?;
        let [lng, lat] = mask.centroid;
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(MaskError::Malformed("centroid out of range".to_string()));
        }
        if !mask.radius.is_finite() || mask.radius <= 0.0 {
            return Err(MaskError::Malformed("radius must be positive".to_string()));
        }
        Ok(mask)
    }
}

/// Closed polygon ring approximating a circle on the sphere.
pub fn circle_polygon(mask: &Mask, steps: usize) -> Value {
    let [lng, lat] = mask.centroid;
    let (lat1, lng1) = (lat.to_radians(), lng.to_radians());
    let angular = mask.radius / EARTH_RADIUS_M;

    let mut ring: Vec<[f64; 2]> = (0..steps)
        .map(|i| {
            let bearing = -(i as f64) * std::f64::consts::TAU / steps as f64;
            let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
            let lng2 = lng1
                + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());
            [lng2.to_degrees(), lat2.to_degrees()]
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }

    json!({ "type": "Polygon", "coordinates": [ring] })
}

/// Replace the geometry of a masked feature in place. Features without a
/// mask are left untouched.
pub fn apply_mask(feature: &mut Value) -> Result<(), MaskError> {
    let Some(mask) = feature.pointer("/properties/mask") else {
        return Ok(());
    };
    if mask.is_null() {
        return Ok(());
    }
    let mask = Mask::from_value(mask)?;
    let circle = circle_polygon(&mask, CIRCLE_STEPS);

    match feature.get_mut("geometry") {
        Some(geometry) => *geometry = circle,
        None => return Err(MaskError::Malformed("feature has no geometry".to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn haversine(a: [f64; 2], b: [f64; 2]) -> f64 {
        let (lat1, lat2) = (a[1].to_radians(), b[1].to_radians());
        let dlat = lat2 - lat1;
        let dlng = (b[0] - a[0]).to_radians();
        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }

    #[test]
    fn circle_is_closed_and_centred() {
        let mask = Mask { centroid: [-123.4, 48.4], radius: 5000.0 };
        let polygon = circle_polygon(&mask, 32);
        let ring: Vec<[f64; 2]> = serde_json::from_value(polygon["coordinates"][0].clone()).unwrap();

        assert_eq!(ring.len(), 33);
        assert_eq!(ring.first(), ring.last());
        for point in &ring {
            let d = haversine(mask.centroid, *point);
            assert!((d - 5000.0).abs() < 1.0, "distance {}", d);
        }
    }

    #[test]
    fn masked_feature_geometry_is_replaced() {
        let mut feature = json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [-123.4, 48.4]},
            "properties": {"mask": {"centroid": [-123.4, 48.4], "radius": 1000}}
        });
        apply_mask(&mut feature).unwrap();
        assert_eq!(feature["geometry"]["type"], "Polygon");
    }

    #[test]
    fn unmasked_feature_is_untouched() {
        let original = json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {}});
        let mut feature = original.clone();
        apply_mask(&mut feature).unwrap();
        assert_eq!(feature, original);
    }

    #[test]
    fn malformed_masks_are_errors() {
        for mask in [
            json!({"radius": 10}),
            json!({"centroid": [1.0, 2.0]}),
            json!({"centroid": [1.0], "radius": 10}),
            json!({"centroid": [200.0, 0.0], "radius": 10}),
            json!({"centroid": [0.0, 0.0], "radius": -1}),
            json!("circle"),
        ] {
            let mut feature = json!({"type": "Feature", "geometry": {}, "properties": {"mask": mask}});
            assert!(matches!(apply_mask(&mut feature), Err(MaskError::Malformed(_))));
        }
    }
}
