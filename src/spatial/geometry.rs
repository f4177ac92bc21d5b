use serde::Serialize;
use serde_json::Value;

use crate::database::sql::SqlStatement;

/// The geometry member of a GeoJSON feature, or the value itself when it is
/// already a bare geometry.
fn geometry_of(feature: &Value) -> &Value {
    feature.get("geometry").unwrap_or(feature)
}

/// Build a PostGIS expression for a list of GeoJSON features.
///
/// One feature renders as `ST_Force2D(ST_GeomFromGeoJSON($n))`; several are
/// forced to 2D one by one and collected in input order. No features, no
/// expression.
pub fn geometry_collection_sql(features: &[Value]) -> Option<SqlStatement> {
    match features {
        [] => None,
        [single] => {
            let mut stmt = SqlStatement::new("public.ST_Force2D(public.ST_GeomFromGeoJSON(");
            stmt.push_bind(geometry_of(single).to_string()).push_sql("))");
            Some(stmt)
        }
        many => {
            let mut stmt = SqlStatement::new("public.ST_AsText(public.ST_Collect(array[");
            for (i, feature) in many.iter().enumerate() {
                if i > 0 {
                    stmt.push_sql(", ");
                }
                stmt.push_sql("public.ST_Force2D(public.ST_GeomFromGeoJSON(")
                    .push_bind(geometry_of(feature).to_string())
                    .push_sql("))");
            }
            stmt.push_sql("]))");
            Some(stmt)
        }
    }
}

/// The collection as a WGS84 `geography` value.
pub fn geography_sql(features: &[Value]) -> Option<SqlStatement> {
    let collection = geometry_collection_sql(features)?;
    let mut stmt = SqlStatement::new("public.geography(public.ST_SetSRID((");
    stmt.append(collection).push_sql(")::geometry, 4326))");
    Some(stmt)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

fn visit_positions(coordinates: &Value, f: &mut impl FnMut(f64, f64)) {
    if let Some(items) = coordinates.as_array() {
        match (items.first().and_then(Value::as_f64), items.get(1).and_then(Value::as_f64)) {
            (Some(x), Some(y)) => f(x, y),
            _ => items.iter().for_each(|item| visit_positions(item, f)),
        }
    }
}

fn visit_geometry(geometry: &Value, f: &mut impl FnMut(f64, f64)) {
    if let Some(children) = geometry.get("geometries").and_then(Value::as_array) {
        children.iter().for_each(|child| visit_geometry(child, f));
    } else if let Some(coordinates) = geometry.get("coordinates") {
        visit_positions(coordinates, f);
    }
}

/// Extent of every position in the features, or `None` when there are none.
pub fn bounding_box(features: &[Value]) -> Option<BoundingBox> {
    let mut bbox: Option<BoundingBox> = None;
    for feature in features {
        visit_geometry(geometry_of(feature), &mut |x, y| {
            bbox = Some(match bbox {
                None => BoundingBox { min_x: x, min_y: y, max_x: x, max_y: y },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        });
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sql::SqlValue;
    use serde_json::json;

    fn point(x: f64, y: f64) -> Value {
        json!({"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [x, y]}})
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(geometry_collection_sql(&[]).is_none());
        assert!(geography_sql(&[]).is_none());
    }

    #[test]
    fn single_feature_is_forced_to_2d() {
        let stmt = geometry_collection_sql(&[point(1.0, 2.0)]).unwrap();
        assert_eq!(stmt.sql(), "public.ST_Force2D(public.ST_GeomFromGeoJSON($1))");
        assert_eq!(stmt.param_count(), 1);
        assert_eq!(
            stmt.values()[0],
            &SqlValue::Text(Some(json!({"type": "Point", "coordinates": [1.0, 2.0]}).to_string()))
        );
    }

    #[test]
    fn many_features_are_collected_in_order() {
        let features: Vec<Value> = (0..3).map(|i| point(f64::from(i), 0.0)).collect();
        let stmt = geometry_collection_sql(&features).unwrap();
        assert_eq!(
            stmt.sql(),
            "public.ST_AsText(public.ST_Collect(array[\
             public.ST_Force2D(public.ST_GeomFromGeoJSON($1)), \
             public.ST_Force2D(public.ST_GeomFromGeoJSON($2)), \
             public.ST_Force2D(public.ST_GeomFromGeoJSON($3))]))"
        );
        let bound: Vec<String> = stmt
            .values()
            .iter()
            .map(|v| match v {
                SqlValue::Text(Some(s)) => s.clone(),
                other => panic!("unexpected bind {:?}", other),
            })
            .collect();
        let expected: Vec<String> = features.iter().map(|f| f["geometry"].to_string()).collect();
        assert_eq!(bound, expected);
    }

    #[test]
    fn bounding_box_spans_nested_coordinates() {
        let polygon = json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[-123.0, 48.0], [-122.0, 48.0], [-122.0, 49.5], [-123.0, 48.0]]]}
        });
        let bbox = bounding_box(&[polygon, point(-121.5, 47.0)]).unwrap();
        assert_eq!(bbox, BoundingBox { min_x: -123.0, min_y: 47.0, max_x: -121.5, max_y: 49.5 });
        assert!(bounding_box(&[json!({"type": "Feature", "geometry": null})]).is_none());
    }
}
