use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::connection::DbConnection;
use crate::database::error::SqlResultExt;
use crate::database::sql::SqlStatement;
use crate::error::{ApiError, ApiResult};
use crate::spatial::{parse_lat_long, parse_utm, LatLong, Utm};

#[derive(Debug, Clone, Deserialize)]
pub struct PointRequest {
    pub coordinates: String,
}

/// A WGS84 GeoJSON point plus the format the input was recognised as.
#[derive(Debug, Clone, Serialize)]
pub struct PointResponse {
    pub format: &'static str,
    pub geometry: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    LatLong(LatLong),
    Utm(Utm),
}

/// Lat/long is tried first: `"48.4 -123.4"` is never a valid UTM string.
pub fn recognise(input: &str) -> Option<Coordinates> {
    parse_lat_long(input)
        .map(Coordinates::LatLong)
        .or_else(|| parse_utm(input).map(Coordinates::Utm))
}

pub fn point_geometry(lat_long: &LatLong) -> Value {
    json!({ "type": "Point", "coordinates": [lat_long.longitude, lat_long.latitude] })
}

pub fn utm_transform_statement(utm: &Utm) -> SqlStatement {
    let mut stmt = SqlStatement::new(
        "SELECT public.ST_AsGeoJSON(public.ST_Transform(public.ST_SetSRID(public.ST_MakePoint(",
    );
    stmt.push_bind(utm.easting)
        .push_sql(", ")
        .push_bind(utm.northing)
        .push_sql("), ")
        .push_bind(utm.zone_srid)
        .push_sql("), 4326))::text AS geometry");
    stmt
}

pub struct SpatialService<'c> {
    conn: &'c mut DbConnection,
}

impl<'c> SpatialService<'c> {
    pub fn new(conn: &'c mut DbConnection) -> Self {
        Self { conn }
    }

    pub async fn point(&mut self, input: &str) -> ApiResult<PointResponse> {
        match recognise(input) {
            Some(Coordinates::LatLong(lat_long)) => Ok(PointResponse {
                format: "latlong",
                geometry: point_geometry(&lat_long),
            }),
            Some(Coordinates::Utm(utm)) => {
                let stmt = utm_transform_statement(&utm);
                let (text,): (String,) = self
                    .conn
                    .fetch_one(&stmt, "Failed to transform UTM coordinates")
                    .await
                    .origin("SpatialService->point")?;
                let geometry = serde_json::from_str(&text)
                    .map_err(|e| ApiError::internal_server_error(format!("Invalid transformed point: {}", e)))?;
                Ok(PointResponse { format: "utm", geometry })
            }
            None => Err(ApiError::invalid_field(
                "coordinates",
                "expected '<lat> <long>' or '<zone><letter> <easting> <northing>'",
            )),
        }
    }
}
