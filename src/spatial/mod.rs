pub mod coordinates;
pub mod geometry;
pub mod mask;

pub use coordinates::{parse_lat_long, parse_utm, LatLong, Utm};
pub use geometry::{bounding_box, geography_sql, geometry_collection_sql, BoundingBox};
pub use mask::{apply_mask, circle_polygon, Mask, MaskError};
