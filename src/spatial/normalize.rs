use super::geometry;
use crate::{Error, Result};
use geo::Polygon;

/// Largest area accepted for an ingested polygon, km².
pub const MAX_AREA_KM2: f64 = 2500.0;

/// Largest region accepted for a bounding-box query, km².
pub const MAX_QUERY_AREA_KM2: f64 = 100_000.0;

/// Orients a loop so it encloses the smaller of the two regions its boundary
/// bounds, and rejects loops that are too large either way.
///
/// The winding test is the area threshold itself, not a real orientation
/// check: a loop whose area exceeds `max_area_km2` is assumed to be wound
/// backwards and is reversed once. That reading is only valid while the
/// intended region stays under the threshold and its complement above it,
/// which holds for any realistic input at the configured thresholds.
pub fn normalize_loop(loop_: Polygon, max_area_km2: f64) -> Result<Polygon> {
    if geometry::loop_area_km2(&loop_) <= max_area_km2 {
        return Ok(loop_);
    }
    let reversed = geometry::reverse_loop(&loop_);
    let area = geometry::loop_area_km2(&reversed);
    if area > max_area_km2 {
        return Err(Error::InvalidGeometry(format!(
            "Loop area {area:.0} km2 exceeds the {max_area_km2:.0} km2 limit"
        )));
    }
    Ok(reversed)
}
