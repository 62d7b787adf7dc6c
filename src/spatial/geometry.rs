use geo::{ChamberlainDuquetteArea, Coord, HaversineDestination, LineString, Point, Polygon};

/// Total surface area of the Earth, km².
pub const EARTH_AREA_KM2: f64 = 510_072_000.0;

/// Builds a closed loop from vertices given in (lat, lon) degrees.
///
/// The ring is closed automatically, so the first vertex doesn't need to be
/// repeated at the end.
pub fn build_loop(vertices: &[(f64, f64)]) -> Polygon {
    let ring: Vec<(f64, f64)> = vertices.iter().map(|&(lat, lon)| (lon, lat)).collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Area of the region a loop encloses, km².
///
/// A loop on a sphere bounds two complementary regions. The enclosed one is
/// the region to the left of the boundary, so a counter-clockwise ring
/// returns its own area while a clockwise ring returns the area of the
/// complement, which approaches the full sphere for small rings. Degenerate
/// loops with fewer than 3 distinct vertices enclose nothing.
pub fn loop_area_km2(loop_: &Polygon) -> f64 {
    if loop_.exterior().0.len() < 4 {
        return 0.0;
    }
    let signed_km2 = loop_.chamberlain_duquette_signed_area() / 1_000_000.0;
    if signed_km2 >= 0.0 {
        signed_km2
    } else {
        EARTH_AREA_KM2 + signed_km2
    }
}

/// The same loop, traversed in the opposite direction.
pub fn reverse_loop(loop_: &Polygon) -> Polygon {
    let mut ring = loop_.exterior().0.clone();
    ring.reverse();
    Polygon::new(LineString::new(ring), vec![])
}

/// Approximates a disc around a center point as a regular polygon.
///
/// Vertices are emitted counter-clockwise so the result already encloses the
/// disc rather than its complement.
pub fn circular_loop(
    center_lat: f64,
    center_lon: f64,
    radius_km: f64,
    vertex_count: usize,
) -> Polygon {
    let center = Point::new(center_lon, center_lat);
    let step_deg = 360.0 / vertex_count as f64;
    let ring: Vec<Coord> = (0..vertex_count)
        .map(|i| {
            center
                .haversine_destination(-(i as f64) * step_deg, radius_km * 1000.0)
                .0
        })
        .collect();
    Polygon::new(LineString::new(ring), vec![])
}
