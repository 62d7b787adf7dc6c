use super::covering::{self, CoveringConfig};
use crate::db::area::blocking_queries;
use crate::db::area::schema::{Area, AreaKind};
use crate::{Error, Result};
use geo::Polygon;
use rusqlite::Connection;

/// Cell-based inverted index over stored areas.
///
/// Thin orchestration between the covering routines and the area store:
/// covering generation decides which cells an area claims, the store decides
/// how the claims are persisted and joined. Errors from either side pass
/// through unwrapped.
#[derive(Clone)]
pub struct SpatialIndex {
    config: CoveringConfig,
}

impl SpatialIndex {
    pub fn new(config: CoveringConfig) -> Self {
        Self { config }
    }

    /// Cells to associate with a normalized loop about to be stored. Doesn't
    /// touch the store; writing the association is the caller's transaction.
    pub fn cover(&self, loop_: &Polygon) -> Result<Vec<u64>> {
        let cells = covering::covering_for_loop(loop_, &self.config);
        if cells.is_empty() {
            return Err(Error::InvalidGeometry("Loop has an empty covering".into()));
        }
        Ok(cells)
    }

    /// All stored areas of `kind` whose covering shares at least one cell
    /// with the region's covering. This is a broad phase: areas whose
    /// covering merely touches the region's cells are included, exact
    /// geometric intersection is never computed.
    pub fn query(&self, region: &Polygon, kind: AreaKind, conn: &Connection) -> Result<Vec<Area>> {
        let cells = covering::covering_for_loop(region, &self.config);
        if cells.is_empty() {
            return Err(Error::InvalidInput("No query region provided".into()));
        }
        blocking_queries::select_by_cells(&cells, kind, conn)
    }
}
