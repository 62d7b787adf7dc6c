use geo::{Coord, Intersects, LineString, Polygon};
use s2::cell::Cell;
use s2::cellid::CellID;
use s2::latlng::LatLng;
use s2::s1::*;
use std::collections::{HashMap, HashSet};

/// Default cell level for area coverings. Level 13 cells are roughly a
/// square kilometer, small enough to keep broad-phase false positives rare
/// and large enough to keep coverings compact.
pub const DEFAULT_CELL_LEVEL: u8 = 13;

/// Cell level bounds for covering generation.
///
/// One value is built at startup and shared by ingestion and queries, since
/// coverings computed at different levels never share cells. Callers that
/// need a different precision build a differently-configured index.
#[derive(Debug, Clone)]
pub struct CoveringConfig {
    /// Coarsest cell level allowed in a covering (0-30).
    pub min_level: u8,
    /// Finest cell level allowed in a covering (0-30).
    pub max_level: u8,
}

impl Default for CoveringConfig {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_CELL_LEVEL,
            max_level: DEFAULT_CELL_LEVEL,
        }
    }
}

/// Set of cells whose union covers the loop, as raw 64-bit cell ids.
///
/// Cells are enumerated at `max_level` by flood fill outwards from the cells
/// containing the loop's vertices, then complete sibling groups are merged
/// upwards until `min_level`. With the default fixed level the merge is a
/// no-op and the result is exactly the level-13 cells the loop touches.
/// A degenerate loop yields an empty covering.
pub fn covering_for_loop(loop_: &Polygon, config: &CoveringConfig) -> Vec<u64> {
    let ring = &loop_.exterior().0;
    if ring.len() < 4 {
        return vec![];
    }
    let max_level = u64::from(config.max_level);
    let mut visited: HashSet<u64> = HashSet::new();
    let mut frontier: Vec<CellID> = vec![];
    for coord in ring.iter() {
        let ll = LatLng::new(Deg(coord.y).into(), Deg(coord.x).into());
        let id = CellID::from(ll).parent(max_level);
        if visited.insert(id.0) {
            frontier.push(id);
        }
    }
    let mut cells: Vec<CellID> = vec![];
    while let Some(id) = frontier.pop() {
        if !loop_.intersects(&cell_bounds(id)) {
            continue;
        }
        cells.push(id);
        for neighbor in id.edge_neighbors() {
            if visited.insert(neighbor.0) {
                frontier.push(neighbor);
            }
        }
    }
    let cells = merge_sibling_groups(cells, u64::from(config.min_level), max_level);
    let mut res: Vec<u64> = cells.into_iter().map(|it| it.0).collect();
    res.sort_unstable();
    res
}

/// The cell's boundary as a lat/lon quad.
fn cell_bounds(id: CellID) -> Polygon {
    let cell = Cell::from(id);
    let ring: Vec<Coord> = (0..4usize)
        .map(|k| {
            let ll = LatLng::from(cell.vertex(k));
            Coord {
                x: ll.lng.deg(),
                y: ll.lat.deg(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), vec![])
}

/// Replaces every complete group of 4 sibling cells with its parent, level
/// by level, stopping at `min_level`. The union of the set is unchanged.
fn merge_sibling_groups(cells: Vec<CellID>, min_level: u64, max_level: u64) -> Vec<CellID> {
    let mut res: Vec<CellID> = vec![];
    let mut level_cells = cells;
    let mut level = max_level;
    while level > min_level {
        let mut by_parent: HashMap<u64, Vec<CellID>> = HashMap::new();
        for id in level_cells {
            if id.level() == level {
                by_parent.entry(id.parent(level - 1).0).or_default().push(id);
            } else {
                res.push(id);
            }
        }
        level_cells = vec![];
        for (parent, group) in by_parent {
            if group.len() == 4 {
                level_cells.push(CellID(parent));
            } else {
                res.extend(group);
            }
        }
        level -= 1;
    }
    res.extend(level_cells);
    res
}
