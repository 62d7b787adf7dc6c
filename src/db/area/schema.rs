use rusqlite::Row;
use time::OffsetDateTime;

pub const TABLE_NAME: &str = "areas";

pub enum Columns {
    AreaId,
    AreaName,
    AreaType,
    AreaGeometry,
    CreatedAt,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::AreaId => "area_id",
            Columns::AreaName => "area_name",
            Columns::AreaType => "area_type",
            Columns::AreaGeometry => "area_geometry",
            Columns::CreatedAt => "created_at",
            Columns::UpdatedAt => "updated_at",
        }
    }
}

/// Classification tag partitioning the index into independent query spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    District,
    Airport,
}

impl AreaKind {
    pub fn as_i64(self) -> i64 {
        match self {
            AreaKind::District => 0,
            AreaKind::Airport => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub kind: AreaKind,
    /// Polygon rings in GeoJSON coordinate order: outer ring first, each
    /// vertex a [lon, lat] pair.
    pub geometry: Vec<Vec<Vec<f64>>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Area {
    pub fn projection() -> String {
        [
            Columns::AreaId,
            Columns::AreaName,
            Columns::AreaType,
            Columns::AreaGeometry,
            Columns::CreatedAt,
            Columns::UpdatedAt,
        ]
        .iter()
        .map(Columns::as_str)
        .collect::<Vec<_>>()
        .join(", ")
    }

    pub fn mapper() -> fn(&Row) -> rusqlite::Result<Area> {
        |row: &Row| -> rusqlite::Result<Area> {
            let kind = match row.get::<_, i64>(2)? {
                0 => AreaKind::District,
                1 => AreaKind::Airport,
                other => return Err(rusqlite::Error::IntegralValueOutOfRange(2, other)),
            };
            let geometry: String = row.get(3)?;
            Ok(Area {
                id: row.get(0)?,
                name: row.get(1)?,
                kind,
                geometry: serde_json::from_str(&geometry).unwrap_or_default(),
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        }
    }

    #[cfg(test)]
    pub fn mock_geometry() -> Vec<Vec<Vec<f64>>> {
        vec![vec![
            vec![139.04, 35.04],
            vec![139.06, 35.04],
            vec![139.06, 35.06],
            vec![139.04, 35.06],
            vec![139.04, 35.04],
        ]]
    }
}
