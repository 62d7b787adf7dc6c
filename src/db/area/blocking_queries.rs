use super::schema;
use super::schema::{Area, AreaKind, Columns};
use crate::db::cell_area;
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::vtab::array::{self, Array};
use rusqlite::{params, Connection};
use std::rc::Rc;

/// Inserts or fully replaces an area and its cell associations in a single
/// transaction. Associations left over from an earlier covering are removed,
/// so the association set always equals the current covering.
pub fn upsert(
    id: impl Into<String>,
    name: impl Into<String>,
    kind: AreaKind,
    geometry: &[Vec<Vec<f64>>],
    cells: &[u64],
    conn: &mut Connection,
) -> Result<Area> {
    let id = id.into();
    let tx = conn.transaction()?;
    let area = upsert_row(&id, name, kind, geometry, &tx)?;
    cell_area::blocking_queries::replace_for_area(&id, cells, &tx)?;
    tx.commit()?;
    Ok(area)
}

fn upsert_row(
    id: &str,
    name: impl Into<String>,
    kind: AreaKind,
    geometry: &[Vec<Vec<f64>>],
    conn: &Connection,
) -> Result<Area> {
    let sql = format!(
        r#"
            INSERT INTO {table} ({area_id}, {area_name}, {area_type}, {area_geometry})
            VALUES (?1, ?2, ?3, json(?4))
            ON CONFLICT ({area_id}) DO UPDATE SET
                {area_name} = excluded.{area_name},
                {area_type} = excluded.{area_type},
                {area_geometry} = excluded.{area_geometry},
                {updated_at} = strftime('%Y-%m-%dT%H:%M:%fZ')
            RETURNING {projection}
        "#,
        table = schema::TABLE_NAME,
        area_id = Columns::AreaId.as_str(),
        area_name = Columns::AreaName.as_str(),
        area_type = Columns::AreaType.as_str(),
        area_geometry = Columns::AreaGeometry.as_str(),
        updated_at = Columns::UpdatedAt.as_str(),
        projection = Area::projection(),
    );
    conn.query_row(
        &sql,
        params![
            id,
            name.into(),
            kind.as_i64(),
            serde_json::to_string(geometry)?
        ],
        Area::mapper(),
    )
    .map_err(Into::into)
}

/// Looks up an area expecting exactly one row. Zero rows is NotFound; more
/// than one means the primary key invariant is broken and is surfaced
/// instead of silently picking a row.
pub fn select_by_id(id: impl Into<String>, conn: &Connection) -> Result<Area> {
    let id = id.into();
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {area_id} = ?1
        "#,
        projection = Area::projection(),
        table = schema::TABLE_NAME,
        area_id = Columns::AreaId.as_str(),
    );
    let mut rows = conn
        .prepare(&sql)?
        .query_map(params![id], Area::mapper())?
        .collect::<Result<Vec<_>, _>>()?;
    match rows.len() {
        0 => Err(Error::NotFound(format!("Area {id} doesn't exist"))),
        1 => Ok(rows.remove(0)),
        n => Err(Error::TooManyRows(format!(
            "Query for area {id} returned {n} rows"
        ))),
    }
}

/// All areas of the given kind claiming at least one of the given cells.
/// Each area appears once even when several of its cells match.
pub fn select_by_cells(cells: &[u64], kind: AreaKind, conn: &Connection) -> Result<Vec<Area>> {
    if cells.is_empty() {
        return Err(Error::InvalidInput("No cells provided".into()));
    }
    array::load_module(conn)?;
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {area_type} = ?1 AND {area_id} IN (
                SELECT DISTINCT {assoc_area_id}
                FROM {assoc_table}
                WHERE {assoc_cell_id} IN rarray(?2)
            )
            ORDER BY {area_id}
        "#,
        projection = Area::projection(),
        table = schema::TABLE_NAME,
        area_type = Columns::AreaType.as_str(),
        area_id = Columns::AreaId.as_str(),
        assoc_table = cell_area::schema::TABLE_NAME,
        assoc_area_id = cell_area::schema::Columns::AreaId.as_str(),
        assoc_cell_id = cell_area::schema::Columns::CellId.as_str(),
    );
    let cells: Array = Rc::new(
        cells
            .iter()
            .map(|it| Value::from(*it as i64))
            .collect::<Vec<Value>>(),
    );
    conn.prepare(&sql)?
        .query_map(params![kind.as_i64(), cells], Area::mapper())?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Removes the area row and all of its cell associations atomically.
pub fn delete(id: impl Into<String>, conn: &mut Connection) -> Result<Area> {
    let id = id.into();
    let tx = conn.transaction()?;
    let area = select_by_id(id.as_str(), &tx)?;
    tx.execute(
        &format!(
            "DELETE FROM {table} WHERE {area_id} = ?1",
            table = cell_area::schema::TABLE_NAME,
            area_id = cell_area::schema::Columns::AreaId.as_str(),
        ),
        params![id],
    )?;
    tx.execute(
        &format!(
            "DELETE FROM {table} WHERE {area_id} = ?1",
            table = schema::TABLE_NAME,
            area_id = Columns::AreaId.as_str(),
        ),
        params![id],
    )?;
    tx.commit()?;
    Ok(area)
}
