use super::schema;
use super::schema::Columns;
use crate::Result;
use rusqlite::{params, Connection};

/// Replaces the association set of an area with the given cells. The table
/// is a derived index over the area's covering, so old rows are deleted
/// rather than appended to. Runs inside the caller's transaction.
pub fn replace_for_area(area_id: &str, cells: &[u64], conn: &Connection) -> Result<()> {
    conn.execute(
        &format!(
            "DELETE FROM {table} WHERE {area_id} = ?1",
            table = schema::TABLE_NAME,
            area_id = Columns::AreaId.as_str(),
        ),
        params![area_id],
    )?;
    let sql = format!(
        r#"
            INSERT OR IGNORE INTO {table} ({cell_id}, {area_id})
            VALUES (?1, ?2)
        "#,
        table = schema::TABLE_NAME,
        cell_id = Columns::CellId.as_str(),
        area_id = Columns::AreaId.as_str(),
    );
    let mut stmt = conn.prepare(&sql)?;
    for cell in cells {
        stmt.execute(params![*cell as i64, area_id])?;
    }
    Ok(())
}

/// Cells associated with an area, ascending.
pub fn select_by_area_id(area_id: &str, conn: &Connection) -> Result<Vec<u64>> {
    let sql = format!(
        r#"
            SELECT {cell_id}
            FROM {table}
            WHERE {area_id} = ?1
            ORDER BY {cell_id}
        "#,
        cell_id = Columns::CellId.as_str(),
        table = schema::TABLE_NAME,
        area_id = Columns::AreaId.as_str(),
    );
    conn.prepare(&sql)?
        .query_map(params![area_id], |row| {
            row.get::<_, i64>(0).map(|it| it as u64)
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[cfg(test)]
mod test {
    use crate::db::area::schema::{Area, AreaKind};
    use crate::db::{area, test::conn};
    use crate::Result;

    #[test]
    fn replace_for_area() -> Result<()> {
        let mut conn = conn();
        area::blocking_queries::upsert(
            "1",
            "Area 1",
            AreaKind::District,
            &Area::mock_geometry(),
            &[],
            &mut conn,
        )?;
        super::replace_for_area("1", &[30, 10, 20], &conn)?;
        assert_eq!(vec![10, 20, 30], super::select_by_area_id("1", &conn)?);
        super::replace_for_area("1", &[20], &conn)?;
        assert_eq!(vec![20], super::select_by_area_id("1", &conn)?);
        Ok(())
    }

    #[test]
    fn select_by_area_id_empty() -> Result<()> {
        let conn = conn();
        assert!(super::select_by_area_id("1", &conn)?.is_empty());
        Ok(())
    }
}
