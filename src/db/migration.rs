use crate::Result;
use include_dir::include_dir;
use include_dir::Dir;
use rusqlite::Connection;
use tracing::info;
use tracing::warn;

static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

/// Applies every migration newer than the schema version recorded in
/// `PRAGMA user_version`, each in its own transaction.
pub fn run(db: &mut Connection) -> Result<()> {
    let mut schema_ver: i32 =
        db.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
            row.get(0)
        })?;

    loop {
        let next = schema_ver + 1;
        let file_name = format!("{next}.sql");
        let Some(file) = MIGRATIONS_DIR.get_file(&file_name) else {
            break;
        };
        let sql = file
            .contents_utf8()
            .ok_or(format!("Can't read {file_name} in UTF-8"))?;
        warn!(migration = %file_name, "Found new migration");
        let tx = db.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute_batch(&format!("PRAGMA user_version={next}"))?;
        tx.commit()?;
        schema_ver = next;
    }

    info!(schema_ver, "Database schema is up to date");

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::Result;
    use rusqlite::Connection;

    #[test]
    fn run_is_idempotent() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        super::run(&mut conn)?;
        let schema_ver: i32 =
            conn.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
                row.get(0)
            })?;
        assert!(schema_ver >= 1);
        super::run(&mut conn)?;
        let schema_ver_again: i32 =
            conn.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
                row.get(0)
            })?;
        assert_eq!(schema_ver, schema_ver_again);
        Ok(())
    }
}
