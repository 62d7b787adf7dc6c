pub mod area;
pub mod cell_area;
pub mod migration;

use crate::{Error, Result};
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;
use std::fs::create_dir_all;
use std::path::PathBuf;
use tracing::info;

pub fn pool() -> Result<Pool> {
    Config::new(db_file_path()?)
        .create_pool(Runtime::Tokio1)
        .map_err(Into::into)
}

pub fn open_connection() -> Result<Connection> {
    let conn = Connection::open(db_file_path()?)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

pub fn db_file_path() -> Result<PathBuf> {
    #[allow(deprecated)]
    let data_dir = std::env::home_dir()
        .ok_or("Home directory does not exist")?
        .join(".local/share/airspace-api");
    if !data_dir.exists() {
        create_dir_all(&data_dir)?;
    }
    Ok(data_dir.join("airspace.db"))
}

pub fn cli_run(args: &[String]) -> Result<()> {
    let first_arg = match args.first() {
        Some(some) => some,
        None => Err(Error::CLI("No db actions passed".into()))?,
    };

    match first_arg.as_str() {
        "migrate" => migration::run(&mut open_connection()?),
        "drop" => drop_db(),
        _ => Err(Error::CLI(format!("Unknown command: {first_arg}")))?,
    }
}

fn drop_db() -> Result<()> {
    let file_path = db_file_path()?;
    if !file_path.exists() {
        Err(Error::CLI("Database file does not exist".into()))?
    }
    std::fs::remove_file(&file_path)?;
    info!("Removed database file {}", file_path.display());
    Ok(())
}

#[cfg(test)]
pub mod test {
    use deadpool_sqlite::{Config, Pool, Runtime};
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        super::migration::run(&mut conn).unwrap();
        conn
    }

    static MEM_DB_COUNTER: AtomicUsize = AtomicUsize::new(1);

    /// In-memory database reachable from every pool connection. The returned
    /// connection keeps the database alive for the duration of the test.
    pub fn pool() -> (Connection, Pool) {
        let uri = format!(
            "file:testdb_{}?mode=memory&cache=shared",
            MEM_DB_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let mut conn = Connection::open(&uri).unwrap();
        super::migration::run(&mut conn).unwrap();
        let pool = Config::new(uri).create_pool(Runtime::Tokio1).unwrap();
        (conn, pool)
    }
}
