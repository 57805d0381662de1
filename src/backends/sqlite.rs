//! SQLite driver
//!
//! Implements the backend connection traits over `rusqlite` (bundled).
//! SQLite has no autocommit switch of its own: the connection is in
//! autocommit whenever no transaction is open, so entering manual-commit
//! mode issues `BEGIN` and leaving it falls out naturally once the
//! transaction ends. Savepoints are driven through `SAVEPOINT` SQL with
//! connection-local sequential names.

use crate::core::backend::{
    BackendConnection, BackendResult, BoundStatement, Connector, RowSource, SavepointToken,
};
use crate::core::config::ConnectParams;
use crate::core::session::Session;
use crate::core::value::{Row, Value};

use rusqlite::params_from_iter;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Opens SQLite connections
///
/// The connection URL is a filesystem path or `:memory:`; credentials are
/// ignored.
#[derive(Debug, Default)]
pub struct SqliteConnector;

impl SqliteConnector {
    /// Create a connector
    pub fn new() -> Self {
        Self
    }

    /// Convenience: a lazily-connected session over a SQLite database
    pub fn session<S: Into<String>>(path: S) -> Session {
        Session::new(Box::new(SqliteConnector::new()), ConnectParams::new(path))
    }
}

impl Connector for SqliteConnector {
    fn open(&self, params: &ConnectParams) -> BackendResult<Box<dyn BackendConnection>> {
        let conn = Connection::open(params.url())?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Box::new(SqliteConnection {
            conn,
            savepoint_seq: 0,
        }))
    }
}

/// A live SQLite connection
pub struct SqliteConnection {
    conn: Connection,
    savepoint_seq: u32,
}

impl SqliteConnection {
    fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
        let mut out = Row::new();
        let column_count = row.as_ref().column_count();
        for i in 0..column_count {
            let name = row.as_ref().column_name(i)?.to_string();
            let value = match row.get_ref(i)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(v) => Value::Integer(v),
                ValueRef::Real(v) => Value::Real(v),
                ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).to_string()),
                ValueRef::Blob(v) => Value::Blob(v.to_vec()),
            };
            out.push(name, value);
        }
        Ok(out)
    }

    fn bind_value(value: &Value) -> Box<dyn rusqlite::ToSql> {
        match value {
            Value::Null => Box::new(None::<i64>),
            Value::Integer(v) => Box::new(*v),
            Value::Real(v) => Box::new(*v),
            Value::Text(v) => Box::new(v.clone()),
            Value::Blob(v) => Box::new(v.clone()),
        }
    }

    fn collect_rows<P: rusqlite::Params>(
        stmt: &mut rusqlite::Statement<'_>,
        params: P,
    ) -> BackendResult<Box<dyn RowSource>> {
        let mut rows = Vec::new();
        let mut raw = stmt.query(params)?;
        while let Some(row) = raw.next()? {
            rows.push(Self::decode_row(row)?);
        }
        Ok(Box::new(MaterializedRows {
            rows: rows.into_iter(),
        }))
    }
}

/// Rows fetched up front and served in order
///
/// rusqlite statements cannot outlive a borrow of the connection, so the
/// result set is materialized before it crosses the cursor seam.
struct MaterializedRows {
    rows: std::vec::IntoIter<Row>,
}

impl RowSource for MaterializedRows {
    fn next_row(&mut self) -> BackendResult<Option<Row>> {
        Ok(self.rows.next())
    }
}

struct SqliteStatement<'conn> {
    stmt: rusqlite::Statement<'conn>,
}

impl BoundStatement for SqliteStatement<'_> {
    fn execute(&mut self, params: &[Value]) -> BackendResult<u64> {
        let bound: Vec<Box<dyn rusqlite::ToSql>> =
            params.iter().map(SqliteConnection::bind_value).collect();
        let affected = self.stmt.execute(params_from_iter(bound.iter()))?;
        Ok(affected as u64)
    }

    fn query(&mut self, params: &[Value]) -> BackendResult<Box<dyn RowSource>> {
        let bound: Vec<Box<dyn rusqlite::ToSql>> =
            params.iter().map(SqliteConnection::bind_value).collect();
        let mut rows = Vec::new();
        let mut raw = self.stmt.query(params_from_iter(bound.iter()))?;
        while let Some(row) = raw.next()? {
            rows.push(SqliteConnection::decode_row(row)?);
        }
        Ok(Box::new(MaterializedRows {
            rows: rows.into_iter(),
        }))
    }
}

impl BackendConnection for SqliteConnection {
    fn execute_update(&mut self, sql: &str) -> BackendResult<u64> {
        let affected = self.conn.execute(sql, [])?;
        Ok(affected as u64)
    }

    fn execute_returning_id(&mut self, sql: &str) -> BackendResult<Option<i64>> {
        // last_insert_rowid is sticky: an UPDATE or DELETE leaves the key
        // of an earlier insert behind, so only report it when this
        // statement moved it. An insert that lands on the exact rowid of
        // the previous insert is indistinguishable from no insert at all;
        // callers needing that case should query the key explicitly.
        let before = self.conn.last_insert_rowid();
        let affected = self.conn.execute(sql, [])?;
        let after = self.conn.last_insert_rowid();
        if affected == 0 || after == before {
            return Ok(None);
        }
        Ok(Some(after))
    }

    fn query(&mut self, sql: &str) -> BackendResult<Box<dyn RowSource>> {
        let mut stmt = self.conn.prepare(sql)?;
        Self::collect_rows(&mut stmt, [])
    }

    fn prepare<'conn>(&'conn mut self, sql: &str) -> BackendResult<Box<dyn BoundStatement + 'conn>> {
        let stmt = self.conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement { stmt }))
    }

    fn set_autocommit(&mut self, autocommit: bool) -> BackendResult<()> {
        if autocommit {
            // COMMIT/ROLLBACK already returned the connection to
            // autocommit in the normal flow; close a leftover transaction
            // the way JDBC's setAutoCommit(true) would
            if !self.conn.is_autocommit() {
                self.conn.execute_batch("COMMIT")?;
            }
        } else if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn create_savepoint(&mut self) -> BackendResult<SavepointToken> {
        self.savepoint_seq += 1;
        let name = format!("sp_{}", self.savepoint_seq);
        self.conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        Ok(SavepointToken::new(name))
    }

    fn release_savepoint(&mut self, token: &SavepointToken) -> BackendResult<()> {
        self.conn
            .execute_batch(&format!("RELEASE SAVEPOINT {}", token.name()))?;
        Ok(())
    }

    fn rollback_to_savepoint(&mut self, token: &SavepointToken) -> BackendResult<()> {
        self.conn
            .execute_batch(&format!("ROLLBACK TO SAVEPOINT {}", token.name()))?;
        Ok(())
    }

    fn commit(&mut self) -> BackendResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> BackendResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        // rusqlite connections stay open for the lifetime of the handle
        true
    }

    fn close(&mut self) -> BackendResult<()> {
        // the underlying handle closes when dropped
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        // best-effort: do not leave a transaction open behind the handle
        if !self.conn.is_autocommit() {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}
