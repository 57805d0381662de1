//! Nested transactions over a flat transaction plus savepoints

use dbsession::prelude::*;

fn count(db: &mut Session) -> Result<i64> {
    let mut n = 0;
    db.query("SELECT COUNT(*) AS n FROM accounts")?
        .for_each(|row| {
            n = row.get("n").and_then(Value::as_i64).unwrap_or_default();
        })?;
    Ok(n)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbsession=debug".into()),
        )
        .init();

    let mut db = SqliteConnector::session(":memory:");
    db.execute("CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance REAL)")?;

    db.begin_transaction()?;
    db.execute("INSERT INTO accounts (balance) VALUES (100.0)")?;
    println!("depth {} after outer insert", db.transaction_depth());

    // inner level: undone without losing the outer insert
    db.begin_transaction()?;
    db.execute("INSERT INTO accounts (balance) VALUES (-50.0)")?;
    println!("rows inside inner level: {}", count(&mut db)?);
    db.rollback_transaction()?;
    println!("rows after inner rollback: {}", count(&mut db)?);

    // inner level again: merged into the outer transaction
    db.begin_transaction()?;
    db.execute("INSERT INTO accounts (balance) VALUES (25.0)")?;
    db.commit_transaction()?;

    // nothing persists until the outermost level commits
    db.commit_transaction()?;
    println!("rows after outer commit: {}", count(&mut db)?);

    Ok(())
}
