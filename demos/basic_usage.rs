//! Basic usage: lazy connection, inserts with key capture, queries

use dbsession::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dbsession=debug".into()),
        )
        .init();

    // no connection is opened yet
    let mut db = SqliteConnector::session(":memory:");
    println!("connected before first use: {}", db.is_connected());

    // the first statement connects transparently
    db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")?;
    println!("connected after first use: {}", db.is_connected());

    for name in ["Alice", "Bob", "Carol"] {
        db.execute_capturing_id(&format!("INSERT INTO users (name) VALUES ('{name}')"))?;
        println!("inserted {name} with id {}", db.last_generated_id());
    }

    let mut stmt = db.prepare("SELECT id, name FROM users WHERE id > ?")?;
    stmt.query(&[Value::from(1)])?.for_each(|row| {
        let id = row.get("id").and_then(Value::as_i64).unwrap_or_default();
        let name = row.get("name").and_then(Value::as_str).unwrap_or("?");
        println!("row: id={id} name={name}");
    })?;
    drop(stmt);

    db.disconnect()?;
    println!("connected after disconnect: {}", db.is_connected());

    Ok(())
}
