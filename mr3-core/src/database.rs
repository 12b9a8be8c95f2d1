//! SQLite storage for parsed records.

use crate::error::Result;
use crate::sql::SqlRow;
use rusqlite::{Connection, params_from_iter};
use rusqlite_migration::{M, Migrations};
use std::path::Path;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS Attack (
        AttackID INTEGER PRIMARY KEY,
        DerivationId INTEGER NOT NULL,
        Attack TEXT NOT NULL,
        StatUsed TEXT NOT NULL,
        AttackType TEXT NOT NULL,
        ItemRequired TEXT NOT NULL,
        GutsUsed INTEGER NOT NULL,
        Damage INTEGER NOT NULL,
        GutsDown INTEGER NOT NULL,
        Critical INTEGER NOT NULL,
        Hit INTEGER NOT NULL,
        MaxLevel INTEGER NOT NULL,
        AttackRange TEXT NOT NULL,
        Growth TEXT NOT NULL,
        Effect TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS Characteristic (
        CharacteristicID INTEGER PRIMARY KEY,
        Characteristic TEXT NOT NULL,
        Description TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS Monster (
        MonsterID INTEGER PRIMARY KEY,
        Monster TEXT NOT NULL,
        DerivationID INTEGER NOT NULL,
        RegionID INTEGER NOT NULL,
        Description TEXT NOT NULL
    );
"#;

/// SQLite target for parsed records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file and bring its schema up to date.
    pub fn new(path: &Path) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        let migrations = Migrations::new(vec![M::up(SCHEMA)]);
        migrations.to_latest(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert rows in a single transaction. Returns the number inserted.
    pub fn insert_rows<T: SqlRow>(&mut self, rows: &[T]) -> Result<usize> {
        let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                stmt.execute(params_from_iter(row.values()))?;
            }
        }
        tx.commit()?;

        tracing::info!("Inserted {} rows into {}", rows.len(), T::TABLE);
        Ok(rows.len())
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}
