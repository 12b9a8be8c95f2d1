//! SQL `INSERT` rendering for parsed records.

use crate::error::Result;
use crate::models::{Attack, Characteristic, Monster};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::Serialize;
use std::fmt;

/// A single literal in a VALUES tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Int(n) => write!(f, "{}", n),
            SqlValue::Text(s) => write!(f, "{}", quote(s)),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Int(n) => n.to_sql(),
            SqlValue::Text(s) => s.to_sql(),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        SqlValue::Int(n.into())
    }
}

impl From<u32> for SqlValue {
    fn from(n: u32) -> Self {
        SqlValue::Int(n.into())
    }
}

/// Quote a string as a SQL literal, doubling embedded single quotes.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// A record that maps onto one row of a table.
pub trait SqlRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Values in `COLUMNS` order.
    fn values(&self) -> Vec<SqlValue>;

    /// Parenthesized, comma-joined literal tuple.
    fn tuple(&self) -> String {
        let values: Vec<String> = self.values().iter().map(ToString::to_string).collect();
        format!("({})", values.join(", "))
    }
}

impl SqlRow for Attack {
    const TABLE: &'static str = "Attack";
    const COLUMNS: &'static [&'static str] = &[
        "DerivationId",
        "Attack",
        "StatUsed",
        "AttackType",
        "ItemRequired",
        "GutsUsed",
        "Damage",
        "GutsDown",
        "Critical",
        "Hit",
        "MaxLevel",
        "AttackRange",
        "Growth",
        "Effect",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.derivation_id.into(),
            self.name.as_str().into(),
            self.stat_used.as_str().into(),
            self.attack_type.as_str().into(),
            self.item_required.as_str().into(),
            self.guts_used.into(),
            self.damage.into(),
            self.guts_down.into(),
            self.critical_chance.into(),
            self.hit_chance.into(),
            self.max_level.into(),
            self.range.as_str().into(),
            self.growth.as_str().into(),
            self.effect.as_str().into(),
        ]
    }
}

impl SqlRow for Characteristic {
    const TABLE: &'static str = "Characteristic";
    const COLUMNS: &'static [&'static str] = &["Characteristic", "Description"];

    fn values(&self) -> Vec<SqlValue> {
        vec![self.name.as_str().into(), self.description.as_str().into()]
    }
}

impl SqlRow for Monster {
    const TABLE: &'static str = "Monster";
    const COLUMNS: &'static [&'static str] = &["Monster", "DerivationID", "RegionID", "Description"];

    fn values(&self) -> Vec<SqlValue> {
        // Wiki transcriptions wrap the in-game text in double quotes
        let description = self.description.trim().trim_matches('"');
        vec![
            self.species.as_str().into(),
            self.derivation_id.into(),
            self.region_id.into(),
            description.into(),
        ]
    }
}

/// Render all rows as one `INSERT INTO ... VALUES ...;` statement.
///
/// An empty slice renders as a comment, since `VALUES` with no tuples is not valid SQL.
pub fn render_insert<T: SqlRow>(rows: &[T]) -> String {
    if rows.is_empty() {
        return format!("-- no rows for {}", T::TABLE);
    }

    let tuples: Vec<String> = rows.iter().map(SqlRow::tuple).collect();
    format!(
        "INSERT INTO {} ({}) VALUES\n\t{};",
        T::TABLE,
        T::COLUMNS.join(", "),
        tuples.join(",\n\t")
    )
}

/// Pretty-printed JSON array of the records, field values unescaped.
pub fn render_json<T: Serialize>(rows: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
