//! Table schema model and the in-memory schema registry.

use std::collections::HashMap;

use crate::error::{LedgerError, Result};
use crate::value::DataType;

/// A single column definition.
///
/// A primary-key column is implicitly unique; setting `is_unique` on it is a
/// no-op rather than an error (constraint checks only ever consult
/// `is_primary_key` for PK enforcement and skip PK columns in the unique
/// pass — see `constraints.rs`).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub is_primary_key: bool,
    pub is_unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_primary_key: false,
            is_unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

/// A table's schema: name plus ordered columns.
///
/// Column order is the canonical insertion order used by positional
/// `INSERT ... VALUES(...)`.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    /// Construct a table, enforcing the schema invariants from spec §3:
    /// non-empty name, at least one column, exactly one primary key, and
    /// pairwise-distinct (case-sensitive) column names.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LedgerError::Schema("table name cannot be empty".into()));
        }
        if columns.is_empty() {
            return Err(LedgerError::Schema(
                "table must have at least one column".into(),
            ));
        }
        let pk_count = columns.iter().filter(|c| c.is_primary_key).count();
        if pk_count == 0 {
            return Err(LedgerError::Schema(
                "table must have a primary key".into(),
            ));
        }
        if pk_count > 1 {
            return Err(LedgerError::Schema(
                "table can have at most one primary key".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for col in &columns {
            if col.name.is_empty() {
                return Err(LedgerError::Schema("column name cannot be empty".into()));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(LedgerError::Schema(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { name, columns })
    }

    pub fn primary_key_column(&self) -> &Column {
        self.columns
            .iter()
            .find(|c| c.is_primary_key)
            .expect("Table::new guarantees exactly one primary key column")
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Process-local registry of table schemas.
///
/// Session-scoped: schemas are never persisted and must be re-declared on
/// every fresh process (see spec §3 "Ownership and lifecycle").
#[derive(Debug, Default)]
pub struct SchemaManager {
    tables: HashMap<String, Table>,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(&table.name) {
            return Err(LedgerError::Schema(format!(
                "table '{}' already exists",
                table.name
            )));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| LedgerError::Schema(format!("table '{}' does not exist", name)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn list(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }

    pub fn remove(&mut self, name: &str) -> Result<Table> {
        self.tables
            .remove(name)
            .ok_or_else(|| LedgerError::Schema(format!("table '{}' does not exist", name)))
    }

    pub fn get_all(&self) -> Vec<&Table> {
        self.tables.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_table() -> Table {
        Table::new(
            "users",
            vec![
                Column::new("id", DataType::Int).primary_key(),
                Column::new("name", DataType::Text),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_name() {
        let err = Table::new("", vec![Column::new("id", DataType::Int).primary_key()]);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_no_columns() {
        assert!(Table::new("t", vec![]).is_err());
    }

    #[test]
    fn rejects_missing_primary_key() {
        let cols = vec![Column::new("name", DataType::Text)];
        assert!(Table::new("t", cols).is_err());
    }

    #[test]
    fn rejects_two_primary_keys() {
        let cols = vec![
            Column::new("a", DataType::Int).primary_key(),
            Column::new("b", DataType::Int).primary_key(),
        ];
        assert!(Table::new("t", cols).is_err());
    }

    #[test]
    fn rejects_duplicate_column_names() {
        let cols = vec![
            Column::new("id", DataType::Int).primary_key(),
            Column::new("id", DataType::Text),
        ];
        assert!(Table::new("t", cols).is_err());
    }

    #[test]
    fn schema_manager_add_get_remove() {
        let mut mgr = SchemaManager::new();
        mgr.add(users_table()).unwrap();
        assert!(mgr.exists("users"));
        assert!(mgr.add(users_table()).is_err());
        assert!(mgr.get("users").is_ok());
        assert!(mgr.get("missing").is_err());
        mgr.remove("users").unwrap();
        assert!(!mgr.exists("users"));
        assert!(mgr.remove("users").is_err());
    }
}
