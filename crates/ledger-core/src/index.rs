//! In-memory index cache: O(1) primary-key and unique-column membership
//! checks, rebuildable at any time from the ledger via `rebuild_indexes`.
//!
//! Indexes never hold information the ledger doesn't already contain —
//! losing this module entirely and linearly scanning `reconstruct` output
//! would still produce correct results, only slower.

use std::collections::HashMap;

use crate::ledger::Row;
use crate::schema::Table;

/// Per-table index state: a primary-key map plus one map per unique
/// (non-PK) column. Values are keyed by their `Display` form since `Value`
/// itself isn't hashable.
#[derive(Debug, Default, Clone)]
struct TableIndex {
    primary_key: HashMap<String, Row>,
    unique: HashMap<String, HashMap<String, Row>>,
}

/// Tracks, per table, which primary-key and unique-column values are
/// currently in use.
///
/// Cheaply `Clone`-able so the executor can take a scratch copy to
/// dry-run a multi-row `UPDATE`'s constraint checks before committing
/// any of it (see `executor::Engine::execute_update`).
#[derive(Debug, Default, Clone)]
pub struct IndexManager {
    tables: HashMap<String, TableIndex>,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_for(&mut self, table_name: &str) -> &mut TableIndex {
        self.tables.entry(table_name.to_string()).or_default()
    }

    /// Index a newly-inserted row.
    pub fn add_row(&mut self, table: &Table, row: &Row) {
        let pk_col = table.primary_key_column();
        let pk_value = row.get(&pk_col.name).map(|v| v.to_string());
        let unique_columns: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.is_unique && !c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();

        let index = self.entry_for(&table.name);
        if let Some(pk_value) = pk_value {
            index.primary_key.insert(pk_value, row.clone());
        }
        for col_name in unique_columns {
            if let Some(value) = row.get(&col_name).filter(|v| !v.is_null()).map(|v| v.to_string()) {
                index
                    .unique
                    .entry(col_name)
                    .or_default()
                    .insert(value, row.clone());
            }
        }
    }

    /// Re-index a row whose values changed, moving it from `old_row`'s
    /// key to `new_row`'s key in every affected index.
    pub fn update_row(&mut self, table: &Table, old_row: &Row, new_row: &Row) {
        let pk_col = table.primary_key_column();
        let old_pk = old_row.get(&pk_col.name).map(|v| v.to_string());
        let new_pk = new_row.get(&pk_col.name).map(|v| v.to_string());
        let unique_columns: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.is_unique && !c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();

        let index = self.entry_for(&table.name);
        if let Some(old_pk) = old_pk {
            index.primary_key.remove(&old_pk);
        }
        if let Some(new_pk) = new_pk {
            index.primary_key.insert(new_pk, new_row.clone());
        }

        for col_name in unique_columns {
            let old_value = old_row.get(&col_name).filter(|v| !v.is_null()).map(|v| v.to_string());
            let new_value = new_row.get(&col_name).filter(|v| !v.is_null()).map(|v| v.to_string());
            let column_index = index.unique.entry(col_name).or_default();
            if let Some(old_value) = old_value {
                column_index.remove(&old_value);
            }
            if let Some(new_value) = new_value {
                column_index.insert(new_value, new_row.clone());
            }
        }
    }

    /// Remove a deleted row from every index.
    pub fn remove_row(&mut self, table: &Table, row: &Row) {
        let pk_col = table.primary_key_column();
        let pk_value = row.get(&pk_col.name).map(|v| v.to_string());
        let unique_columns: Vec<String> = table
            .columns
            .iter()
            .filter(|c| c.is_unique && !c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();

        let index = self.entry_for(&table.name);
        if let Some(pk_value) = pk_value {
            index.primary_key.remove(&pk_value);
        }
        for col_name in unique_columns {
            if let Some(value) = row.get(&col_name).filter(|v| !v.is_null()).map(|v| v.to_string()) {
                if let Some(column_index) = index.unique.get_mut(&col_name) {
                    column_index.remove(&value);
                }
            }
        }
    }

    /// Whether `primary_key_value`'s display form is already present for
    /// `table_name`.
    pub fn primary_key_exists(&self, table_name: &str, primary_key_value: &str) -> bool {
        self.tables
            .get(table_name)
            .map(|idx| idx.primary_key.contains_key(primary_key_value))
            .unwrap_or(false)
    }

    /// Whether `value`'s display form is already present in the named
    /// unique column's index.
    pub fn unique_value_exists(&self, table_name: &str, column_name: &str, value: &str) -> bool {
        self.tables
            .get(table_name)
            .and_then(|idx| idx.unique.get(column_name))
            .map(|col| col.contains_key(value))
            .unwrap_or(false)
    }

    /// Drop and rebuild every index for `table` from `rows` — used after
    /// reconstructing a table's state from the ledger (e.g. on engine
    /// startup or after a bulk reload).
    pub fn rebuild_indexes(&mut self, table: &Table, rows: &[Row]) {
        self.tables.remove(&table.name);
        for row in rows {
            self.add_row(table, row);
        }
    }
}
