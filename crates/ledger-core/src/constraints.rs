//! Constraint validation: arity/type checks, then primary-key uniqueness,
//! then unique-column uniqueness — all run before anything is written to
//! the ledger, so a rejected statement leaves no trace behind.

use crate::error::{LedgerError, Result};
use crate::index::IndexManager;
use crate::ledger::Row;
use crate::schema::Table;
use crate::value::Value;

/// Checks a positional `VALUES (...)` list against `table`'s columns:
/// correct arity, each value assignable to its column's type, and the
/// primary key non-null. Returns the coerced row on success.
///
/// This is the INSERT-path type check; `check_update_assignment` handles
/// the narrower SET-clause case.
pub fn validate_row_types(values: &[Value], table: &Table) -> Result<Row> {
    if values.len() != table.columns.len() {
        return Err(LedgerError::Type(format!(
            "expected {} values, got {}",
            table.columns.len(),
            values.len()
        )));
    }

    let mut row = Row::new();
    for (column, value) in table.columns.iter().zip(values.iter()) {
        if value.is_null() && column.is_primary_key {
            return Err(LedgerError::Constraint(format!(
                "primary key column '{}' cannot be NULL",
                column.name
            )));
        }
        let coerced = value
            .coerce(column.data_type)
            .map_err(|msg| LedgerError::Type(format!("column '{}': {}", column.name, msg)))?;
        row.insert(column.name.clone(), coerced);
    }
    Ok(row)
}

/// Coerces a single `SET column = value` assignment to its column's type.
/// A coercion failure is a hard error — the original value is never
/// silently retained.
pub fn check_update_assignment(table: &Table, column_name: &str, value: &Value) -> Result<Value> {
    let column = table.get_column(column_name).ok_or_else(|| {
        LedgerError::Schema(format!(
            "column '{}' does not exist on table '{}'",
            column_name, table.name
        ))
    })?;
    if value.is_null() && column.is_primary_key {
        return Err(LedgerError::Constraint(format!(
            "primary key column '{}' cannot be NULL",
            column.name
        )));
    }
    value
        .coerce(column.data_type)
        .map_err(|msg| LedgerError::Type(format!("column '{}': {}", column.name, msg)))
}

/// Validates that `row`'s primary key is present and not already indexed.
pub fn validate_primary_key(table: &Table, row: &Row, index: &IndexManager) -> Result<()> {
    let pk_col = table.primary_key_column();
    let pk_value = row.get(&pk_col.name);
    let Some(pk_value) = pk_value else {
        return Err(LedgerError::Constraint(format!(
            "primary key column '{}' cannot be NULL",
            pk_col.name
        )));
    };
    if pk_value.is_null() {
        return Err(LedgerError::Constraint(format!(
            "primary key column '{}' cannot be NULL",
            pk_col.name
        )));
    }
    if index.primary_key_exists(&table.name, &pk_value.to_string()) {
        return Err(LedgerError::Constraint(format!(
            "primary key violation: value {} already exists",
            pk_value
        )));
    }
    Ok(())
}

/// Validates every non-PK unique column of `row` against the current
/// index. NULL values are exempt (a unique column may hold many NULLs).
pub fn validate_unique_constraints(table: &Table, row: &Row, index: &IndexManager) -> Result<()> {
    for column in &table.columns {
        if !column.is_unique || column.is_primary_key {
            continue;
        }
        let Some(value) = row.get(&column.name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if index.unique_value_exists(&table.name, &column.name, &value.to_string()) {
            return Err(LedgerError::Constraint(format!(
                "unique constraint violation on column '{}': value {} already exists",
                column.name, value
            )));
        }
    }
    Ok(())
}

/// Validates an UPDATE's constraints: the primary key is only re-checked
/// if it actually changed, and unique columns are only re-checked for
/// those whose value actually changed — an UPDATE that leaves a unique
/// value untouched never collides with itself.
pub fn validate_constraints_for_update(
    table: &Table,
    old_row: &Row,
    new_row: &Row,
    index: &IndexManager,
) -> Result<()> {
    let pk_col = table.primary_key_column();
    let old_pk = old_row.get(&pk_col.name);
    let new_pk = new_row.get(&pk_col.name);
    if old_pk != new_pk {
        validate_primary_key(table, new_row, index)?;
    }

    for column in &table.columns {
        if !column.is_unique || column.is_primary_key {
            continue;
        }
        let old_value = old_row.get(&column.name);
        let new_value = new_row.get(&column.name);
        if old_value != new_value {
            if let Some(new_value) = new_value {
                if !new_value.is_null()
                    && index.unique_value_exists(&table.name, &column.name, &new_value.to_string())
                {
                    return Err(LedgerError::Constraint(format!(
                        "unique constraint violation on column '{}': value {} already exists",
                        column.name, new_value
                    )));
                }
            }
        }
    }
    Ok(())
}
