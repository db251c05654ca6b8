//! The executor: the sole place SQL becomes an effect on persistent state.
//!
//! `Engine` owns the three caches (`SchemaManager`, `LedgerStore`,
//! `IndexManager`) and dispatches each parsed `Statement` to one
//! `execute_*` method. Every mutating path validates fully before writing
//! anything — see the per-method comments for how each one keeps the
//! ledger and indexes consistent on failure.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::ast::{CompareOp, JoinClause, SelectColumns, Statement, WhereExpr};
use crate::constraints;
use crate::error::{LedgerError, Result};
use crate::index::IndexManager;
use crate::ledger::{LedgerStore, Operation, Row};
use crate::parser::parse_sql;
use crate::schema::{SchemaManager, Table};
use crate::value::Value;

/// The result of a single `Engine::execute` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    /// A human-readable status, for CREATE/INSERT/UPDATE/DELETE.
    Message(String),
    /// The projected rows of a SELECT.
    Rows(Vec<Row>),
}

/// A row accumulating through a chain of joins.
///
/// `row` is the unqualified, right-wins-on-collision merge that `SELECT *`
/// and WHERE evaluation see (per spec §4.7.3/§4.7.6, which both operate on
/// unqualified names). `qualified` is a side-table of `table.column ->
/// value` built up as each join contributes its schema; it exists purely
/// to let a qualified projection (`SELECT a.id`) disambiguate a name that
/// collided during the merge, resolving the ambiguity the base spec left
/// open (see spec §9 / DESIGN.md).
struct WorkingRow {
    row: Row,
    qualified: HashMap<String, Value>,
}

fn seed_row(table_name: &str, row: Row) -> WorkingRow {
    let qualified = row
        .iter()
        .map(|(k, v)| (format!("{}.{}", table_name, k), v.clone()))
        .collect();
    WorkingRow { row, qualified }
}

fn combine(right_table: &str, left: &WorkingRow, right_row: &Row) -> WorkingRow {
    let mut row = left.row.clone();
    for (k, v) in right_row {
        row.insert(k.clone(), v.clone());
    }
    let mut qualified = left.qualified.clone();
    for (k, v) in right_row {
        qualified.insert(format!("{}.{}", right_table, k), v.clone());
    }
    WorkingRow { row, qualified }
}

/// Looks up a (possibly qualified) selector against an already-joined
/// working row: an exact `table.column` hit in the qualified side-table
/// wins; otherwise the selector's unqualified tail is looked up in the
/// merged row.
fn field_value<'a>(wrow: &'a WorkingRow, selector: &str) -> Option<&'a Value> {
    if let Some(v) = wrow.qualified.get(selector) {
        return Some(v);
    }
    let unqualified = selector.rsplit('.').next().unwrap_or(selector);
    wrow.row.get(unqualified)
}

/// Looks up a (possibly qualified) selector against a single plain row not
/// yet folded into a `WorkingRow` (used for the not-yet-joined side of a
/// JOIN's right table).
fn lookup_plain<'a>(row: &'a Row, table_name: &str, selector: &str) -> Option<&'a Value> {
    match selector.split_once('.') {
        Some((t, c)) if t == table_name => row.get(c),
        Some(_) => None,
        None => row.get(selector),
    }
}

/// Evaluates a WHERE tree against an unqualified row per spec §4.7.6:
/// `AND`/`OR` short-circuit, `CONDITION` fetches by unqualified column
/// name and yields `false` for all operators if the column is absent.
fn evaluate_where(row: &Row, expr: &WhereExpr) -> bool {
    match expr {
        WhereExpr::And(l, r) => evaluate_where(row, l) && evaluate_where(row, r),
        WhereExpr::Or(l, r) => evaluate_where(row, l) || evaluate_where(row, r),
        WhereExpr::Condition { column, op, value } => {
            let Some(actual) = row.get(column) else {
                return false;
            };
            match op {
                CompareOp::Eq => actual == value,
                CompareOp::Ne => actual != value,
                CompareOp::Lt => actual.partial_cmp(value) == Some(Ordering::Less),
                CompareOp::Le => matches!(
                    actual.partial_cmp(value),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                ),
                CompareOp::Gt => actual.partial_cmp(value) == Some(Ordering::Greater),
                CompareOp::Ge => matches!(
                    actual.partial_cmp(value),
                    Some(Ordering::Greater) | Some(Ordering::Equal)
                ),
            }
        }
    }
}

/// Owns the engine's in-memory caches and the ledger file; `execute` is
/// the only public entry point, matching spec §6.
pub struct Engine {
    schema: SchemaManager,
    ledger: LedgerStore,
    index: IndexManager,
}

impl Engine {
    /// Opens an engine against the ledger file at `path`, creating it if
    /// absent. Schemas start empty — they are session-scoped and must be
    /// re-declared via `CREATE TABLE` (spec §3 "Ownership and lifecycle").
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            schema: SchemaManager::new(),
            ledger: LedgerStore::open(path)?,
            index: IndexManager::new(),
        })
    }

    /// Parses and executes one SQL statement.
    pub fn execute(&mut self, sql: &str) -> Result<ExecResult> {
        let stmt = parse_sql(sql)?;
        match stmt {
            Statement::CreateTable(ct) => self.execute_create_table(ct.table, ct.columns),
            Statement::Insert(ins) => self.execute_insert(ins.table, ins.values),
            Statement::Select(sel) => self.execute_select(sel),
            Statement::Update(upd) => self.execute_update(upd),
            Statement::Delete(del) => self.execute_delete(del.table, del.where_clause),
        }
    }

    /// §4.7.1 CREATE TABLE: register the schema, write no ledger entry.
    ///
    /// If the ledger already holds entries for this table name from a
    /// prior session, this also rebuilds its indexes from `reconstruct` —
    /// otherwise the key invariant in spec §3 (index state mirrors
    /// `reconstruct` at every quiescent moment) would be false the instant
    /// a table with ledger history is re-declared. See DESIGN.md.
    fn execute_create_table(
        &mut self,
        name: String,
        columns: Vec<crate::schema::Column>,
    ) -> Result<ExecResult> {
        let table = Table::new(name, columns)?;
        self.schema.add(table.clone())?;
        let pk_name = table.primary_key_column().name.clone();
        let rows = self.ledger.reconstruct(&table.name, &pk_name)?;
        self.index.rebuild_indexes(&table, &rows);
        Ok(ExecResult::Message(format!(
            "table '{}' created",
            table.name
        )))
    }

    /// §4.7.2 INSERT: validate arity/type then PK/unique, using the index
    /// for O(1) membership checks (it already mirrors the ledger), append
    /// exactly one entry, then update the index to match.
    fn execute_insert(&mut self, table_name: String, values: Vec<Value>) -> Result<ExecResult> {
        let table = self.schema.get(&table_name)?.clone();
        let row = constraints::validate_row_types(&values, &table)?;
        constraints::validate_primary_key(&table, &row, &self.index)?;
        constraints::validate_unique_constraints(&table, &row, &self.index)?;

        let entry = self
            .ledger
            .create_entry(table.name.clone(), Operation::Insert, None, Some(row.clone()));
        self.ledger.append(&entry)?;
        self.index.add_row(&table, &row);

        Ok(ExecResult::Message("1 row inserted".to_string()))
    }

    /// §4.7.3 SELECT: reconstruct the base table, fold in each JOIN's equi
    /// match in order, filter by WHERE, then project.
    fn execute_select(&mut self, sel: crate::ast::Select) -> Result<ExecResult> {
        let table = self.schema.get(&sel.table)?.clone();
        let pk_name = table.primary_key_column().name.clone();
        let base_rows = self.ledger.reconstruct(&table.name, &pk_name)?;

        let mut working: Vec<WorkingRow> = base_rows
            .into_iter()
            .map(|r| seed_row(&table.name, r))
            .collect();

        for join in &sel.joins {
            working = self.apply_join(working, join)?;
        }

        if let Some(where_clause) = &sel.where_clause {
            working.retain(|w| evaluate_where(&w.row, where_clause));
        }

        let rows = match &sel.columns {
            SelectColumns::All => working.into_iter().map(|w| w.row).collect(),
            SelectColumns::List(cols) => working
                .iter()
                .map(|w| {
                    let mut out = Row::new();
                    for col in cols {
                        let value = field_value(w, col).cloned().ok_or_else(|| {
                            LedgerError::Schema(format!("unknown column '{}'", col))
                        })?;
                        out.insert(col.clone(), value);
                    }
                    Ok(out)
                })
                .collect::<Result<Vec<Row>>>()?,
        };

        Ok(ExecResult::Rows(rows))
    }

    fn apply_join(&mut self, working: Vec<WorkingRow>, join: &JoinClause) -> Result<Vec<WorkingRow>> {
        let right_table = self.schema.get(&join.table)?.clone();
        let right_pk = right_table.primary_key_column().name.clone();
        let right_rows = self.ledger.reconstruct(&right_table.name, &right_pk)?;

        let mut matched = Vec::new();
        for left in &working {
            let Some(lv) = field_value(left, &join.left) else {
                continue;
            };
            for right_row in &right_rows {
                let Some(rv) = lookup_plain(right_row, &right_table.name, &join.right) else {
                    continue;
                };
                if lv == rv {
                    matched.push(combine(&right_table.name, left, right_row));
                }
            }
        }
        Ok(matched)
    }

    /// §4.7.4 UPDATE: validates every candidate row's new value against a
    /// scratch copy of the index *before* writing anything, so a
    /// multi-row UPDATE is all-or-nothing — a later candidate failing
    /// validation must not leave earlier candidates half-committed (spec
    /// §4.7 "Failure semantics").
    fn execute_update(&mut self, upd: crate::ast::Update) -> Result<ExecResult> {
        let table = self.schema.get(&upd.table)?.clone();
        let pk_name = table.primary_key_column().name.clone();
        let rows = self.ledger.reconstruct(&table.name, &pk_name)?;

        let candidates: Vec<Row> = match &upd.where_clause {
            Some(w) => rows.into_iter().filter(|r| evaluate_where(r, w)).collect(),
            None => rows,
        };

        let mut scratch_index = self.index.clone();
        let mut planned: Vec<(Row, Row)> = Vec::with_capacity(candidates.len());
        for old_row in &candidates {
            let mut new_row = old_row.clone();
            for (col, value) in &upd.assignments {
                let coerced = constraints::check_update_assignment(&table, col, value)?;
                new_row.insert(col.clone(), coerced);
            }
            constraints::validate_constraints_for_update(&table, old_row, &new_row, &scratch_index)?;
            scratch_index.update_row(&table, old_row, &new_row);
            planned.push((old_row.clone(), new_row));
        }

        for (old_row, new_row) in &planned {
            let entry = self.ledger.create_entry(
                table.name.clone(),
                Operation::Update,
                Some(old_row.clone()),
                Some(new_row.clone()),
            );
            self.ledger.append(&entry)?;
            self.index.update_row(&table, old_row, new_row);
        }

        Ok(ExecResult::Message(format!(
            "{} row(s) updated",
            planned.len()
        )))
    }

    /// §4.7.5 DELETE: one ledger entry per matched row, then drop it from
    /// the indexes. No validator can fail here (removal never breaches a
    /// constraint), so unlike UPDATE there is no need for a dry-run pass.
    fn execute_delete(&mut self, table_name: String, where_clause: Option<WhereExpr>) -> Result<ExecResult> {
        let table = self.schema.get(&table_name)?.clone();
        let pk_name = table.primary_key_column().name.clone();
        let rows = self.ledger.reconstruct(&table.name, &pk_name)?;

        let matched: Vec<Row> = match &where_clause {
            Some(w) => rows.into_iter().filter(|r| evaluate_where(r, w)).collect(),
            None => rows,
        };

        for row in &matched {
            let entry = self.ledger.create_entry(
                table.name.clone(),
                Operation::Delete,
                Some(row.clone()),
                None,
            );
            self.ledger.append(&entry)?;
            self.index.remove_row(&table, row);
        }

        Ok(ExecResult::Message(format!(
            "{} row(s) deleted",
            matched.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn engine() -> (Engine, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        (Engine::open(&path).unwrap(), dir)
    }

    fn rows(result: ExecResult) -> Vec<Row> {
        match result {
            ExecResult::Rows(rows) => rows,
            other => panic!("expected Rows, got {:?}", other),
        }
    }

    #[test]
    fn scenario_insert_then_select() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
        e.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
        let got = rows(e.execute("SELECT * FROM users").unwrap());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].get("name"), Some(&Value::Text("Alice".into())));
    }

    #[test]
    fn scenario_duplicate_primary_key_rejected() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
        e.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
        assert!(e.execute("INSERT INTO users VALUES (1, 'Bob')").is_err());
        let got = rows(e.execute("SELECT * FROM users").unwrap());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].get("name"), Some(&Value::Text("Alice".into())));
    }

    #[test]
    fn scenario_unique_violation() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE u (id INT PRIMARY KEY, email TEXT UNIQUE)").unwrap();
        e.execute("INSERT INTO u VALUES (1, 'a@x')").unwrap();
        assert!(e.execute("INSERT INTO u VALUES (2, 'a@x')").is_err());
        let got = rows(e.execute("SELECT * FROM u").unwrap());
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn scenario_update() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
        e.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
        e.execute("UPDATE users SET name = 'Alice2' WHERE id = 1").unwrap();
        let got = rows(e.execute("SELECT name FROM users WHERE id = 1").unwrap());
        assert_eq!(got[0].get("name"), Some(&Value::Text("Alice2".into())));
    }

    #[test]
    fn scenario_mixed_and_or_where() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE p (id INT PRIMARY KEY, price FLOAT)").unwrap();
        e.execute("INSERT INTO p VALUES (1, 10)").unwrap();
        e.execute("INSERT INTO p VALUES (2, 25)").unwrap();
        e.execute("INSERT INTO p VALUES (3, 15)").unwrap();
        let got = rows(e
            .execute("SELECT * FROM p WHERE price > 12 AND price < 20 OR price < 10")
            .unwrap());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].get("price"), Some(&Value::Float(15.0)));
    }

    #[test]
    fn scenario_cross_session_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");
        {
            let mut e = Engine::open(&path).unwrap();
            e.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
            e.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
            e.execute("INSERT INTO users VALUES (2, 'Bob')").unwrap();
        }
        let mut e2 = Engine::open(&path).unwrap();
        e2.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
        let got = rows(e2.execute("SELECT * FROM users").unwrap());
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn equi_join_merges_right_wins_on_collision() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE a (id INT PRIMARY KEY, tag TEXT)").unwrap();
        e.execute("CREATE TABLE b (id INT PRIMARY KEY, a_id INT, tag TEXT)").unwrap();
        e.execute("INSERT INTO a VALUES (1, 'left')").unwrap();
        e.execute("INSERT INTO b VALUES (10, 1, 'right')").unwrap();
        let got = rows(e
            .execute("SELECT * FROM a JOIN b ON a.id = b.a_id")
            .unwrap());
        assert_eq!(got.len(), 1);
        // collision on "tag": right (b) wins in the merged row.
        assert_eq!(got[0].get("tag"), Some(&Value::Text("right".into())));
    }

    #[test]
    fn qualified_projection_disambiguates_collision() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE a (id INT PRIMARY KEY, tag TEXT)").unwrap();
        e.execute("CREATE TABLE b (id INT PRIMARY KEY, a_id INT, tag TEXT)").unwrap();
        e.execute("INSERT INTO a VALUES (1, 'left')").unwrap();
        e.execute("INSERT INTO b VALUES (10, 1, 'right')").unwrap();
        let got = rows(e
            .execute("SELECT a.tag, b.tag FROM a JOIN b ON a.id = b.a_id")
            .unwrap());
        assert_eq!(got[0].get("a.tag"), Some(&Value::Text("left".into())));
        assert_eq!(got[0].get("b.tag"), Some(&Value::Text("right".into())));
    }

    #[test]
    fn update_is_atomic_across_candidates() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE u (id INT PRIMARY KEY, email TEXT UNIQUE)").unwrap();
        e.execute("INSERT INTO u VALUES (1, 'a@x')").unwrap();
        e.execute("INSERT INTO u VALUES (2, 'b@x')").unwrap();
        // Setting both to the same email is a unique violation on the
        // second candidate; the first candidate's write must not survive.
        assert!(e.execute("UPDATE u SET email = 'same@x' WHERE id = 1 OR id = 2").is_err());
        let got = rows(e.execute("SELECT * FROM u").unwrap());
        let emails: Vec<_> = got.iter().map(|r| r.get("email").unwrap().to_string()).collect();
        assert!(emails.contains(&"a@x".to_string()));
        assert!(emails.contains(&"b@x".to_string()));
    }

    #[test]
    fn set_with_failed_coercion_is_type_error_not_silent_keep() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE p (id INT PRIMARY KEY, price FLOAT)").unwrap();
        e.execute("INSERT INTO p VALUES (1, 10)").unwrap();
        assert!(e.execute("UPDATE p SET price = 'oops' WHERE id = 1").is_err());
        let got = rows(e.execute("SELECT * FROM p WHERE id = 1").unwrap());
        assert_eq!(got[0].get("price"), Some(&Value::Float(10.0)));
    }

    #[test]
    fn delete_removes_matched_rows() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT)").unwrap();
        e.execute("INSERT INTO users VALUES (1, 'Alice')").unwrap();
        e.execute("INSERT INTO users VALUES (2, 'Bob')").unwrap();
        let msg = e.execute("DELETE FROM users WHERE id = 1").unwrap();
        assert_eq!(msg, ExecResult::Message("1 row(s) deleted".to_string()));
        let got = rows(e.execute("SELECT * FROM users").unwrap());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].get("name"), Some(&Value::Text("Bob".into())));
    }

    #[test]
    fn multiple_nulls_permitted_in_unique_column() {
        let (mut e, _dir) = engine();
        e.execute("CREATE TABLE u (id INT PRIMARY KEY, email TEXT UNIQUE)").unwrap();
        e.execute("INSERT INTO u VALUES (1, NULL)").unwrap();
        e.execute("INSERT INTO u VALUES (2, NULL)").unwrap();
        let got = rows(e.execute("SELECT * FROM u").unwrap());
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn unknown_table_is_schema_error() {
        let (mut e, _dir) = engine();
        assert!(matches!(
            e.execute("SELECT * FROM ghosts").unwrap_err(),
            LedgerError::Schema(_)
        ));
    }
}
