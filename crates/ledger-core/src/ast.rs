//! Abstract syntax tree produced by the parser.
//!
//! Each SQL statement the dialect supports maps to exactly one `Statement`
//! variant; there is no base "node" type to downcast from.

use crate::schema::Column;
use crate::value::Value;

/// A parsed SQL statement.
#[derive(Debug, Clone)]
pub enum Statement {
    CreateTable(CreateTable),
    Insert(Insert),
    Select(Select),
    Update(Update),
    Delete(Delete),
}

#[derive(Debug, Clone)]
pub struct CreateTable {
    pub table: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub table: String,
    pub values: Vec<Value>,
}

/// `*` or an explicit list of (possibly qualified) column selectors.
#[derive(Debug, Clone)]
pub enum SelectColumns {
    All,
    List(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct Select {
    pub columns: SelectColumns,
    pub table: String,
    pub where_clause: Option<WhereExpr>,
    pub joins: Vec<JoinClause>,
}

/// `[INNER] JOIN <table> ON <lhs> = <rhs>`. `lhs`/`rhs` retain whatever
/// qualification the source text used (`t.c` or bare `c`).
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub table: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone)]
pub struct Update {
    pub table: String,
    /// `SET` assignments in source order, column name -> new value.
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Option<WhereExpr>,
}

#[derive(Debug, Clone)]
pub struct Delete {
    pub table: String,
    pub where_clause: Option<WhereExpr>,
}

/// Comparison operators accepted in a WHERE condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// The WHERE tree: a tagged union of `AND`/`OR`/`CONDITION` nodes.
#[derive(Debug, Clone)]
pub enum WhereExpr {
    And(Box<WhereExpr>, Box<WhereExpr>),
    Or(Box<WhereExpr>, Box<WhereExpr>),
    Condition {
        column: String,
        op: CompareOp,
        value: Value,
    },
}
