//! Recursive-descent parser: token stream to AST.

use crate::ast::{
    CompareOp, CreateTable, Delete, Insert, JoinClause, Select, SelectColumns, Statement, Update,
    WhereExpr,
};
use crate::error::{LedgerError, Result};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::schema::Column;
use crate::value::{DataType, Value};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        // `tokenize` always appends a trailing Eof, so this never runs past the end.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, message: impl Into<String>) -> LedgerError {
        let tok = self.current();
        LedgerError::Parse {
            message: message.into(),
            line: tok.line,
            column: tok.column,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            let got = self.current().text.clone();
            let got = if got.is_empty() {
                "EOF".to_string()
            } else {
                got
            };
            Err(self.err(format!("expected {:?}, got '{}'", kind, got)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        self.expect(TokenKind::Identifier).map(|t| t.text)
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = match self.current().kind {
            TokenKind::Create => Statement::CreateTable(self.parse_create_table()?),
            TokenKind::Insert => Statement::Insert(self.parse_insert()?),
            TokenKind::Select => Statement::Select(self.parse_select()?),
            TokenKind::Update => Statement::Update(self.parse_update()?),
            TokenKind::Delete => Statement::Delete(self.parse_delete()?),
            TokenKind::Eof => return Err(self.err("empty input")),
            _ => {
                let got = self.current().text.clone();
                return Err(self.err(format!("unexpected statement start '{}'", got)));
            }
        };
        Ok(stmt)
    }

    fn optional_semicolon(&mut self) {
        if self.current().kind == TokenKind::Semicolon {
            self.advance();
        }
    }

    fn data_type_from_current(&mut self) -> Result<DataType> {
        let tok = self.current().clone();
        let dt = match tok.kind {
            TokenKind::Int => Some(DataType::Int),
            TokenKind::Text => Some(DataType::Text),
            TokenKind::Float => Some(DataType::Float),
            TokenKind::Boolean => Some(DataType::Boolean),
            TokenKind::Timestamp => Some(DataType::Timestamp),
            TokenKind::Identifier => DataType::from_keyword(&tok.text),
            _ => None,
        };
        match dt {
            Some(dt) => {
                self.advance();
                Ok(dt)
            }
            None => Err(self.err(format!("expected a data type, got '{}'", tok.text))),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTable> {
        self.expect(TokenKind::Create)?;
        self.expect(TokenKind::Table)?;
        let table = self.expect_identifier()?;
        self.expect(TokenKind::LeftParen)?;

        let mut columns = Vec::new();
        loop {
            let col_name = self.expect_identifier()?;
            let data_type = self.data_type_from_current()?;

            let mut is_primary_key = false;
            let mut is_unique = false;
            loop {
                match self.current().kind {
                    TokenKind::Primary => {
                        self.advance();
                        self.expect(TokenKind::Key)?;
                        is_primary_key = true;
                    }
                    TokenKind::Unique => {
                        self.advance();
                        is_unique = true;
                    }
                    TokenKind::Comma | TokenKind::RightParen => break,
                    _ => {
                        let got = self.current().text.clone();
                        return Err(self.err(format!("unexpected token in column definition '{}'", got)));
                    }
                }
            }

            let mut column = Column::new(col_name, data_type);
            if is_primary_key {
                column = column.primary_key();
            }
            if is_unique {
                column = column.unique();
            }
            columns.push(column);

            if self.current().kind == TokenKind::RightParen {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        self.expect(TokenKind::RightParen)?;
        self.optional_semicolon();

        Ok(CreateTable { table, columns })
    }

    fn parse_value(&mut self) -> Result<Value> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::String => {
                self.advance();
                Ok(Value::Text(tok.text))
            }
            TokenKind::Number => {
                self.advance();
                if tok.text.contains('.') {
                    let f: f64 = tok
                        .text
                        .parse()
                        .map_err(|_| self.err(format!("invalid number literal '{}'", tok.text)))?;
                    Ok(Value::Float(f))
                } else {
                    let i: i64 = tok
                        .text
                        .parse()
                        .map_err(|_| self.err(format!("invalid number literal '{}'", tok.text)))?;
                    Ok(Value::Int(i))
                }
            }
            TokenKind::Null => {
                self.advance();
                Ok(Value::Null)
            }
            _ => Err(self.err(format!("unexpected value token '{}'", tok.text))),
        }
    }

    fn parse_insert(&mut self) -> Result<Insert> {
        self.expect(TokenKind::Insert)?;
        self.expect(TokenKind::Into)?;
        let table = self.expect_identifier()?;
        self.expect(TokenKind::Values)?;
        self.expect(TokenKind::LeftParen)?;

        let mut values = Vec::new();
        loop {
            values.push(self.parse_value()?);
            if self.current().kind == TokenKind::RightParen {
                break;
            }
            self.expect(TokenKind::Comma)?;
        }
        self.expect(TokenKind::RightParen)?;
        self.optional_semicolon();

        Ok(Insert { table, values })
    }

    /// Parses a bare or qualified identifier (`t.c` or `c`), returning the
    /// full source spelling (including the dot, if present).
    fn parse_maybe_qualified_identifier(&mut self) -> Result<String> {
        let first = self.expect_identifier()?;
        if self.current().kind == TokenKind::Dot {
            self.advance();
            let second = self.expect_identifier()?;
            Ok(format!("{}.{}", first, second))
        } else {
            Ok(first)
        }
    }

    fn parse_select(&mut self) -> Result<Select> {
        self.expect(TokenKind::Select)?;

        let columns = if self.current().kind == TokenKind::Asterisk {
            self.advance();
            SelectColumns::All
        } else {
            let mut cols = Vec::new();
            loop {
                cols.push(self.parse_maybe_qualified_identifier()?);
                if self.current().kind != TokenKind::Comma {
                    break;
                }
                self.advance();
            }
            SelectColumns::List(cols)
        };

        self.expect(TokenKind::From)?;
        let table = self.expect_identifier()?;

        let where_clause = if self.current().kind == TokenKind::Where {
            Some(self.parse_where_clause()?)
        } else {
            None
        };

        let mut joins = Vec::new();
        while matches!(self.current().kind, TokenKind::Inner | TokenKind::Join) {
            joins.push(self.parse_join()?);
        }

        self.optional_semicolon();

        Ok(Select {
            columns,
            table,
            where_clause,
            joins,
        })
    }

    fn parse_join(&mut self) -> Result<JoinClause> {
        if self.current().kind == TokenKind::Inner {
            self.advance();
        }
        self.expect(TokenKind::Join)?;
        let table = self.expect_identifier()?;
        self.expect(TokenKind::On)?;
        let left = self.parse_maybe_qualified_identifier()?;
        self.expect(TokenKind::Eq)?;
        let right = self.parse_maybe_qualified_identifier()?;
        Ok(JoinClause { table, left, right })
    }

    fn parse_where_clause(&mut self) -> Result<WhereExpr> {
        self.expect(TokenKind::Where)?;
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<WhereExpr> {
        let mut left = self.parse_and_expr()?;
        while self.current().kind == TokenKind::Or {
            self.advance();
            let right = self.parse_and_expr()?;
            left = WhereExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<WhereExpr> {
        let mut left = self.parse_condition()?;
        while self.current().kind == TokenKind::And {
            self.advance();
            let right = self.parse_condition()?;
            left = WhereExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_condition(&mut self) -> Result<WhereExpr> {
        let column = self.expect_identifier()?;
        let op = match self.current().kind {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::Ne => CompareOp::Ne,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Le => CompareOp::Le,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Ge => CompareOp::Ge,
            _ => {
                let got = self.current().text.clone();
                return Err(self.err(format!("unsupported operator in WHERE clause '{}'", got)));
            }
        };
        self.advance();
        let value = self.parse_value()?;
        Ok(WhereExpr::Condition { column, op, value })
    }

    fn parse_update(&mut self) -> Result<Update> {
        self.expect(TokenKind::Update)?;
        let table = self.expect_identifier()?;
        self.expect(TokenKind::Set)?;

        let mut assignments = Vec::new();
        loop {
            let col = self.expect_identifier()?;
            self.expect(TokenKind::Eq)?;
            let value = self.parse_value()?;
            assignments.push((col, value));
            if self.current().kind != TokenKind::Comma {
                break;
            }
            self.advance();
        }

        let where_clause = if self.current().kind == TokenKind::Where {
            Some(self.parse_where_clause()?)
        } else {
            None
        };
        self.optional_semicolon();

        Ok(Update {
            table,
            assignments,
            where_clause,
        })
    }

    fn parse_delete(&mut self) -> Result<Delete> {
        self.expect(TokenKind::Delete)?;
        self.expect(TokenKind::From)?;
        let table = self.expect_identifier()?;

        let where_clause = if self.current().kind == TokenKind::Where {
            Some(self.parse_where_clause()?)
        } else {
            None
        };
        self.optional_semicolon();

        Ok(Delete { table, where_clause })
    }

    /// Peek helper retained for symmetry with the grammar in spec §4.2
    /// (`a.b` lookahead needs one token of peek beyond the current one).
    #[allow(dead_code)]
    fn peek_is_dot(&self) -> bool {
        self.peek(1).map(|t| t.kind) == Some(TokenKind::Dot)
    }
}

/// Parse a single SQL statement string into an AST node.
pub fn parse_sql(sql: &str) -> Result<Statement> {
    let tokens = tokenize(sql)?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}
