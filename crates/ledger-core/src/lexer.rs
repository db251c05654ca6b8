//! SQL text to token stream.

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Create,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Update,
    Set,
    Delete,
    Join,
    Inner,
    On,
    Int,
    Text,
    Float,
    Boolean,
    Timestamp,
    Primary,
    Key,
    Unique,
    And,
    Or,
    Null,

    // Literals
    Identifier,
    String,
    Number,

    // Operators
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Punctuation
    Semicolon,
    Comma,
    LeftParen,
    RightParen,
    Dot,
    Asterisk,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

fn keyword(upper: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match upper {
        "CREATE" => Create,
        "TABLE" => Table,
        "INSERT" => Insert,
        "INTO" => Into,
        "VALUES" => Values,
        "SELECT" => Select,
        "FROM" => From,
        "WHERE" => Where,
        "UPDATE" => Update,
        "SET" => Set,
        "DELETE" => Delete,
        "JOIN" => Join,
        "INNER" => Inner,
        "ON" => On,
        "INT" => Int,
        "TEXT" => Text,
        "FLOAT" => Float,
        "BOOLEAN" => Boolean,
        "TIMESTAMP" => Timestamp,
        "PRIMARY" => Primary,
        "KEY" => Key,
        "UNIQUE" => Unique,
        "AND" => And,
        "OR" => Or,
        "NULL" => Null,
        _ => return None,
    })
}

/// SQL lexer/tokenizer, tracking line/column for diagnostics.
pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    _source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            _source: source,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += 1;
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.current() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_number(&mut self) -> String {
        let start = self.pos;
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.current() == Some('.') {
            self.advance();
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<String> {
        let quote = self.current().unwrap();
        self.advance();
        let mut value = String::new();
        loop {
            match self.current() {
                None => {
                    return Err(LedgerError::Parse {
                        message: "unterminated string literal".into(),
                        line,
                        column,
                    })
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        Some('\'') => {
                            value.push('\'');
                            self.advance();
                        }
                        Some('"') => {
                            value.push('"');
                            self.advance();
                        }
                        Some('n') => {
                            value.push('\n');
                            self.advance();
                        }
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                            self.advance();
                        }
                        None => {
                            return Err(LedgerError::Parse {
                                message: "unterminated string literal".into(),
                                line,
                                column,
                            })
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        Ok(value)
    }

    /// Tokenize the full input, always ending with a single `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (line, column) = (self.line, self.column);
            let Some(c) = self.current() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    line,
                    column,
                });
                break;
            };

            macro_rules! single {
                ($kind:expr, $text:expr) => {{
                    self.advance();
                    tokens.push(Token {
                        kind: $kind,
                        text: $text.to_string(),
                        line,
                        column,
                    });
                }};
            }

            match c {
                ';' => single!(TokenKind::Semicolon, ";"),
                ',' => single!(TokenKind::Comma, ","),
                '(' => single!(TokenKind::LeftParen, "("),
                ')' => single!(TokenKind::RightParen, ")"),
                '.' => single!(TokenKind::Dot, "."),
                '*' => single!(TokenKind::Asterisk, "*"),
                '=' => single!(TokenKind::Eq, "="),
                '!' if self.peek_at(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    tokens.push(Token {
                        kind: TokenKind::Ne,
                        text: "!=".into(),
                        line,
                        column,
                    });
                }
                '<' if self.peek_at(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    tokens.push(Token {
                        kind: TokenKind::Le,
                        text: "<=".into(),
                        line,
                        column,
                    });
                }
                '<' => single!(TokenKind::Lt, "<"),
                '>' if self.peek_at(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    tokens.push(Token {
                        kind: TokenKind::Ge,
                        text: ">=".into(),
                        line,
                        column,
                    });
                }
                '>' => single!(TokenKind::Gt, ">"),
                '\'' | '"' => {
                    let value = self.read_string(line, column)?;
                    tokens.push(Token {
                        kind: TokenKind::String,
                        text: value,
                        line,
                        column,
                    });
                }
                c if c.is_ascii_digit() => {
                    let text = self.read_number();
                    tokens.push(Token {
                        kind: TokenKind::Number,
                        text,
                        line,
                        column,
                    });
                }
                c if c.is_alphabetic() || c == '_' => {
                    let text = self.read_identifier();
                    let upper = text.to_ascii_uppercase();
                    match keyword(&upper) {
                        Some(kind) => tokens.push(Token {
                            kind,
                            text: upper,
                            line,
                            column,
                        }),
                        None => tokens.push(Token {
                            kind: TokenKind::Identifier,
                            text,
                            line,
                            column,
                        }),
                    }
                }
                other => {
                    return Err(LedgerError::Parse {
                        message: format!("unexpected character '{}'", other),
                        line,
                        column,
                    })
                }
            }
        }
        Ok(tokens)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
