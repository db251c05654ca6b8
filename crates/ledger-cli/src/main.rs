//! `ledgerlite` - a thin SQL REPL / script runner over the LedgerLite
//! engine. This binary owns no parsing or ledger logic of its own: every
//! statement it reads is handed verbatim to `ledger_core::Engine::execute`
//! and the result is rendered by `output::render`.

mod cli;
mod output;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use ledger_core::Engine;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut engine = Engine::open(&cli.ledger)
        .with_context(|| format!("failed to open ledger file '{}'", cli.ledger))?;

    match &cli.file {
        Some(path) => run_script(&mut engine, path, cli.plain),
        None => run_repl(&mut engine, cli.plain),
    }
}

/// Splits a script into individual `;`-terminated statements, skipping
/// `--` line comments and ignoring semicolons inside quoted strings so a
/// literal like `'a;b'` doesn't split a statement in half.
fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' {
                    if let Some(&next) = chars.peek() {
                        current.push(next);
                        chars.next();
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    while let Some(&nc) = chars.peek() {
                        if nc == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                ';' => {
                    statements.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements.into_iter().filter(|s| !s.is_empty()).collect()
}

fn run_script(engine: &mut Engine, path: &str, plain: bool) -> Result<()> {
    let script = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script '{}'", path))?;

    for statement in split_statements(&script) {
        match engine.execute(&statement) {
            Ok(result) => println!("{}", output::render(&result, plain)),
            Err(err) => {
                eprintln!("error: {}", err);
                return Err(err.into());
            }
        }
    }
    Ok(())
}

fn run_repl(engine: &mut Engine, plain: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("ledgerlite> ");
        stdout.flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            println!();
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }

        match engine.execute(trimmed) {
            Ok(result) => println!("{}", output::render(&result, plain)),
            Err(err) => eprintln!("error: {}", err),
        }
    }
    Ok(())
}
