use clap::Parser;

use ledger_core::VERSION;

/// ledgerlite - a thin SQL REPL over the LedgerLite engine.
///
/// Every statement this binary accepts is handed verbatim to
/// `ledger_core::Engine::execute`; this crate owns no parsing or ledger
/// logic of its own, only argument handling and result presentation.
#[derive(Parser)]
#[command(name = "ledgerlite")]
#[command(author, version = VERSION, about, long_about = None)]
pub struct Cli {
    /// Path to the ledger file.
    #[arg(short, long, env = "LEDGER_PATH", default_value = "./ledgerlite.jsonl")]
    pub ledger: String,

    /// Run the statements in this script file instead of reading stdin.
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<String>,

    /// Render SELECT results as plain separator-delimited text instead of
    /// a box-drawn table.
    #[arg(long)]
    pub plain: bool,
}
