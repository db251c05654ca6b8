//! Presentation only: turns an `ExecResult` into printable text. No engine
//! logic lives here — everything it renders was already decided by
//! `ledger_core::Engine::execute`.

use comfy_table::{presets::UTF8_FULL, Table};
use ledger_core::ExecResult;

/// Renders an `ExecResult` for terminal display.
///
/// `Message` results print as-is. `Rows` results render through a
/// box-drawn `comfy-table`, or — in `--plain` mode — as a simple
/// pipe-delimited form, one row per line, with a header row of column
/// names taken from the first row (an empty result set prints nothing
/// but a row count of zero).
pub fn render(result: &ExecResult, plain: bool) -> String {
    match result {
        ExecResult::Message(msg) => msg.clone(),
        ExecResult::Rows(rows) => {
            if rows.is_empty() {
                return "0 rows".to_string();
            }
            let columns: Vec<String> = rows[0].keys().cloned().collect();

            if plain {
                let mut out = String::new();
                out.push_str(&columns.join(" | "));
                out.push('\n');
                for row in rows {
                    let cells: Vec<String> = columns
                        .iter()
                        .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                        .collect();
                    out.push_str(&cells.join(" | "));
                    out.push('\n');
                }
                out.push_str(&format!("({} row(s))", rows.len()));
                out
            } else {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL).set_header(columns.clone());
                for row in rows {
                    let cells: Vec<String> = columns
                        .iter()
                        .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                        .collect();
                    table.add_row(cells);
                }
                format!("{table}\n({} row(s))", rows.len())
            }
        }
    }
}
