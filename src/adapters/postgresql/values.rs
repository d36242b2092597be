//! Cursor statements and textual rows
//!
//! Rows are fetched with `FETCH` over the simple query protocol, which returns
//! every column in PostgreSQL's own text output format (`1 day` for an
//! interval, `{1,2,3}` for an array, the server's currency format for
//! `money`). Nothing is decoded on the client side.

use crate::adapters::database::TextRow;
use crate::domain::{ReporterError, Result};
use tokio_postgres::{SimpleQueryMessage, SimpleQueryRow};

/// Name of the server-side cursor holding the report result
pub const CURSOR_NAME: &str = "reporter_result";

/// Query text with trailing whitespace and statement terminators removed
///
/// `DECLARE ... FOR <query>` takes a single statement without its `;`.
pub fn query_body(query: &str) -> &str {
    query.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// `DECLARE` statement opening the report cursor over `body`
///
/// The body goes on its own line so a trailing `--` comment cannot swallow
/// anything after it.
pub fn declare_statement(body: &str) -> String {
    format!("DECLARE {CURSOR_NAME} NO SCROLL CURSOR FOR\n{body}\n")
}

/// `FETCH` statement pulling the next `fetch_size` rows
pub fn fetch_statement(fetch_size: u32) -> String {
    format!("FETCH FORWARD {fetch_size} FROM {CURSOR_NAME}")
}

/// Collect the data rows of one `FETCH` response, in order
pub fn rows_from_messages(messages: Vec<SimpleQueryMessage>) -> Result<Vec<TextRow>> {
    let mut rows = Vec::with_capacity(messages.len());
    for message in messages {
        if let SimpleQueryMessage::Row(row) = message {
            rows.push(render_row(&row)?);
        }
    }
    Ok(rows)
}

/// Column values of `row` in result order, `None` for SQL NULL
fn render_row(row: &SimpleQueryRow) -> Result<TextRow> {
    (0..row.len())
        .map(|idx| {
            row.try_get(idx)
                .map(|value| value.map(str::to_string))
                .map_err(|e| {
                    let name = row.columns().get(idx).map(|c| c.name()).unwrap_or("?");
                    ReporterError::query(format!("Failed to read column '{}'", name))
                        .with_source(e)
                })
        })
        .collect()
}
