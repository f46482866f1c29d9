//! Row normalization for operator-facing listings.

use crate::row::Row;

/// Render one row as a comma-joined string with its key field stripped.
///
/// Relational rows drop the column named `primary_key`, falling back to
/// the first position when no name is registered or the name is absent.
/// Document rows drop their identity field. Remaining values keep the
/// row's native order.
pub fn render_row(row: &Row, primary_key: Option<&str>) -> String {
    match row {
        Row::Relational { columns, values } => {
            let key_index = primary_key
                .and_then(|pk| columns.iter().position(|c| c == pk))
                .unwrap_or(0);
            values
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != key_index)
                .map(|(_, value)| value.to_display_string())
                .collect::<Vec<_>>()
                .join(", ")
        }
        Row::Document { .. } => row
            .fields()
            .into_iter()
            .map(|(_, value)| value.to_display_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Render rows as a 1-indexed listing. Index numbers are ephemeral and
/// recomputed on every call.
pub fn render_listing(rows: &[Row], primary_key: Option<&str>) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| format!("{}. {}", i + 1, render_row(row, primary_key)))
        .collect()
}
