//! Composite cell key encoding: `data:{rowID}:{columnID}`.
//!
//! The column id is numeric and always the last field, so decoding splits
//! from the right. Row ids may contain the delimiter and still round-trip;
//! they cannot collide with another (row, column) pair because column ids
//! never contain `:`.

/// Prefix of every cell entry in a table's namespace.
pub const DATA_PREFIX: &str = "data:";

/// Key holding the whole ordered column sequence.
pub const COLUMNS_KEY: &str = "columns";

/// Prefix of every table id recorded in the gateway directory.
pub const TABLES_PREFIX: &str = "tables:";

/// Composite key for the cell at `(row_id, column_id)`.
#[must_use]
pub fn cell_key(row_id: &str, column_id: u64) -> String {
    format!("{DATA_PREFIX}{row_id}:{column_id}")
}

/// Splits a composite key back into `(row_id, column_id)`.
///
/// Returns `None` for keys outside the data namespace or with a
/// non-numeric column suffix.
#[must_use]
pub fn parse_cell_key(key: &str) -> Option<(&str, u64)> {
    let rest = key.strip_prefix(DATA_PREFIX)?;
    let (row_id, column_id) = rest.rsplit_once(':')?;
    Some((row_id, column_id.parse().ok()?))
}
