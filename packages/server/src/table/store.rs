//! Per-table sparse store: column schema plus scattered cell entries.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use gridstore_core::{Column, Row, RowValue, TableId, Value};
use tracing::warn;

use crate::storage::StorageBackend;

use super::keys::{cell_key, parse_cell_key, COLUMNS_KEY, DATA_PREFIX};

/// Owns the column schema and sparse cell data for one table id, backed by
/// a dedicated key-value namespace.
///
/// Columns live as one ordered sequence under [`COLUMNS_KEY`]; every append
/// rewrites the whole sequence. Cells are independent entries under
/// [`DATA_PREFIX`]; rows are never stored and get reconstructed per read.
pub struct TableStore {
    id: TableId,
    backend: Arc<dyn StorageBackend>,
}

fn decode_columns(value: &Value) -> anyhow::Result<Vec<Column>> {
    Ok(serde_json::from_value(value.clone().into_json())?)
}

fn encode_columns(columns: &[Column]) -> anyhow::Result<Value> {
    Ok(Value::from_json(serde_json::to_value(columns)?))
}

impl TableStore {
    /// Creates a store over the table's backend namespace.
    #[must_use]
    pub fn new(id: TableId, backend: Arc<dyn StorageBackend>) -> Self {
        Self { id, backend }
    }

    /// The table id this store serves.
    #[must_use]
    pub fn id(&self) -> &TableId {
        &self.id
    }

    /// Returns the stored column sequence. Absence is a valid, empty state.
    pub async fn list_columns(&self) -> anyhow::Result<Vec<Column>> {
        match self.backend.get(COLUMNS_KEY).await? {
            Some(value) => decode_columns(&value),
            None => Ok(Vec::new()),
        }
    }

    /// Appends a column with the next free id and returns the refreshed
    /// column list.
    ///
    /// The id computation and the sequence rewrite run inside one backend
    /// transaction; without it, two concurrent appends could both observe
    /// the same highest id and overwrite each other. The next id is one
    /// more than the maximum existing id (`1` on an empty table), which
    /// stays correct even if the sequence were ever reordered.
    pub async fn create_column(
        &self,
        mut attrs: BTreeMap<String, Value>,
    ) -> anyhow::Result<Vec<Column>> {
        // A caller-supplied "id" attribute would collide with the assigned
        // one when the column is flattened back to JSON.
        attrs.remove("id");

        self.backend
            .transaction(Box::new(move |txn| {
                let mut columns = match txn.get(COLUMNS_KEY) {
                    Some(value) => decode_columns(value)?,
                    None => Vec::new(),
                };
                let id = columns.iter().map(|c| c.id).max().unwrap_or(0) + 1;
                columns.push(Column { id, attrs });
                txn.put(COLUMNS_KEY, encode_columns(&columns)?);
                Ok(())
            }))
            .await?;

        self.list_columns().await
    }

    /// Reconstructs all rows by scanning the cell namespace and grouping by
    /// row id, in scan order (lexicographic by key). Cells with an
    /// undecodable key are skipped.
    pub async fn list_rows(&self) -> anyhow::Result<Vec<Row>> {
        let entries = self.backend.list(DATA_PREFIX).await?;

        let mut order: Vec<String> = Vec::new();
        let mut grouped: HashMap<String, Row> = HashMap::new();

        for (key, value) in entries {
            let Some((row_id, column_id)) = parse_cell_key(&key) else {
                warn!(table = %self.id, key, "skipping cell with undecodable key");
                continue;
            };
            let row = grouped.entry(row_id.to_string()).or_insert_with(|| {
                order.push(row_id.to_string());
                Row {
                    id: row_id.to_string(),
                    values: Vec::new(),
                }
            });
            row.values.push(RowValue {
                id: column_id,
                value,
            });
        }

        Ok(order.into_iter().filter_map(|id| grouped.remove(&id)).collect())
    }

    /// Unconditional upsert of one cell; the column id is not checked
    /// against the schema and the row springs into existence by being
    /// referenced. Returns the refreshed row listing.
    pub async fn update_value(
        &self,
        row_id: &str,
        column_id: u64,
        value: Value,
    ) -> anyhow::Result<Vec<Row>> {
        self.backend.put(&cell_key(row_id, column_id), value).await?;
        self.list_rows().await
    }

    /// All cells verbatim as composite key to value. Inspection escape hatch.
    pub async fn raw(&self) -> anyhow::Result<BTreeMap<String, Value>> {
        Ok(self.backend.list(DATA_PREFIX).await?.into_iter().collect())
    }

    /// Deletes every cell, leaving the column sequence untouched, and
    /// returns the post-wipe raw view (always empty).
    pub async fn wipe(&self) -> anyhow::Result<BTreeMap<String, Value>> {
        for (key, _) in self.backend.list(DATA_PREFIX).await? {
            self.backend.delete(&key).await?;
        }
        self.raw().await
    }
}
