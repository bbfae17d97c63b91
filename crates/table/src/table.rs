//! Row buffer
//!
//! A [`Table`] stores rows for one signature as a flat, row-major sequence of
//! JSON cells. The stored length is always a whole multiple of the row width:
//! an append either commits every row of its batch or none of them.

use std::slice::ChunksExact;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, TableError};
use crate::pool::TablePool;
use crate::signature::TableSignature;

/// Append-only row buffer for one table signature
pub struct Table {
    signature: Arc<TableSignature>,

    /// Row-major cells, `row_count * row_width` long
    data: Vec<Value>,

    /// Cells per row, fixed at construction
    row_width: usize,

    /// Cursor for [`next_row`](Self::next_row), in cells
    position: usize,

    pool: Arc<TablePool>,
}

impl Table {
    /// Create an empty table, taking storage from the pool
    pub fn new(signature: Arc<TableSignature>, pool: Arc<TablePool>) -> Self {
        let row_width = signature.row_width();
        let data = pool.get();
        Self {
            signature,
            data,
            row_width,
            position: 0,
            pool,
        }
    }

    /// Parse a JSON array of row arrays and append the rows
    ///
    /// Every row must have exactly one cell per field. If any row does not,
    /// or the payload does not parse, the table is left untouched.
    pub fn append_rows(&mut self, payload: &[u8]) -> Result<()> {
        let rows: Vec<Vec<Value>> = serde_json::from_slice(payload)?;

        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != self.row_width)
        {
            return Err(TableError::RowWidthMismatch {
                row,
                expected: self.row_width,
                actual: cells.len(),
                values: serde_json::to_string(cells).unwrap_or_default(),
            });
        }

        self.data.reserve(rows.len() * self.row_width);
        for cells in rows {
            self.data.extend(cells);
        }
        Ok(())
    }

    /// Number of complete rows stored
    #[inline]
    pub fn row_count(&self) -> usize {
        self.data.len() / self.row_width
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cells per row
    #[inline]
    pub fn row_width(&self) -> usize {
        self.row_width
    }

    #[inline]
    pub fn signature(&self) -> &Arc<TableSignature> {
        &self.signature
    }

    /// Next row under the internal cursor
    ///
    /// Returns `None` once every row has been produced and rewinds the
    /// cursor, so the following call starts a new pass from the first row.
    pub fn next_row(&mut self) -> Option<&[Value]> {
        if self.position >= self.data.len() {
            self.position = 0;
            return None;
        }
        let start = self.position;
        self.position += self.row_width;
        Some(&self.data[start..self.position])
    }

    /// Independent pass over every row
    ///
    /// Unlike [`next_row`](Self::next_row) this borrows the table immutably,
    /// so any number of readers can iterate a shared table concurrently,
    /// each with its own cursor.
    pub fn rows(&self) -> ChunksExact<'_, Value> {
        self.data.chunks_exact(self.row_width)
    }

    /// All cells in row-major order
    #[inline]
    pub fn raw_data(&self) -> &[Value] {
        &self.data
    }

    /// Hand the storage back to the pool
    pub fn release(self) {
        self.pool.put(self.data);
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("signature", &self.signature.key())
            .field("rows", &self.row_count())
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
