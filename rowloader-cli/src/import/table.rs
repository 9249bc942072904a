//! Normalized tabular data shared between the import parsers and the uploader

use anyhow::{Result, bail};

/// In-memory table of string cells produced by a parser.
///
/// Column names are unique and keep their discovery order, which also fixes
/// the order cells are read back in during upload.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new column. Column names must be unique.
    pub fn add_column(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.columns.contains(&name) {
            bail!("A column named '{}' already belongs to this table.", name);
        }
        self.columns.push(name);
        Ok(())
    }

    /// Append a row, padded or truncated to the declared column count.
    pub fn push_row(&mut self, mut values: Vec<String>) {
        values.resize(self.columns.len(), String::new());
        self.rows.push(values);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell lookup by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }
}
