use anyhow::{bail, Result};

/// A source table whose cells are kept as text, blanks as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TextTable {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != columns.len()) {
            bail!("[TextTable::new] row {i} has {} cells, header has {}", row.len(), columns.len());
        }
        Ok(Self { columns, rows })
    }

    #[inline] pub fn columns(&self) -> &[String] { &self.columns }

    #[inline] pub fn rows(&self) -> &[Vec<Option<String>>] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `row` in column `name`; `None` when blank or when the column is absent.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        self.rows.get(row)?.get(self.column_index(name)?)?.as_deref()
    }

    /// All cells of column `name`, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }
}
