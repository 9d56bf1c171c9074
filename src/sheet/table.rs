//! In-memory table of named, row-aligned columns.

use std::collections::HashSet;

use super::types::CellValue;
use crate::common::{Error, Result};

/// A named column of cell values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a 0-based row index.
    pub fn get(&self, row: usize) -> Option<&CellValue> {
        self.values.get(row)
    }
}

/// Ordered sequence of named columns, all of the same length.
///
/// Column names are unique. Rows and columns keep the order of the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from column names and row-major data.
    ///
    /// Every row must have exactly one value per column.
    pub fn new(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        ensure_unique(names.iter().map(String::as_str))?;

        for (idx, row) in rows.iter().enumerate() {
            if row.len() != names.len() {
                return Err(Error::InvalidTable(format!(
                    "row {} has {} values, expected {}",
                    idx,
                    row.len(),
                    names.len()
                )));
            }
        }

        Ok(Self::from_aligned_rows(names, rows))
    }

    /// Build a table from columns, which must all be the same length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        ensure_unique(columns.iter().map(Column::name))?;

        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(column) = columns.iter().find(|c| c.len() != row_count) {
            return Err(Error::InvalidTable(format!(
                "column '{}' has {} values, expected {}",
                column.name,
                column.len(),
                row_count
            )));
        }

        Ok(Table { columns, row_count })
    }

    /// Transpose rows already known to match `names` in width.
    pub(crate) fn from_aligned_rows(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let row_count = rows.len();
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for row in rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Table { columns, row_count }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no data rows. A table can have columns and still be empty.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(Column::name)
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Value at 0-based `(row, column)`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.columns.get(column).and_then(|c| c.get(row))
    }

    /// One row as references into the columns.
    pub fn row(&self, row: usize) -> Option<Vec<&CellValue>> {
        if row >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[row]).collect())
    }

    /// Iterate rows in source order.
    pub fn rows(&self) -> Rows<'_> {
        Rows { table: self, next: 0 }
    }
}

/// Iterator over the rows of a [`Table`].
pub struct Rows<'a> {
    table: &'a Table,
    next: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Vec<&'a CellValue>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.table.row(self.next)?;
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.row_count.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Rows<'_> {}

fn ensure_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::InvalidTable(format!("duplicate column name '{}'", name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Envase".to_string(), "Nro envases".to_string()],
            vec![
                vec![CellValue::String("Basqueta".to_string()), CellValue::Int(1)],
                vec![CellValue::String("Canasto".to_string()), CellValue::Int(2)],
                vec![CellValue::String("Caja".to_string()), CellValue::Int(3)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_row_and_column_access() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Envase", "Nro envases"]);

        let envase = table.column("Envase").unwrap();
        assert_eq!(envase.get(2), Some(&CellValue::String("Caja".to_string())));
        assert_eq!(table.cell(1, 1), Some(&CellValue::Int(2)));
        assert!(table.column("Peso").is_none());

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![&CellValue::String("Basqueta".to_string()), &CellValue::Int(1)]);
        assert!(table.row(3).is_none());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![CellValue::Int(1)]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = Table::from_columns(vec![
            Column::new("a", vec![CellValue::Empty]),
            Column::new("a", vec![CellValue::Empty]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }

    #[test]
    fn test_from_columns_length_mismatch() {
        let err = Table::from_columns(vec![
            Column::new("a", vec![CellValue::Int(1), CellValue::Int(2)]),
            Column::new("b", vec![CellValue::Int(1)]),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTable(_)));
    }
}
