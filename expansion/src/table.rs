//! Loosely typed tables as read from disk.
use crate::error::Error;
use crate::Result;
use log::warn;
use std::collections::HashMap;

/// Tab-delimited table as handed over by the I/O layer: a header and string cells.
/// Rows are padded or truncated to the header length on insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Creates an empty table. Duplicate header names resolve to their first occurrence.
    pub fn new(headers: Vec<String>) -> Self {
        let mut index = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            index.entry(header.clone()).or_insert(i);
        }
        Self {
            headers,
            index,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padded or truncated to the header
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Column names
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Cell at `row` in the named column, `None` when the column does not exist
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column(column)?;
        self.rows.get(row).map(|cells| cells[col].as_str())
    }

    /// Stacks tables on top of each other. The header is the union of all headers in order
    /// of first appearance, cells of columns a table lacks are left empty.
    pub fn concat(tables: Vec<RawTable>) -> RawTable {
        let mut headers: Vec<String> = Vec::new();
        for table in &tables {
            for header in &table.headers {
                if !headers.contains(header) {
                    headers.push(header.clone());
                }
            }
        }

        let mut combined = RawTable::new(headers);
        for table in tables {
            let positions = combined
                .headers
                .iter()
                .map(|header| table.column(header))
                .collect::<Vec<_>>();
            for row in table.rows {
                let cells = positions
                    .iter()
                    .map(|pos| pos.map(|p| row[p].clone()).unwrap_or_default())
                    .collect();
                combined.push_row(cells);
            }
        }
        combined
    }

    /// Left joins `other` on `key` (column of this table) and `other_key`. Columns of `other`
    /// are appended, or fill empty cells when this table already has them. Duplicate keys in
    /// `other` keep their first row; the number of dropped duplicates is returned.
    pub fn left_join(&mut self, key: &str, other: &RawTable, other_key: &str) -> Result<usize> {
        let key_col = self
            .column(key)
            .ok_or_else(|| Error::SchemaError(vec![key.to_string()]))?;
        let other_key_col = other
            .column(other_key)
            .ok_or_else(|| Error::SchemaError(vec![other_key.to_string()]))?;

        let mut lookup: HashMap<&str, &Vec<String>> = HashMap::new();
        let mut duplicates = 0;
        for row in &other.rows {
            if lookup.contains_key(row[other_key_col].as_str()) {
                duplicates += 1;
            } else {
                lookup.insert(row[other_key_col].as_str(), row);
            }
        }
        if duplicates > 0 {
            warn!(
                "Dropped {} duplicate rows based on {} from the metadata table",
                duplicates, other_key
            );
        }

        let mut targets = Vec::new();
        for (col, header) in other.headers.iter().enumerate() {
            if col == other_key_col {
                continue;
            }
            let target = match self.column(header) {
                Some(existing) => existing,
                None => {
                    self.headers.push(header.clone());
                    self.index.insert(header.clone(), self.headers.len() - 1);
                    self.headers.len() - 1
                }
            };
            targets.push((col, target));
        }

        let width = self.headers.len();
        for row in self.rows.iter_mut() {
            row.resize(width, String::new());
            if let Some(matched) = lookup.get(row[key_col].as_str()) {
                for (col, target) in &targets {
                    if row[*target].is_empty() {
                        row[*target] = matched[*col].clone();
                    }
                }
            }
        }

        Ok(duplicates)
    }
}
