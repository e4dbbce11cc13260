use crate::error::Error;
use expansion::RawTable;
use log::{debug, info};
use std::path::{Path, PathBuf};

type Result<T> = std::result::Result<T, Error>;

fn open(path: &Path) -> Result<Box<dyn std::io::Read>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let (rdr, format) = niffler::from_path(path)?;
    debug!("Reading {} as {:?}", path.display(), format);
    Ok(rdr)
}

/// Reads a tab delimited table with a header row, gzipped or plain
pub fn read_table(path: &Path) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(open(path)?);
    let headers = rdr.headers()?.iter().map(String::from).collect();
    let mut table = RawTable::new(headers);
    for record in rdr.records() {
        table.push_row(record?.iter().map(String::from).collect());
    }
    info!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}

/// Reads every table and combines their rows
pub fn read_tables(paths: &[PathBuf]) -> Result<RawTable> {
    let tables = paths
        .iter()
        .map(|path| read_table(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(RawTable::concat(tables))
}

/// Reads the records of a JSON disease catalog
pub fn read_catalog(path: &Path) -> Result<Vec<serde_json::Value>> {
    let value: serde_json::Value = serde_json::from_reader(open(path)?)?;
    match value {
        serde_json::Value::Array(records) => Ok(records),
        _ => Err(Error::CatalogNotArray(path.to_path_buf())),
    }
}

/// Each value is either an existing file listing ids one per line or an id itself
pub fn read_id_list(values: &[String]) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for value in values {
        let path = Path::new(value);
        if path.is_file() {
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(b'\t')
                .has_headers(false)
                .flexible(true)
                .from_reader(open(path)?);
            for record in rdr.records() {
                let record = record?;
                if let Some(id) = record.get(0).map(str::trim).filter(|id| !id.is_empty()) {
                    ids.push(id.to_string());
                }
            }
        } else {
            ids.push(value.trim().to_string());
        }
    }
    Ok(ids)
}

/// Reads `(sample id, locus id)` pairs from the first two columns of a headerless table
pub fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(open(path)?);
    let mut pairs = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let (Some(sample), Some(locus)) = (record.get(0), record.get(1)) {
            pairs.push((sample.trim().to_string(), locus.trim().to_string()));
        }
    }
    Ok(pairs)
}
