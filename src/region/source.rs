//! CSV ingestion of the flat region table.
//!
//! Columns: `city_code,state_code,country_code,city_name,state_name,country_name`.
//! Record lengths are not enforced here so that short rows reach the
//! catalog's own `MalformedInput` check with their row index.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use super::catalog::RegionCatalog;
use super::types::CatalogError;

/// Region table ingestion errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open region table {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Read every row as a list of string fields, skipping a header when asked.
pub fn read_rows<R: Read>(reader: R, has_header: bool) -> Result<Vec<Vec<String>>, SourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Read rows from a reader and load them into `catalog`.
/// Returns the number of regions created.
pub fn load_into<R: Read>(catalog: &mut RegionCatalog, reader: R, has_header: bool) -> Result<usize, SourceError> {
    let rows = read_rows(reader, has_header)?;
    Ok(catalog.load_rows(&rows)?)
}

/// Load a region table file. The first line is treated as a header.
pub fn load_path(catalog: &mut RegionCatalog, path: &Path) -> Result<usize, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let created = load_into(catalog, file, true)?;
    tracing::info!(path = %path.display(), created, total = catalog.len(), "region table loaded");
    Ok(created)
}
