//! Upload ingestion: decoding, persistence and row normalization.
//!
//! Structural problems (unreadable bytes, fewer than four columns) fail the request with an
//! [`IngestError`]. Content problems inside individual rows never do: rows with a blank level
//! are dropped and unreadable values become `0`.

use crate::loader::{self, DataUrl, RawRow, RawTable};
use crate::saving::UploadStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Number of leading columns read from every sheet
pub const REQUIRED_COLUMNS: usize = 4;

/// Shown to the user when there is nothing to chart yet
pub const UPLOAD_PROMPT: &str =
    "Upload an Excel file with 'MainClass', 'SubClass', 'SubSubClass', and 'Value' columns.";

/// Structural ingestion failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// The bytes are not a readable spreadsheet. The message is the decoder's diagnostic.
    #[error("{0}")]
    DecodeFailed(String),

    #[error("The spreadsheet needs at least 4 columns: MainClass, SubClass, SubSubClass and Value.")]
    TooFewColumns,
}

/// One data row after positional column reinterpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub level1: String,
    pub level2: String,
    pub level3: String,
    pub value: f64,
}

/// Where the pipeline should take its bytes from
#[derive(Debug, Clone)]
pub enum Source {
    /// Freshly uploaded file
    Upload(DataUrl),
    /// Last persisted upload, falling back to the default dataset
    Stored,
    /// Bundled default dataset
    Default,
}

/// Which bytes a dataset was actually built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetOrigin {
    Upload,
    Stored,
    Default,
    /// Nothing uploaded, stored or bundled
    Empty,
}

/// Successful ingestion result
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub rows: Vec<NormalizedRow>,
    pub origin: DatasetOrigin,
}

impl Ingested {
    fn empty() -> Self {
        Self {
            rows: Vec::new(),
            origin: DatasetOrigin::Empty,
        }
    }

    /// Message asking the user to upload a file, present only when there was no data at all.
    pub fn prompt(&self) -> Option<&'static str> {
        (self.origin == DatasetOrigin::Empty).then_some(UPLOAD_PROMPT)
    }
}

/// Ingestion pipeline with its storage slot and bundled default dataset
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn UploadStore>,
    default_dataset: Option<Vec<u8>>,
}

impl Pipeline {
    /// Create a pipeline.
    ///
    /// # Arguments
    /// * `store` - Slot receiving every successfully decoded upload
    /// * `default_dataset` - Spreadsheet bytes used when nothing has been uploaded
    pub fn new(store: Arc<dyn UploadStore>, default_dataset: Option<Vec<u8>>) -> Self {
        Self {
            store,
            default_dataset,
        }
    }

    /// Produce normalized rows from the requested source.
    ///
    /// Uploads are decoded with the codec their content type declares. The bytes are persisted as
    /// soon as they decode, before the column count or any row is checked. A failed write is logged and does not fail the request.
    ///
    /// # Errors
    /// * `IngestError::DecodeFailed` if the selected bytes are not a readable spreadsheet
    /// * `IngestError::TooFewColumns` if the sheet has fewer than four columns
    pub fn ingest(&self, source: Source) -> Result<Ingested, IngestError> {
        match source {
            Source::Upload(upload) => {
                log::debug!(
                    "decoding upload: {} bytes, content type '{}'",
                    upload.bytes.len(),
                    upload.content_type
                );
                let table = loader::decode_upload(&upload)?;
                if let Err(e) = self.store.write(&upload.bytes) {
                    log::warn!("failed to persist upload: {}", e);
                }
                Self::finish(table, DatasetOrigin::Upload)
            }
            Source::Stored => match self.store.read() {
                Ok(Some(bytes)) => {
                    let table = loader::decode_table(&bytes)?;
                    Self::finish(table, DatasetOrigin::Stored)
                }
                Ok(None) => self.ingest(Source::Default),
                Err(e) => {
                    log::warn!("failed to read stored upload, using default data: {}", e);
                    self.ingest(Source::Default)
                }
            },
            Source::Default => match &self.default_dataset {
                Some(bytes) => {
                    let table = loader::decode_table(bytes)?;
                    Self::finish(table, DatasetOrigin::Default)
                }
                None => Ok(Ingested::empty()),
            },
        }
    }

    fn finish(table: RawTable, origin: DatasetOrigin) -> Result<Ingested, IngestError> {
        let rows = normalize(&table)?;
        log::info!(
            "ingested {} of {} rows from {:?} data",
            rows.len(),
            table.rows.len(),
            origin
        );
        Ok(Ingested { rows, origin })
    }
}

/// Reinterpret the first four columns as `level1, level2, level3, value`, whatever their headers.
///
/// # Errors
/// * `IngestError::TooFewColumns` when the table is narrower than four columns, even if it has no
///   data rows
pub fn normalize(table: &RawTable) -> Result<Vec<NormalizedRow>, IngestError> {
    if table.width < REQUIRED_COLUMNS {
        return Err(IngestError::TooFewColumns);
    }

    Ok(table.rows.iter().filter_map(normalize_row).collect())
}

fn normalize_row(row: &RawRow) -> Option<NormalizedRow> {
    let label = |i: usize| row.get(i).and_then(|c| c.as_label());

    Some(NormalizedRow {
        level1: label(0)?,
        level2: label(1)?,
        level3: label(2)?,
        value: row.get(3).and_then(|c| c.as_number()).unwrap_or(0.0),
    })
}
