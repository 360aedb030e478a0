/*!
# Sunburst

A small web application that turns an uploaded spreadsheet into a sunburst chart.

## Overview

The user uploads a spreadsheet whose first four columns hold three hierarchy levels and a
numeric value. The rows are normalized, turned into leaf entries of a hierarchy, and handed
to Plotly.js in the browser as a `sunburst` trace. The last upload is kept on disk and a
bundled default dataset is shown until something has been uploaded.

## Pipeline

1. **Ingestion & Validation** ([`ingest`], [`loader`]) - decodes the upload (xlsx, xls, xlsb,
   ods or CSV), stores the raw bytes, reinterprets the first four columns positionally as
   `MainClass, SubClass, SubSubClass, Value` and normalizes each row.
2. **Hierarchy Builder** ([`hierarchy`]) - emits one node per row with
   `id = level1 - level2 - level3` and `parent = level1 - level2`.

Structural problems (unreadable file, fewer than four columns) fail the request. Content
problems degrade gracefully: rows with a blank level are dropped and unreadable values become 0.

## Modules

- **loader**: data URLs, format sniffing, spreadsheet decoding
- **ingest**: normalization and the ingestion pipeline
- **saving**: the storage slot holding the last upload
- **hierarchy**: hierarchy nodes and the Plotly figure
- **downloader**: XLSX/CSV export of the default dataset
- **graph**: server-side PNG preview
- **config**: environment-driven configuration
- **app**: routing and handlers

## REST API Endpoints

- `POST /api/figure` - Figure for an uploaded data URL, or for the stored/default data
- `POST /api/upload` - Same, from a multipart form
- `GET /api/default.xlsx` - Default dataset as a workbook
- `GET /api/sunburst.png` - Static preview of the current dataset
*/

pub mod hierarchy;
pub mod ingest;
pub mod loader;
pub mod saving;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod downloader;
#[cfg(feature = "web")]
pub mod graph;

pub use hierarchy::{build, Figure, HierarchyNode, SunburstTrace};
pub use ingest::{DatasetOrigin, IngestError, Ingested, NormalizedRow, Pipeline, Source};
pub use loader::DataUrl;
pub use saving::{FileStore, MemoryStore, NoStore, UploadStore};

/// Dataset shown before anything has been uploaded
pub const DEFAULT_DATASET: &[u8] = include_bytes!("../assets/default_data.csv");
