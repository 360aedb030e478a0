use crate::ingest::IngestError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Cursor;

lazy_static! {
    static ref DATA_URL: Regex =
        Regex::new(r"(?s)^data:(?P<mime>[^;,]*)(?P<params>(?:;[^;,]*)*),(?P<payload>.*)$")
            .unwrap();
}

/// An uploaded file as delivered by the browser: a declared content type plus its bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    /// Declared content type, e.g. `text/csv`. May be empty.
    pub content_type: String,

    /// Decoded payload bytes
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a `data:<type>[;base64],<payload>` string.
    ///
    /// # Errors
    /// * `IngestError::DecodeFailed` if the prefix or separator is missing, or the base64 payload
    ///   is invalid
    ///
    /// # Examples
    /// ```
    /// use sunburst::loader::DataUrl;
    ///
    /// let url = DataUrl::parse("data:text/csv;base64,YSxiLGMsZAo=").unwrap();
    /// assert_eq!(url.content_type, "text/csv");
    /// assert_eq!(url.bytes, b"a,b,c,d\n");
    /// ```
    pub fn parse(contents: &str) -> Result<Self, IngestError> {
        let caps = DATA_URL.captures(contents.trim()).ok_or_else(|| {
            IngestError::DecodeFailed("upload is not a data URL (expected 'data:<type>;base64,<payload>')".into())
        })?;

        let content_type = caps["mime"].to_string();
        let is_base64 = caps["params"]
            .split(';')
            .any(|p| p.eq_ignore_ascii_case("base64"));
        let payload = &caps["payload"];

        let bytes = if is_base64 {
            BASE64
                .decode(payload)
                .map_err(|e| IngestError::DecodeFailed(format!("invalid base64 payload: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self {
            content_type,
            bytes,
        })
    }
}

/// Spreadsheet codec chosen for a byte payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Zip or OLE2 container (xlsx, xlsb, ods, xls)
    Workbook,
    /// Delimited text
    Csv,
}

impl SheetFormat {
    /// Pick the codec from the leading magic bytes.
    ///
    /// Stored uploads keep no content type, so the payload itself decides.
    pub fn sniff(bytes: &[u8]) -> Self {
        const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
        const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            SheetFormat::Workbook
        } else {
            SheetFormat::Csv
        }
    }

    /// Pick the codec from a declared content type.
    ///
    /// Returns `Ok(None)` when the type is empty or generic and the bytes have to decide.
    ///
    /// # Errors
    /// * `IngestError::DecodeFailed` if the type names something that is not a spreadsheet
    pub fn from_content_type(content_type: &str) -> Result<Option<Self>, IngestError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "" | "application/octet-stream" => Ok(None),
            "text/csv" | "text/plain" => Ok(Some(SheetFormat::Csv)),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.ms-excel.sheet.macroenabled.12"
            | "application/vnd.ms-excel.sheet.binary.macroenabled.12"
            | "application/vnd.oasis.opendocument.spreadsheet" => Ok(Some(SheetFormat::Workbook)),
            other => Err(IngestError::DecodeFailed(format!(
                "unsupported file type '{}': upload an Excel workbook or a CSV file",
                other
            ))),
        }
    }
}

/// A single decoded cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Text form of the cell with surrounding whitespace removed.
    ///
    /// Integral numbers render without a fractional part, so a level cell holding `2024`
    /// reads as `"2024"` rather than `"2024.0"`.
    pub fn as_label(&self) -> Option<String> {
        let text = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => number_label(*n),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Numeric form of the cell, `None` when it cannot be read as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Empty => return None,
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

fn number_label(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One decoded data row, cells in original column order
pub type RawRow = Vec<Cell>;

/// Decoded sheet contents with the header row already removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Widest row in the sheet, header included
    pub width: usize,

    /// Data rows in sheet order
    pub rows: Vec<RawRow>,
}

/// Decode spreadsheet bytes into a table.
///
/// Workbooks are read with calamine from their first worksheet; everything else is read as CSV.
/// The first row is treated as the header and discarded.
///
/// # Errors
/// * `IngestError::DecodeFailed` carrying the codec's own diagnostic
pub fn decode_table(bytes: &[u8]) -> Result<RawTable, IngestError> {
    decode_as(SheetFormat::sniff(bytes), bytes)
}

/// Decode an uploaded file, trusting its declared content type.
///
/// A workbook type must come with workbook bytes; a CSV type is always read as CSV. Empty or
/// generic types fall back to sniffing, as for stored bytes.
///
/// # Errors
/// * `IngestError::DecodeFailed` if the type is not a spreadsheet type, the bytes do not match a
///   declared workbook type, or the codec rejects the bytes
pub fn decode_upload(upload: &DataUrl) -> Result<RawTable, IngestError> {
    let format = match SheetFormat::from_content_type(&upload.content_type)? {
        Some(SheetFormat::Workbook) if SheetFormat::sniff(&upload.bytes) != SheetFormat::Workbook => {
            return Err(IngestError::DecodeFailed(format!(
                "the file was declared as '{}' but is not an Excel workbook",
                upload.content_type
            )));
        }
        Some(format) => format,
        None => SheetFormat::sniff(&upload.bytes),
    };

    decode_as(format, &upload.bytes)
}

fn decode_as(format: SheetFormat, bytes: &[u8]) -> Result<RawTable, IngestError> {
    let grid = match format {
        SheetFormat::Workbook => from_workbook(bytes)?,
        SheetFormat::Csv => from_csv(bytes)?,
    };

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let rows = grid.into_iter().skip(1).collect();

    Ok(RawTable { width, rows })
}

fn from_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    use calamine::{open_workbook_auto_from_rs, Data, Reader};

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::DecodeFailed(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::DecodeFailed("No sheets found in workbook".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IngestError::DecodeFailed(e.to_string()))?;

    let grid = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::Float(f) => Cell::Number(*f),
                    Data::String(s) => Cell::Text(s.clone()),
                    Data::Empty | Data::Error(_) => Cell::Empty,
                    other => Cell::Text(other.to_string()),
                })
                .collect()
        })
        .collect();

    Ok(grid)
}

fn from_csv(bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            IngestError::DecodeFailed(format!("Failed to parse CSV row {}: {}", index + 1, e))
        })?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(grid)
}
