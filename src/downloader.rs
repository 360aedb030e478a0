use crate::ingest::NormalizedRow;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::error::Error;

/// Content type of `.xlsx` workbooks
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column headers written to exported files
pub const HEADERS: [&str; 4] = ["MainClass", "SubClass", "SubSubClass", "Value"];

/// Convert rows to CSV format
///
/// Writes the header row followed by one record per row. Values use their shortest
/// round-tripping representation.
///
/// # Arguments
/// * `rows` - Normalized rows to export
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - CSV content as a string or an error
pub fn to_csv(rows: &[NormalizedRow]) -> Result<String, Box<dyn Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for row in rows {
        writer.write_record([
            row.level1.as_str(),
            row.level2.as_str(),
            row.level3.as_str(),
            row.value.to_string().as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    Ok(String::from_utf8(bytes)?)
}

/// Convert rows to XLSX format
///
/// Exports a single worksheet using the rust_xlsxwriter library: a header row, then the three
/// level columns as text and the value column as a number.
///
/// # Arguments
/// * `rows` - Normalized rows to export
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
///
/// # Examples
/// ```
/// use sunburst::downloader::to_xlsx;
///
/// let xlsx = to_xlsx(&[]).unwrap();
/// assert!(xlsx.starts_with(b"PK"));
/// ```
pub fn to_xlsx(rows: &[NormalizedRow]) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Sheet1")?;

    for (c, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, c as u16, *header)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        worksheet.write_string(r, 0, row.level1.as_str())?;
        worksheet.write_string(r, 1, row.level2.as_str())?;
        worksheet.write_string(r, 2, row.level3.as_str())?;
        worksheet.write_number(r, 3, row.value)?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Encode bytes as a `data:` URL suitable for a download link
pub fn to_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(bytes))
}
