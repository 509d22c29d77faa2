use std::io::Cursor;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use super::errors::InternalError;

///
/// A sheet of cells rendered as text. The first row of the sheet becomes the headers.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

///
/// Turns uploaded bytes into a Table. Keeps the grouping logic free of any spreadsheet library.
///
pub trait TabularReader {
    fn read(&self, bytes: &[u8]) -> Result<Table, InternalError>;
}

///
/// Reads the first worksheet of an XLSX, XLSM, XLSB, XLS or ODS workbook. The format is detected
/// from the content, not the filename.
///
pub struct SpreadsheetReader;

impl TabularReader for SpreadsheetReader {
    fn read(&self, bytes: &[u8]) -> Result<Table, InternalError> {
        if bytes.is_empty() {
            return Err(InternalError::InvalidFile { reason: "the file is empty".to_string() })
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|err| InternalError::InvalidFile { reason: format!("not a readable spreadsheet: {}", err) })?;

        let range = match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => range,
            Some(Err(err)) => return Err(InternalError::InvalidFile { reason: format!("unable to read the first sheet: {}", err) }),
            None => return Err(InternalError::InvalidFile { reason: "the workbook has no sheets".to_string() }),
        };

        let mut rows = range.rows()
            .map(|row| row.iter().map(cell_to_string).collect::<Vec<String>>());

        let headers = match rows.next() {
            Some(headers) => headers.into_iter().map(|header| header.trim().to_string()).collect(),
            None => return Err(InternalError::InvalidFile { reason: "the first sheet is empty".to_string() }),
        };

        Ok(Table { headers, rows: rows.collect() })
    }
}

///
/// Render a cell the way it reads in the sheet. Whole numbers lose their trailing .0 as vendor
/// field values are matched as text.
///
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => format!("{f}"),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_owned(),
        Data::DateTime(dt) => format!("{dt}"),
        Data::Error(_) => String::new(),
    }
}
