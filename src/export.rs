// Spreadsheet export of the filtered consultation list

use crate::record::Consultation;
use chrono::TimeZone;
use eyre::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

/// Sheet name inside the exported workbook
pub const SHEET_NAME: &str = "Consultations";

/// Default file name offered for the export
pub const DEFAULT_FILE_NAME: &str = "consultations.xlsx";

/// Column headers, in output order
pub const HEADERS: [&str; 7] = ["Sr No", "Date", "Time", "Name", "Contact", "Place", "Diabetes Duration"];

/// Rendered in the date and time columns when `createdAt` does not parse
pub const INVALID_DATE: &str = "Invalid Date";

const COLUMN_WIDTHS: [f64; 7] = [8.0, 12.0, 12.0, 24.0, 16.0, 18.0, 20.0];

/// chrono format strings used for the date and time columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeFormats {
    pub date: String,
    pub time: String,
}

impl Default for DateTimeFormats {
    fn default() -> Self {
        Self {
            date: "%-m/%-d/%Y".to_string(),
            time: "%-I:%M:%S %p".to_string(),
        }
    }
}

/// One flattened spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// 1-based position in the exported list
    pub sr_no: usize,
    pub date: String,
    pub time: String,
    pub name: String,
    pub contact: String,
    pub place: String,
    pub duration: String,
}

/// Flatten records into rows, numbering them by position.
pub fn export_rows<Tz>(records: &[Consultation], formats: &DateTimeFormats, tz: &Tz) -> Vec<ExportRow>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let (date, time) = match record.created_instant(tz) {
                Some(at) => {
                    let local = at.with_timezone(tz);
                    (
                        local.format(&formats.date).to_string(),
                        local.format(&formats.time).to_string(),
                    )
                }
                None => (INVALID_DATE.to_string(), INVALID_DATE.to_string()),
            };

            ExportRow {
                sr_no: index + 1,
                date,
                time,
                name: record.name.clone(),
                contact: record.contact.clone(),
                place: record.place.clone(),
                duration: record.duration.clone(),
            }
        })
        .collect()
}

/// Durations that are plain numbers upstream are stored as numeric cells.
fn numeric_cell(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Write rows to a single-sheet workbook at `path`.
pub fn write_workbook(rows: &[ExportRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).context("Failed to name worksheet")?;

    for (col, (header, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &header_format)?;
        sheet.set_column_width(col, width)?;
    }

    for (offset, row) in rows.iter().enumerate() {
        let r = offset as u32 + 1;
        sheet.write_number(r, 0, row.sr_no as f64)?;
        sheet.write_string(r, 1, &row.date)?;
        sheet.write_string(r, 2, &row.time)?;
        sheet.write_string(r, 3, &row.name)?;
        sheet.write_string(r, 4, &row.contact)?;
        sheet.write_string(r, 5, &row.place)?;
        match numeric_cell(&row.duration) {
            Some(n) => sheet.write_number(r, 6, n)?,
            None => sheet.write_string(r, 6, &row.duration)?,
        };
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to write workbook to {}", path.display()))?;

    info!(path = ?path, rows = rows.len(), "Exported consultations");
    Ok(())
}

/// Flatten `records` and write them to `path`. Returns the number of data rows.
pub fn export_to_spreadsheet<Tz>(records: &[Consultation], formats: &DateTimeFormats, tz: &Tz, path: &Path) -> Result<usize>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let rows = export_rows(records, formats, tz);
    write_workbook(&rows, path)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use chrono::FixedOffset;
    use std::fs;
    use tempfile::TempDir;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
    }

    fn record(id: &str, created_at: &str) -> Consultation {
        Consultation {
            id: id.to_string(),
            created_at: created_at.to_string(),
            name: format!("Patient {}", id),
            email: format!("{}@example.com", id),
            contact: "9876543210".to_string(),
            place: "Nagpur".to_string(),
            duration: "3 years".to_string(),
        }
    }

    #[test]
    fn test_rows_are_numbered_by_position() {
        let records = vec![
            record("zz-9", "2024-01-05T04:30:00Z"),
            record("aa-1", "2024-01-06T04:30:00Z"),
            record("mm-5", "2024-01-07T04:30:00Z"),
        ];

        let rows = export_rows(&records, &DateTimeFormats::default(), &ist());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.sr_no).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rows[1].name, "Patient aa-1");
    }

    #[test]
    fn test_row_fields_in_local_time() {
        let records = vec![record("1", "2024-01-05T20:15:30Z")];

        let rows = export_rows(&records, &DateTimeFormats::default(), &ist());
        let row = &rows[0];
        assert_eq!(row.date, "1/6/2024");
        assert_eq!(row.time, "1:45:30 AM");
        assert_eq!(row.contact, "9876543210");
        assert_eq!(row.place, "Nagpur");
        assert_eq!(row.duration, "3 years");
    }

    #[test]
    fn test_custom_formats() {
        let formats = DateTimeFormats {
            date: "%d-%m-%Y".to_string(),
            time: "%H:%M".to_string(),
        };
        let rows = export_rows(&[record("1", "2024-01-05T10:00:00Z")], &formats, &chrono::Utc);
        assert_eq!(rows[0].date, "05-01-2024");
        assert_eq!(rows[0].time, "10:00");
    }

    #[test]
    fn test_invalid_timestamp_renders_marker() {
        let rows = export_rows(&[record("1", "soon")], &DateTimeFormats::default(), &ist());
        assert_eq!(rows[0].date, INVALID_DATE);
        assert_eq!(rows[0].time, INVALID_DATE);
        assert_eq!(rows[0].sr_no, 1);
    }

    #[test]
    fn test_write_workbook_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_FILE_NAME);
        let records = vec![record("1", "2024-01-05T10:00:00Z"), record("2", "2024-01-06T10:00:00Z")];

        let count = export_to_spreadsheet(&records, &DateTimeFormats::default(), &ist(), &path).unwrap();
        assert_eq!(count, 2);

        let bytes = fs::read(&path).unwrap();
        // xlsx is a zip container
        assert!(bytes.starts_with(b"PK"));
    }

    fn read_sheet(path: &Path) -> (Vec<String>, Vec<Vec<Data>>) {
        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let names = workbook.sheet_names();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        (names, range.rows().map(|row| row.to_vec()).collect())
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn header_row() -> Vec<Data> {
        HEADERS.iter().map(|h| text(h)).collect()
    }

    #[test]
    fn test_workbook_contents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_FILE_NAME);
        let mut second = record("2", "2024-01-06T10:00:00Z");
        second.name = "Meera".to_string();
        second.duration = "7".to_string();
        let records = vec![record("1", "2024-01-05T20:15:30Z"), second];

        export_to_spreadsheet(&records, &DateTimeFormats::default(), &ist(), &path).unwrap();
        let (names, rows) = read_sheet(&path);

        assert_eq!(names, vec![SHEET_NAME.to_string()]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], header_row());
        assert_eq!(
            rows[1],
            vec![
                Data::Float(1.0),
                text("1/6/2024"),
                text("1:45:30 AM"),
                text("Patient 1"),
                text("9876543210"),
                text("Nagpur"),
                text("3 years"),
            ]
        );
        assert_eq!(
            rows[2],
            vec![
                Data::Float(2.0),
                text("1/6/2024"),
                text("3:30:00 PM"),
                text("Meera"),
                text("9876543210"),
                text("Nagpur"),
                Data::Float(7.0),
            ]
        );
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.xlsx");

        let count = export_to_spreadsheet(&[], &DateTimeFormats::default(), &ist(), &path).unwrap();
        assert_eq!(count, 0);

        let (names, rows) = read_sheet(&path);
        assert_eq!(names, vec![SHEET_NAME.to_string()]);
        assert_eq!(rows, vec![header_row()]);
    }

    #[test]
    fn test_numeric_cell() {
        assert_eq!(numeric_cell("7"), Some(7.0));
        assert_eq!(numeric_cell("2.5"), Some(2.5));
        assert_eq!(numeric_cell("3 years"), None);
        assert_eq!(numeric_cell(""), None);
        assert_eq!(numeric_cell("inf"), None);
        assert_eq!(numeric_cell("NaN"), None);
    }

    #[test]
    fn test_write_workbook_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no-such-dir").join("out.xlsx");

        let result = write_workbook(&[], &path);
        assert!(result.is_err());
    }
}
