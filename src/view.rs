// Text table rendering for the consultation list

use crate::export::{DateTimeFormats, INVALID_DATE};
use crate::record::Consultation;
use chrono::TimeZone;
use colored::Colorize;

const COLUMNS: [&str; 8] = [
    "Sr. No",
    "Date & Time",
    "Name",
    "Email",
    "Contact",
    "Place",
    "Diabetes Duration",
    "ID",
];

fn cells<Tz>(index: usize, record: &Consultation, formats: &DateTimeFormats, tz: &Tz) -> [String; 8]
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let when = match record.created_instant(tz) {
        Some(at) => {
            let local = at.with_timezone(tz);
            format!("{} {}", local.format(&formats.date), local.format(&formats.time))
        }
        None => INVALID_DATE.to_string(),
    };

    [
        (index + 1).to_string(),
        when,
        record.name.clone(),
        record.email.clone(),
        record.contact.clone(),
        record.place.clone(),
        record.duration.clone(),
        record.id.clone(),
    ]
}

/// Render records as an aligned table, one line per record
pub fn render_table<Tz>(records: &[Consultation], formats: &DateTimeFormats, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if records.is_empty() {
        return "No consultations\n".to_string();
    }

    let rows: Vec<[String; 8]> = records
        .iter()
        .enumerate()
        .map(|(i, r)| cells(i, r, formats, tz))
        .collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = COLUMNS
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<w$}", c, w = w))
        .collect();
    out.push_str(&header.join("  ").as_str().bold().to_string());
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<w$}", c, w = w))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, name: &str) -> Consultation {
        Consultation {
            id: id.to_string(),
            created_at: "2024-01-05T10:00:00Z".to_string(),
            name: name.to_string(),
            email: "someone@example.com".to_string(),
            contact: "12345".to_string(),
            place: "Goa".to_string(),
            duration: "1 year".to_string(),
        }
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render_table(&[], &DateTimeFormats::default(), &Utc), "No consultations\n");
    }

    #[test]
    fn test_rows_rendered_in_order() {
        let records = vec![record("id-b", "Bina"), record("id-a", "Arun")];
        let table = render_table(&records, &DateTimeFormats::default(), &Utc);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with('1'));
        assert!(lines[1].contains("Bina"));
        assert!(lines[1].contains("1/5/2024 10:00:00 AM"));
        assert!(lines[1].ends_with("id-b"));
        assert!(lines[2].starts_with('2'));
        assert!(lines[2].contains("Arun"));
    }

    #[test]
    fn test_plain_output_without_color() {
        colored::control::set_override(false);
        let table = render_table(&[record("id-a", "Arun")], &DateTimeFormats::default(), &Utc);
        colored::control::unset_override();

        assert!(!table.contains('\x1b'));
        assert!(table.starts_with("Sr. No"));
    }

    #[test]
    fn test_invalid_timestamp_cell() {
        let mut bad = record("x", "Xavier");
        bad.created_at = "whenever".to_string();
        let table = render_table(&[bad], &DateTimeFormats::default(), &Utc);
        assert!(table.contains(INVALID_DATE));
    }
}
