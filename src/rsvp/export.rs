//! RSVP spreadsheet export.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::info;

use super::{ExportError, RsvpStore, RsvpWithGuests, list_with_guests};

pub const SHEET_NAME: &str = "RSVP List";

pub const COLUMNS: [(&str, f64); 6] = [
    ("Primary Guest", 25.0),
    ("Additional Guest", 25.0),
    ("Attending", 12.0),
    ("Phone", 15.0),
    ("Special Message", 30.0),
    ("Date Submitted", 15.0),
];

/// Longest string Excel accepts in one cell, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRow {
    pub primary_guest: String,
    pub additional_guest: String,
    pub attending: String,
    pub phone: String,
    pub special_message: String,
    pub date_submitted: String,
}

impl ExportRow {
    fn cells(&self) -> [&str; 6] {
        [
            self.primary_guest.as_str(),
            self.additional_guest.as_str(),
            self.attending.as_str(),
            self.phone.as_str(),
            self.special_message.as_str(),
            self.date_submitted.as_str(),
        ]
    }
}

fn clip(value: &str) -> String {
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => clip(v),
        _ => "-".to_string(),
    }
}

/// `M/D/YYYY`, no zero padding.
pub fn format_date(at: &DateTime<Utc>) -> String {
    format!("{}/{}/{}", at.month(), at.day(), at.year())
}

pub fn file_name(date: NaiveDate) -> String {
    format!("RSVP-List-{}.xlsx", date.format("%Y-%m-%d"))
}

/// One row per RSVP followed by one row per additional guest.
pub fn rows(listing: &[RsvpWithGuests]) -> Vec<ExportRow> {
    let mut rows = Vec::new();
    for entry in listing {
        let rsvp = &entry.rsvp;
        rows.push(ExportRow {
            primary_guest: clip(&rsvp.primary_guest_name),
            additional_guest: String::new(),
            attending: if rsvp.will_attend { "Yes" } else { "No" }.to_string(),
            phone: or_dash(rsvp.phone_number.as_deref()),
            special_message: or_dash(rsvp.special_message.as_deref()),
            date_submitted: format_date(&rsvp.created_at),
        });
        for guest in &entry.rsvp_guests {
            rows.push(ExportRow {
                additional_guest: clip(&guest.guest_name),
                ..ExportRow::default()
            });
        }
    }
    rows
}

pub fn build_workbook(listing: &[RsvpWithGuests]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (header, width)) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
        sheet.set_column_width(col as u16, *width)?;
    }

    for (i, row) in rows(listing).iter().enumerate() {
        for (col, cell) in row.cells().iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(i as u32 + 1, col as u16, *cell)?;
            }
        }
    }

    Ok(workbook)
}

pub fn to_bytes(listing: &[RsvpWithGuests]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(listing)?;
    Ok(workbook.save_to_buffer()?)
}

/// Loads every RSVP and renders the workbook.
pub async fn export_bytes(store: &dyn RsvpStore) -> Result<Vec<u8>, ExportError> {
    let listing = list_with_guests(store).await?;
    info!("Exporting {} RSVPs", listing.len());
    to_bytes(&listing)
}

pub async fn export_to_file(store: &dyn RsvpStore, path: &Path) -> Result<usize, ExportError> {
    let listing = list_with_guests(store).await?;
    let bytes = to_bytes(&listing)?;
    tokio::fs::write(path, &bytes).await?;
    info!("Wrote {} RSVPs to {}", listing.len(), path.display());
    Ok(listing.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsvp::{GuestRecordView, RsvpRecord};

    fn entry(name: &str, attending: bool, guests: &[&str]) -> RsvpWithGuests {
        RsvpWithGuests {
            rsvp: RsvpRecord {
                id: name.to_lowercase(),
                primary_guest_name: name.to_string(),
                phone_number: Some("0917 555 0101".to_string()),
                will_attend: attending,
                special_message: None,
                created_at: "2025-03-07T10:00:00Z".parse().unwrap(),
            },
            rsvp_guests: guests
                .iter()
                .enumerate()
                .map(|(i, g)| GuestRecordView {
                    id: format!("g{}", i),
                    guest_name: g.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rows_layout() {
        let rows = rows(&[entry("Ana", true, &["Ben", "Cara"]), entry("Dan", false, &[])]);
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].primary_guest, "Ana");
        assert_eq!(rows[0].attending, "Yes");
        assert_eq!(rows[0].special_message, "-");
        assert_eq!(rows[0].date_submitted, "3/7/2025");

        assert_eq!(
            rows[1],
            ExportRow {
                additional_guest: "Ben".to_string(),
                ..ExportRow::default()
            }
        );
        assert_eq!(rows[2].additional_guest, "Cara");
        assert_eq!(rows[3].attending, "No");
    }

    #[test]
    fn test_empty_phone_is_dash() {
        let mut e = entry("Ana", true, &[]);
        e.rsvp.phone_number = Some(String::new());
        assert_eq!(rows(&[e])[0].phone, "-");
    }

    #[test]
    fn test_long_text_fits_in_a_cell() {
        let mut e = entry("Ana", true, &[]);
        e.rsvp.special_message = Some("é".repeat(40_000));
        let rows = rows(&[e.clone()]);
        assert_eq!(rows[0].special_message.chars().count(), MAX_CELL_CHARS);

        assert_eq!(clip("short"), "short");
        assert!(to_bytes(&[e]).unwrap().starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_export_survives_long_message() {
        let store = crate::rsvp::providers::memory::MemoryRsvpStore::new();
        store
            .insert_record(crate::rsvp::RsvpRecord {
                special_message: Some("x".repeat(40_000)),
                ..entry("Ana", true, &[]).rsvp
            })
            .await;

        let bytes = export_bytes(&store).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(file_name(date), "RSVP-List-2025-03-07.xlsx");
    }

    #[test]
    fn test_workbook_is_zip() {
        let bytes = to_bytes(&[entry("Ana", true, &["Ben"])]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let store = crate::rsvp::providers::memory::MemoryRsvpStore::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsvps.xlsx");

        let count = export_to_file(&store, &path).await.unwrap();
        assert_eq!(count, 0);
        assert!(path.exists());
    }
}
