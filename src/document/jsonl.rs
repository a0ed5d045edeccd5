//! JSON Lines loading of apartment records.
//!
//! One record per line; blank lines are skipped:
//! ```jsonl
//! {"id": 1, "title": "Modern Studio in Maadi", "location": "Maadi", ...}
//! {"id": 2, "title": "Shared Flat in Giza", "location": "Giza", ...}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::document::apartment::ApartmentRecord;
use crate::error::{HearthError, Result};

/// Load every record of a JSONL file.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<ApartmentRecord>> {
    let file = File::open(path.as_ref())?;
    read_records(BufReader::new(file))
}

/// Read records from any buffered reader. Errors name the offending line.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<ApartmentRecord>> {
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: ApartmentRecord = serde_json::from_str(trimmed).map_err(|e| {
            HearthError::invalid_input(format!("line {}: {e}", line_num + 1))
        })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use tempfile::NamedTempFile;

    use super::*;

    const LINE: &str = r#"{"id": 1, "title": "Modern Studio in Maadi", "location": "Maadi", "apartment_type": "Studio", "rent_per_week": 450, "start_date": "2024-10-01", "place_accept": "Both", "furnishing_type": "Furnished", "parking_type": "Private", "keywords": ["Balcony", "Parking"], "created_at": "2024-09-01T08:00:00Z"}"#;

    #[test]
    fn test_read_records_skips_blank_lines() {
        let input = format!("{LINE}\n\n   \n{}\n", LINE.replace("\"id\": 1", "\"id\": 2"));
        let records = read_records(Cursor::new(input)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn test_error_names_line() {
        let input = format!("{LINE}\n{{\"id\": \"oops\"}}\n");
        let err = read_records(Cursor::new(input)).unwrap_err();
        assert!(matches!(err, HearthError::InvalidInput(_)));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{LINE}").unwrap();
        let records = load_records(file.path()).unwrap();
        assert_eq!(records[0].title, "Modern Studio in Maadi");
    }
}
