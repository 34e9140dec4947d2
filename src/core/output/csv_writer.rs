//! CSV output writer.

use std::fs::File;
use std::path::Path;

use crate::Message;
use crate::error::{AnalyzerError, Result};

const HEADER: [&str; 3] = ["Timestamp", "Sender", "Message"];

fn record(msg: &Message) -> [String; 3] {
    [
        msg.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        msg.sender.clone(),
        msg.content.clone(),
    ]
}

fn write_records<W: std::io::Write>(messages: &[Message], writer: W) -> Result<W> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for msg in messages {
        writer.write_record(record(msg))?;
    }
    writer.flush()?;

    writer
        .into_inner()
        .map_err(|e| AnalyzerError::Io(e.into_error()))
}

/// Writes messages as semicolon-delimited CSV with a
/// `Timestamp;Sender;Message` header.
pub fn write_csv(messages: &[Message], path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    write_records(messages, file)?;
    Ok(())
}

/// Same as [`write_csv`] but returns the CSV text.
pub fn to_csv(messages: &[Message]) -> Result<String> {
    let bytes = write_records(messages, Vec::new())?;
    String::from_utf8(bytes).map_err(|e| AnalyzerError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn messages() -> Vec<Message> {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
        vec![
            Message::new("Alice", "Hello", ts),
            Message::new("Bob", "Hi; there", ts),
        ]
    }

    #[test]
    fn test_to_csv() {
        let csv = to_csv(&messages()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Timestamp;Sender;Message"));
        assert_eq!(lines.next(), Some("2024-06-15 12:30:00;Alice;Hello"));
        assert_eq!(lines.next(), Some("2024-06-15 12:30:00;Bob;\"Hi; there\""));
    }

    #[test]
    fn test_write_csv() {
        let file = NamedTempFile::new().unwrap();
        write_csv(&messages(), file.path()).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("Alice;Hello"));
    }

    #[test]
    fn test_empty_has_header_only() {
        assert_eq!(to_csv(&[]).unwrap(), "Timestamp;Sender;Message\n");
    }
}
