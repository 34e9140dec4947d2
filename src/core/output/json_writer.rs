//! JSON output writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::Message;
use crate::error::Result;

/// Writes messages as a pretty-printed JSON array.
///
/// ```json
/// [
///   {"sender": "Alice", "message": "Hello", "timestamp": "2024-06-15T12:30:00Z"}
/// ]
/// ```
pub fn write_json(messages: &[Message], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, messages)?;
    writer.flush()?;
    Ok(())
}

/// Same as [`write_json`] but returns the JSON text.
pub fn to_json(messages: &[Message]) -> Result<String> {
    Ok(serde_json::to_string_pretty(messages)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_to_json_roundtrips() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
        let messages = vec![Message::new("Alice", "Hello", ts)];
        let json = to_json(&messages).unwrap();
        assert!(json.contains("\"message\": \"Hello\""));
        let back: Vec<Message> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, messages);
    }

    #[test]
    fn test_write_json_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_json(&[], file.path()).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "[]");
    }
}
