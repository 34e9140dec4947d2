//! JSON Lines output writer, one message object per line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::Message;
use crate::error::Result;

fn write_lines<W: Write>(messages: &[Message], writer: &mut W) -> Result<()> {
    for msg in messages {
        serde_json::to_writer(&mut *writer, msg)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Writes messages as JSON Lines.
pub fn write_jsonl(messages: &[Message], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_lines(messages, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Same as [`write_jsonl`] but returns the text.
pub fn to_jsonl(messages: &[Message]) -> Result<String> {
    let mut buf = Vec::new();
    write_lines(messages, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
