//! Line-level grammar for transcript exports.
//!
//! The [`TranscriptParser`](crate::parser::TranscriptParser) drives these
//! helpers one line at a time; they are public so callers can sniff a
//! sample before committing to a full parse.

pub mod whatsapp;

pub use whatsapp::{LineFormat, LineMatch, detect_format, is_system_message, match_line};
