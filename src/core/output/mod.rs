//! Export writers for parsed messages.
//!
//! | Format | Writer | Shape |
//! |--------|--------|-------|
//! | CSV | [`write_csv`] / [`to_csv`] | `Timestamp;Sender;Message`, needs `csv-output` |
//! | JSON | [`write_json`] / [`to_json`] | Pretty array of messages |
//! | JSONL | [`write_jsonl`] / [`to_jsonl`] | One message object per line |

#[cfg(feature = "csv-output")]
mod csv_writer;
mod json_writer;
mod jsonl_writer;

#[cfg(feature = "csv-output")]
pub use csv_writer::{to_csv, write_csv};
pub use json_writer::{to_json, write_json};
pub use jsonl_writer::{to_jsonl, write_jsonl};
