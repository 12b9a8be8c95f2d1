//! File utility functions.

use crate::error::Result;
use std::path::Path;

/// Read a text dump, falling back to Windows-1252 when the bytes are not valid UTF-8.
///
/// Older dumps were saved from Windows tools and carry Latin-1 accents.
pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(text.into_owned())
        }
    }
}

/// Trim every line and rejoin them with `\n`, dropping `\r` from CRLF files.
pub fn normalize_lines(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}
