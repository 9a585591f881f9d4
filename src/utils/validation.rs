use anyhow::{Result, anyhow};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Path;

/// The only accepted upload extension, compared case-insensitively.
pub const ALLOWED_EXTENSION: &str = "dcm";

/// Offset of the `DICM` marker, right after the 128 byte preamble.
pub const DICOM_MAGIC_OFFSET: usize = 128;
pub const DICOM_MAGIC: &[u8; 4] = b"DICM";

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Accepts only names ending in `.dcm`, in any case
pub fn validate_dicom_extension(filename: &str) -> Result<()> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some(ALLOWED_EXTENSION) => Ok(()),
        _ => Err(anyhow!(ValidationError {
            code: "UNSUPPORTED_MEDIA_TYPE",
            message: "Only DICOM (.dcm) files are allowed".to_string(),
        })),
    }
}

/// True when bytes 128..132 read `DICM`.
pub fn has_dicom_magic(leading_bytes: &[u8]) -> bool {
    leading_bytes
        .get(DICOM_MAGIC_OFFSET..DICOM_MAGIC_OFFSET + DICOM_MAGIC.len())
        .is_some_and(|marker| marker == DICOM_MAGIC)
}

/// `Content-Disposition: attachment` value with an ASCII fallback and an
/// RFC 5987 `filename*` carrying the exact name.
pub fn attachment_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file.dcm"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}
