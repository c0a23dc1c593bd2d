//! Upload validation: filename extension and declared MIME type allow-lists.
//!
//! Runs before any decoding or network I/O so an obviously wrong upload is
//! rejected without spending VLM quota.

use crate::error::LeafScanError;

/// Accepted filename extensions (compared case-insensitively, without the dot).
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Accepted declared content types.
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// A file received from a multipart upload. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        filename: Option<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Check the metadata and payload of this upload.
    pub fn validate(&self) -> Result<(), LeafScanError> {
        validate_upload(self.filename.as_deref(), self.content_type.as_deref())?;
        ensure_non_empty(&self.bytes)
    }
}

/// Accept only `.jpg`/`.jpeg`/`.png` filenames declared as a JPEG or PNG type.
///
/// Both conditions must hold; a missing filename is always rejected.
pub fn validate_upload(
    filename: Option<&str>,
    content_type: Option<&str>,
) -> Result<(), LeafScanError> {
    if has_allowed_extension(filename) && has_allowed_mime_type(content_type) {
        return Ok(());
    }
    Err(LeafScanError::InvalidFileType {
        filename: filename.map(str::to_string),
        content_type: content_type.map(str::to_string),
    })
}

/// Reject zero-length payloads before they reach the decoder.
pub fn ensure_non_empty(bytes: &[u8]) -> Result<(), LeafScanError> {
    if bytes.is_empty() {
        return Err(LeafScanError::EmptyFile);
    }
    Ok(())
}

fn has_allowed_extension(filename: Option<&str>) -> bool {
    let Some((_, ext)) = filename.and_then(|name| name.rsplit_once('.')) else {
        return false;
    };
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

// MIME types are case-insensitive (RFC 2045).
fn has_allowed_mime_type(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type.map(str::trim) else {
        return false;
    };
    ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| ct.eq_ignore_ascii_case(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_pairs() {
        for (name, ct) in [
            ("leaf.jpg", "image/jpeg"),
            ("leaf.JPG", "image/jpg"),
            ("leaf.jpeg", "image/jpeg"),
            ("Leaf.Photo.PNG", "image/png"),
            ("leaf.png", "IMAGE/PNG"),
            ("leaf.jpg", "image/png"),
        ] {
            assert!(validate_upload(Some(name), Some(ct)).is_ok(), "{name} {ct}");
        }
    }

    #[test]
    fn rejects_bad_extension_regardless_of_type() {
        for name in [
            "leaf.gif",
            "leaf.webp",
            "leaf.jpg.exe",
            "leaf",
            "jpg",
            "leaf.",
            "leafpng",
        ] {
            for ct in ALLOWED_MIME_TYPES {
                assert!(
                    validate_upload(Some(name), Some(ct)).is_err(),
                    "{name} should be rejected with {ct}"
                );
            }
        }
    }

    #[test]
    fn rejects_disallowed_content_type() {
        for ct in ["text/plain", "application/pdf", "image/gif", "image/png; x", ""] {
            assert!(validate_upload(Some("leaf.png"), Some(ct)).is_err(), "{ct}");
        }
        assert!(validate_upload(Some("leaf.png"), None).is_err());
    }

    #[test]
    fn rejects_missing_filename() {
        let err = validate_upload(None, Some("image/png")).unwrap_err();
        assert!(matches!(err, LeafScanError::InvalidFileType { filename: None, .. }));
        assert!(validate_upload(Some(""), Some("image/png")).is_err());
    }

    #[test]
    fn empty_payload_rejected() {
        assert!(matches!(ensure_non_empty(&[]), Err(LeafScanError::EmptyFile)));
        assert!(ensure_non_empty(&[0xFF]).is_ok());
    }

    #[test]
    fn uploaded_file_checks_type_before_size() {
        let file = UploadedFile::new(Some("notes.txt".into()), Some("text/plain".into()), vec![]);
        assert!(matches!(
            file.validate(),
            Err(LeafScanError::InvalidFileType { .. })
        ));

        let file = UploadedFile::new(Some("leaf.png".into()), Some("image/png".into()), vec![]);
        assert!(matches!(file.validate(), Err(LeafScanError::EmptyFile)));
    }
}
