//! Image upload validation: allow-listed types, path-safe filenames and size bounds.

use std::path::{Component, Path};

use bytes::Bytes;

use super::error::DomainError;

const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

/// Accepted image MIME types and the file extensions that may carry them.
const ALLOWED_IMAGE_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
];

/// A validated image payload ready to hand to the object store.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    filename: String,
    content_type: String,
    bytes: Bytes,
}

impl ImageUpload {
    /// Validate an uploaded image.
    ///
    /// The declared content type wins when it is specific; otherwise the type
    /// is guessed from the extension. Either way it must be allow-listed.
    pub fn new(
        filename: &str,
        declared_content_type: Option<&str>,
        bytes: Bytes,
        max_bytes: u64,
    ) -> Result<Self, DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::validation("image", "image payload is empty"));
        }
        if bytes.len() as u64 > max_bytes {
            return Err(DomainError::validation(
                "image",
                format!("image exceeds {max_bytes} bytes"),
            ));
        }

        let filename = validate_filename(filename)?;
        let extension = extension_of(filename)?;
        let content_type = resolve_content_type(declared_content_type, &extension)?;

        Ok(Self {
            filename: filename.to_string(),
            content_type,
            bytes,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn into_parts(self) -> (String, String, Bytes) {
        (self.filename, self.content_type, self.bytes)
    }
}

/// Whether the MIME type is one of the accepted image types.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|(allowed, _)| *allowed == content_type)
}

fn validate_filename(raw: &str) -> Result<&str, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("filename", "filename is empty"));
    }
    if trimmed.contains(['/', '\\', '\0']) || trimmed.contains("..") {
        return Err(DomainError::validation(
            "filename",
            "filename must not contain path separators or traversal",
        ));
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(trimmed),
        _ => Err(DomainError::validation(
            "filename",
            "filename must be a single path component",
        )),
    }
}

fn extension_of(filename: &str) -> Result<String, DomainError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .ok_or_else(|| DomainError::validation("filename", "filename has no extension"))?;

    let known = ALLOWED_IMAGE_TYPES
        .iter()
        .any(|(_, extensions)| extensions.contains(&extension.as_str()));
    if !known {
        return Err(DomainError::validation(
            "filename",
            format!("extension `{extension}` is not an accepted image type"),
        ));
    }
    Ok(extension)
}

fn resolve_content_type(declared: Option<&str>, extension: &str) -> Result<String, DomainError> {
    let declared = declared
        .map(normalize_content_type)
        .filter(|value| !value.is_empty() && value != GENERIC_CONTENT_TYPE);

    let content_type = match declared {
        Some(value) => value,
        None => mime_guess::from_ext(extension)
            .first_raw()
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::validation("content_type", "content type could not be determined")
            })?,
    };

    if !is_allowed_content_type(&content_type) {
        return Err(DomainError::validation(
            "content_type",
            format!("`{content_type}` is not an accepted image type"),
        ));
    }
    Ok(content_type)
}

fn normalize_content_type(raw: &str) -> String {
    let essence = raw.split(';').next().unwrap_or_default().trim();
    let lowered = essence.to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => lowered,
    }
}
