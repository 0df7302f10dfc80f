use bytes::Bytes;

use crate::constants::DEFAULT_MIME;

/// A named binary blob selected by the user (or produced from one).
///
/// Cloning is cheap: the bytes are reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub name: String,
    pub mime: String,
    pub data: Bytes,
}

impl Payload {
    /// Creates a payload from a file name, MIME type and contents.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// MIME type to send over the wire; falls back to `image/jpeg`.
    pub fn content_type(&self) -> &str {
        if self.mime.is_empty() {
            DEFAULT_MIME
        } else {
            &self.mime
        }
    }

    /// File name with its extension (if any) replaced by `ext`.
    pub fn renamed_with_extension(&self, ext: &str) -> String {
        let stem = match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => self.name.as_str(),
        };
        format!("{stem}.{ext}")
    }

    /// Guesses a MIME type from the file extension. Used by callers that
    /// read payloads from disk and have no browser-provided type.
    pub fn guess_mime(name: &str) -> &'static str {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "heic" => "image/heic",
            _ => "",
        }
    }
}
