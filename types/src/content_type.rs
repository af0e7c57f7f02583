//! Declared content type of a local file.
//!
//! The console never sniffs file contents. Like a browser file input, the
//! declared type comes from the file name's extension.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Markdown,
    Json,
    Csv,
    Html,
    Png,
    Jpeg,
    Gif,
    Pdf,
    Zip,
    /// Unknown extension or no extension at all.
    OctetStream,
}

impl ContentType {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return ContentType::OctetStream;
        };
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" => ContentType::PlainText,
            "md" | "markdown" => ContentType::Markdown,
            "json" => ContentType::Json,
            "csv" => ContentType::Csv,
            "htm" | "html" => ContentType::Html,
            "png" => ContentType::Png,
            "jpg" | "jpeg" => ContentType::Jpeg,
            "gif" => ContentType::Gif,
            "pdf" => ContentType::Pdf,
            "zip" => ContentType::Zip,
            _ => ContentType::OctetStream,
        }
    }

    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain",
            ContentType::Markdown => "text/markdown",
            ContentType::Json => "application/json",
            ContentType::Csv => "text/csv",
            ContentType::Html => "text/html",
            ContentType::Png => "image/png",
            ContentType::Jpeg => "image/jpeg",
            ContentType::Gif => "image/gif",
            ContentType::Pdf => "application/pdf",
            ContentType::Zip => "application/zip",
            ContentType::OctetStream => "application/octet-stream",
        }
    }

    /// Only exactly `text/plain` is accepted for ingestion.
    #[must_use]
    pub const fn is_plain_text(self) -> bool {
        matches!(self, ContentType::PlainText)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
