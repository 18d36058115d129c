//! MIME type detection module
//!
//! Guesses the Content-Type of a static file from its extension.

use std::path::Path;

/// Get MIME Content-Type for a file path
///
/// Textual types carry `charset=utf-8`. Extensions are matched
/// case-insensitively.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use staticfiles::http::mime::guess_content_type;
/// assert_eq!(guess_content_type(Path::new("index.HTML")), "text/html; charset=utf-8");
/// assert_eq!(guess_content_type(Path::new("clip.mp4")), "video/mp4");
/// assert_eq!(guess_content_type(Path::new("LICENSE")), "application/octet-stream");
/// ```
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    content_type_for_extension(extension.as_deref())
}

fn content_type_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        Some("xml") => "application/xml",

        // Scripts and data
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("map") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents and archives
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("tar") => "application/x-tar",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(
            guess_content_type(Path::new("a/b/page.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(Path::new("example.txt")),
            "text/plain; charset=utf-8"
        );
        assert_eq!(guess_content_type(Path::new("data.json")), "application/json");
        assert_eq!(guess_content_type(Path::new("logo.PNG")), "image/png");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            guess_content_type(Path::new("archive.xyz")),
            "application/octet-stream"
        );
        assert_eq!(
            guess_content_type(Path::new("Makefile")),
            "application/octet-stream"
        );
    }
}
