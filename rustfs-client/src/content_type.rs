//! File extension to MIME type lookup

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Content type returned for unknown or missing extensions
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

static CONTENT_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Images
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("webp", "image/webp"),
        ("svg", "image/svg+xml"),
        ("ico", "image/x-icon"),
        ("tiff", "image/tiff"),
        ("tif", "image/tiff"),
        // Documents
        ("pdf", "application/pdf"),
        ("doc", "application/msword"),
        (
            "docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ),
        ("xls", "application/vnd.ms-excel"),
        (
            "xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        ("ppt", "application/vnd.ms-powerpoint"),
        (
            "pptx",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ),
        ("txt", "text/plain"),
        ("rtf", "application/rtf"),
        ("odt", "application/vnd.oasis.opendocument.text"),
        ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
        ("odp", "application/vnd.oasis.opendocument.presentation"),
        // Audio
        ("mp3", "audio/mpeg"),
        ("wav", "audio/wav"),
        ("flac", "audio/flac"),
        ("aac", "audio/aac"),
        ("ogg", "audio/ogg"),
        ("wma", "audio/x-ms-wma"),
        ("m4a", "audio/mp4"),
        // Video
        ("mp4", "video/mp4"),
        ("avi", "video/x-msvideo"),
        ("mov", "video/quicktime"),
        ("wmv", "video/x-ms-wmv"),
        ("flv", "video/x-flv"),
        ("webm", "video/webm"),
        ("mkv", "video/x-matroska"),
        ("3gp", "video/3gpp"),
        ("m4v", "video/x-m4v"),
        // Archives
        ("zip", "application/zip"),
        ("rar", "application/vnd.rar"),
        ("7z", "application/x-7z-compressed"),
        ("tar", "application/x-tar"),
        ("gz", "application/gzip"),
        ("bz2", "application/x-bzip2"),
        ("xz", "application/x-xz"),
        // Source and markup
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("js", "application/javascript"),
        ("json", "application/json"),
        ("xml", "application/xml"),
        ("yaml", "application/x-yaml"),
        ("yml", "application/x-yaml"),
        ("go", "text/x-go"),
        ("rs", "text/x-rust"),
        ("py", "text/x-python"),
        ("java", "text/x-java-source"),
        ("c", "text/x-c"),
        ("cpp", "text/x-c++"),
        ("h", "text/x-c"),
        ("php", "application/x-httpd-php"),
        ("rb", "text/x-ruby"),
        ("sh", "application/x-sh"),
        ("sql", "application/sql"),
        // Binaries and packages
        ("bin", FALLBACK_CONTENT_TYPE),
        ("exe", FALLBACK_CONTENT_TYPE),
        ("dmg", "application/x-apple-diskimage"),
        ("iso", "application/x-iso9660-image"),
        ("deb", "application/vnd.debian.binary-package"),
        ("rpm", "application/x-rpm"),
        ("apk", "application/vnd.android.package-archive"),
        ("ipa", FALLBACK_CONTENT_TYPE),
    ])
});

/// Resolves a MIME type from the extension of `filename`.
///
/// The extension is matched case-insensitively; unknown or missing
/// extensions resolve to [`FALLBACK_CONTENT_TYPE`].
#[must_use]
pub fn resolve_content_type(filename: &str) -> &'static str {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| CONTENT_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_extensions() {
        let cases = [
            ("test.jpg", "image/jpeg"),
            ("test.png", "image/png"),
            ("test.pdf", "application/pdf"),
            ("test.mp4", "video/mp4"),
            ("test.json", "application/json"),
            ("archive.tar.gz", "application/gzip"),
            (
                "nested/dir/report.xlsx",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
        ];

        for (filename, expected) in cases {
            assert_eq!(resolve_content_type(filename), expected, "{filename}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve_content_type("A.JPG"), "image/jpeg");
        assert_eq!(resolve_content_type("Movie.MkV"), "video/x-matroska");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(resolve_content_type("a.unknownext"), FALLBACK_CONTENT_TYPE);
        assert_eq!(resolve_content_type("no_extension"), FALLBACK_CONTENT_TYPE);
        assert_eq!(resolve_content_type(""), FALLBACK_CONTENT_TYPE);
        assert_eq!(resolve_content_type("trailing."), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn test_fallback_matches_mime_crate() {
        assert_eq!(
            FALLBACK_CONTENT_TYPE,
            mime::APPLICATION_OCTET_STREAM.essence_str()
        );
    }
}
