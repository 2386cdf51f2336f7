//! Content type detection.

/// Bytes of the original file inspected when the extension is unknown.
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for a well-known extension (lowercase, no dot).
pub fn from_extension(extension: &str) -> Option<&'static str> {
    Some(match extension {
        "css" => "text/css",
        "htm" | "html" => "text/html",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "webmanifest" => "application/manifest+json",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "ico" => "image/x-icon",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        _ => return None,
    })
}

/// Guess a content type from the first bytes of a file.
///
/// HTML markers are checked first so the charset is declared, then magic
/// numbers, then plain text; anything unrecognised is
/// `application/octet-stream`.
pub fn sniff(head: &[u8]) -> String {
    let head = &head[..head.len().min(SNIFF_LEN)];
    if looks_like_html(head) {
        return "text/html; charset=utf-8".to_string();
    }
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    if head.is_empty() {
        return "text/plain; charset=utf-8".to_string();
    }
    if is_text(head) {
        return "text/plain; charset=utf-8".to_string();
    }
    OCTET_STREAM.to_string()
}

/// Content type for a file, by extension when known, otherwise sniffed.
pub fn content_type(extension: &str, head: &[u8]) -> String {
    match from_extension(extension) {
        Some(mime) => mime.to_string(),
        None => sniff(head),
    }
}

fn looks_like_html(head: &[u8]) -> bool {
    let start = head.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(head.len());
    let head = head[start..].strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&head[start..]);
    const MARKERS: [&[u8]; 5] = [b"<!doctype html", b"<html", b"<head", b"<body", b"<!--"];
    MARKERS.iter().any(|marker| head.len() >= marker.len() && head[..marker.len()].eq_ignore_ascii_case(marker))
}

/// UTF-8 without control characters (other than whitespace). The sniff window
/// may cut a multi-byte sequence in half, which is tolerated.
fn is_text(head: &[u8]) -> bool {
    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(err) if err.error_len().is_none() => match std::str::from_utf8(&head[..err.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
        Err(_) => return false,
    };
    valid.chars().all(|c| !c.is_control() || c.is_whitespace())
}
