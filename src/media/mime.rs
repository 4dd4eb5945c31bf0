use image::ImageFormat;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Sniff an image MIME type from the leading magic bytes.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes) {
        Ok(format) => Some(format.to_mime_type()),
        Err(_) => {
            tracing::debug!(
                "Unrecognized media format (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}

/// Pick the MIME type for uploaded bytes.
///
/// A specific declared type wins. Empty or generic declarations are replaced by
/// the sniffed type, and the result is never empty.
pub fn effective_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    let declared = declared.map(essence).filter(|m| !m.is_empty());

    match declared {
        Some(mime) if mime != OCTET_STREAM => mime.to_string(),
        _ => detect_image_mime(bytes).unwrap_or(OCTET_STREAM).to_string(),
    }
}

/// Strip parameters such as `; charset=binary` from a MIME type.
pub fn essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or_default().trim()
}

/// File extension for a generated image, falling back to `png`.
pub fn extension_for_mime(mime: &str) -> String {
    let mime = essence(mime).to_ascii_lowercase();

    if let Some(ext) = ImageFormat::from_mime_type(&mime).and_then(|f| f.extensions_str().first())
    {
        return (*ext).to_string();
    }

    match mime.split_once('/') {
        Some((_, subtype))
            if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            subtype.to_string()
        }
        _ => "png".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(
            detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
    }

    #[test]
    fn test_unknown_is_none() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_effective_mime_prefers_declared() {
        assert_eq!(
            effective_mime(Some("image/heic"), &[0x89, 0x50, 0x4E, 0x47]),
            "image/heic"
        );
    }

    #[test]
    fn test_effective_mime_sniffs_generic_declaration() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(effective_mime(Some(OCTET_STREAM), &png), "image/png");
        assert_eq!(effective_mime(Some(""), &png), "image/png");
        assert_eq!(effective_mime(None, &png), "image/png");
    }

    #[test]
    fn test_effective_mime_never_empty() {
        assert_eq!(effective_mime(None, &[]), OCTET_STREAM);
        assert_eq!(effective_mime(Some("  "), b"plain text"), OCTET_STREAM);
    }

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("IMAGE/JPEG; q=1"), "jpg");
    }

    #[test]
    fn test_extension_uses_plain_subtype() {
        assert_eq!(extension_for_mime("image/heic"), "heic");
    }

    #[test]
    fn test_extension_falls_back_to_png() {
        assert_eq!(extension_for_mime(""), "png");
        assert_eq!(extension_for_mime("image/"), "png");
        assert_eq!(extension_for_mime("image"), "png");
        assert_eq!(extension_for_mime(OCTET_STREAM), "png");
        assert_eq!(extension_for_mime("image/svg+xml"), "png");
    }
}
