//! Output filename resolution for extracted assets.
//!
//! Asset ids are frequently bare content hashes.  The filename is derived in
//! order, first match wins:
//!
//! 1. the id already ends in a known image extension: keep it as is;
//! 2. the declared type is a short (< 5 UTF-16 units) hint: use the part after the
//!    last `/`;
//! 3. sniff the decoded bytes for a PNG, JPEG, GIF or WebP signature.
//!
//! When nothing matches the id is used unchanged.

/// Extensions that mark an id as already complete (compared case-insensitively).
pub const KNOWN_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Anything shorter cannot be sniffed.
pub const MIN_SNIFF_LEN: usize = 12;

const PNG_SIGNATURE:  &[u8] = &[0x89, b'P', b'N', b'G'];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_SIGNATURE:  &[u8] = b"GIF8";

pub fn has_known_extension(id: &str) -> bool {
    match id.rsplit_once('.') {
        Some((_, ext)) => KNOWN_EXTENSIONS.iter().any(|k| ext.eq_ignore_ascii_case(k)),
        None => false,
    }
}

/// Guess an image extension from leading signature bytes.
pub fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    if data.len() < MIN_SNIFF_LEN {
        return None;
    }
    if data.starts_with(PNG_SIGNATURE) {
        Some("png")
    } else if data.starts_with(JPEG_SIGNATURE) {
        Some("jpg")
    } else if data.starts_with(GIF_SIGNATURE) {
        Some("gif")
    } else if &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Extension taken from a declared type hint, if the hint is short enough
/// to be an extension rather than a full MIME string.
fn extension_from_declared_type(declared_type: Option<&str>) -> Option<&str> {
    let t = declared_type.filter(|t| !t.is_empty() && t.encode_utf16().count() < 5)?;
    let ext = t.rsplit('/').next().unwrap_or(t);
    (!ext.is_empty()).then_some(ext)
}

/// Filename for an asset with the given id, declared type and decoded content.
pub fn resolve_filename(id: &str, declared_type: Option<&str>, content: &[u8]) -> String {
    if has_known_extension(id) {
        return id.to_owned();
    }
    match extension_from_declared_type(declared_type).or_else(|| sniff_extension(content)) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H'];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0, 1];
    const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00";
    const WEBP: &[u8] = b"RIFF\x24\x00\x00\x00WEBPVP8 ";

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff_extension(PNG), Some("png"));
        assert_eq!(sniff_extension(JPEG), Some("jpg"));
        assert_eq!(sniff_extension(GIF), Some("gif"));
        assert_eq!(sniff_extension(WEBP), Some("webp"));
        assert_eq!(sniff_extension(b"RIFF\x24\x00\x00\x00WAVEfmt "), None);
        assert_eq!(sniff_extension(b"plain text, not an image"), None);
    }

    #[test]
    fn test_short_buffers_never_sniff() {
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0x00]), None);
        assert_eq!(sniff_extension(&PNG[..11]), None);
        assert_eq!(sniff_extension(&[]), None);
    }

    #[test]
    fn test_known_extension_wins() {
        assert_eq!(resolve_filename("abc123.jpg", Some("png"), PNG), "abc123.jpg");
        assert_eq!(resolve_filename("Cover.JPEG", None, b""), "Cover.JPEG");
        assert_eq!(resolve_filename("anim.WebP", Some("gif"), GIF), "anim.WebP");
    }

    #[test]
    fn test_short_declared_type_is_used() {
        assert_eq!(resolve_filename("abc123", Some("png"), b"not an image"), "abc123.png");
        assert_eq!(resolve_filename("abc123", Some("/gif"), b""), "abc123.gif");
        // Declared hint beats sniffed content.
        assert_eq!(resolve_filename("abc123", Some("jpg"), PNG), "abc123.jpg");
    }

    #[test]
    fn test_declared_type_length_counts_utf16_units() {
        // Three astral characters are six UTF-16 units.
        assert_eq!(resolve_filename("abc", Some("\u{1F600}\u{1F600}\u{1F600}"), b""), "abc");
        assert_eq!(resolve_filename("abc", Some("ab\u{1F600}"), b""), "abc.ab\u{1F600}");
    }

    #[test]
    fn test_long_declared_type_falls_back_to_sniffing() {
        assert_eq!(resolve_filename("abc123", Some("image/png"), PNG), "abc123.png");
        assert_eq!(resolve_filename("abc123", Some("image/png"), b"no signature here"), "abc123");
    }

    #[test]
    fn test_empty_hint_sniffs() {
        assert_eq!(resolve_filename("abc123", Some(""), PNG), "abc123.png");
        assert_eq!(resolve_filename("abc123", Some("img/"), JPEG), "abc123.jpg");
        assert_eq!(resolve_filename("abc123", None, PNG), "abc123.png");
        assert_eq!(resolve_filename("abc123", None, b"abc"), "abc123");
    }

    #[test]
    fn test_unknown_suffix_still_resolves() {
        assert_eq!(resolve_filename("sprite.bin", None, GIF), "sprite.bin.gif");
        assert_eq!(resolve_filename("archive.png.bak", Some("webp"), b""), "archive.png.bak.webp");
    }

    proptest! {
        #[test]
        fn prop_short_input_never_sniffs(data in proptest::collection::vec(any::<u8>(), 0..MIN_SNIFF_LEN)) {
            prop_assert_eq!(sniff_extension(&data), None);
        }

        #[test]
        fn prop_known_ids_are_untouched(stem in "[a-z0-9]{1,12}", ext in "(png|jpg|jpeg|gif|webp|PNG|Jpg)",
                                        content in proptest::collection::vec(any::<u8>(), 0..32)) {
            let id = format!("{stem}.{ext}");
            prop_assert_eq!(resolve_filename(&id, Some("gif"), &content), id);
        }
    }
}
